//! End-to-end flow: CSV uploads through ingest into a metrics snapshot.

#[cfg(test)]
mod tests {
    use studio_core::config::AppConfig;
    use studio_ingest::{load_marketing, load_transactions, InputFile};
    use studio_reporting::customer::Cac;
    use studio_reporting::{PromotionSelection, ReportingEngine, RunOutcome};

    const POS_EXPORT: &str = "\
Date,Item,Category,Amount Inc Tax,Sold To,Promo Code
05/07/2025,Unlimited,MEMBERSHIP,£100.00,alice,SUMMER
05/06/2025,10 Pack,CREDIT_PACK,50.00,bob,
not-a-date,Towel,RETAIL,5.00,carol,
";

    const AD_EXPORT: &str = "\
Campaign name,Platform,Reporting starts,Reporting ends,Amount spent (GBP)
Summer Launch,Facebook,01/07/2025,10/07/2025,50.00
";

    fn uploads() -> (Vec<InputFile>, Vec<InputFile>) {
        (
            vec![
                InputFile::from_bytes("pos.csv", POS_EXPORT),
                InputFile::from_bytes("broken.csv", "a,b\n1,2,3\n"),
            ],
            vec![InputFile::from_bytes("ads.csv", AD_EXPORT)],
        )
    }

    fn run(tx_files: &[InputFile], mkt_files: &[InputFile]) -> RunOutcome {
        let (transactions, mut files) = load_transactions(tx_files);
        let (marketing, mkt_status) = load_marketing(mkt_files);
        files.extend(mkt_status);
        ReportingEngine::new(&AppConfig::default()).run(&transactions, &marketing, files, &PromotionSelection::default())
    }

    #[test]
    fn test_uploads_to_snapshot() {
        let (tx, mkt) = uploads();
        let outcome = run(&tx, &mkt);
        let snapshot = outcome.snapshot().expect("snapshot");

        assert_eq!(snapshot.files.len(), 3);
        assert_eq!(snapshot.files.iter().filter(|f| f.is_loaded()).count(), 2);
        assert_eq!(snapshot.transactions, 2);

        let business = &snapshot.business;
        assert!((business.total_revenue - 150.0).abs() < 1e-9);
        assert_eq!(business.unique_customers, 2);
        assert!((business.membership_pct - 100.0 / 150.0 * 100.0).abs() < 1e-9);

        assert!((snapshot.marketing.roi - 3.0).abs() < 1e-9);

        let promo = snapshot.promotions[0].analysis().expect("measured");
        assert!((promo.treatment.revenue - 100.0).abs() < 1e-9);
        assert!((promo.comparison.as_ref().unwrap().revenue - 50.0).abs() < 1e-9);
        assert!((promo.revenue_lift_pct - 100.0).abs() < 1e-9);
        assert!((promo.roi - 2.0).abs() < 1e-9);
        assert!((promo.incremental_revenue - 50.0).abs() < 1e-9);
        assert!((promo.incremental_roi - 1.0).abs() < 1e-9);

        let code = &snapshot.promo_codes.codes[0];
        assert_eq!(code.code, "SUMMER");
        assert_eq!(code.matched_campaign.as_deref(), Some("Summer Launch"));
        assert!((code.roi - 2.0).abs() < 1e-9);

        let acquisition = &snapshot.customers.acquisitions[0];
        assert_eq!(acquisition.acquired_customers, 1);
        assert_eq!(acquisition.cac, Cac::Defined(50.0));
    }

    #[test]
    fn test_duplicate_upload_doubles_counts() {
        let (tx, mkt) = uploads();
        let once = run(&tx, &mkt);
        let twice = run(&[tx[0].clone(), tx[0].clone()], &mkt);

        let once = &once.snapshot().unwrap().business;
        let twice = &twice.snapshot().unwrap().business;
        assert_eq!(twice.total_transactions, once.total_transactions * 2);
        assert!((twice.total_revenue - once.total_revenue * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_broken_files_yield_no_data() {
        let files = vec![InputFile::from_bytes("broken.csv", "a,b\n1,2,3\n")];
        let outcome = run(&files, &[]);
        match outcome {
            RunOutcome::NoData { files } => {
                assert_eq!(files.len(), 1);
                assert!(!files[0].is_loaded());
            }
            RunOutcome::Snapshot(_) => panic!("expected no data"),
        }
    }
}
