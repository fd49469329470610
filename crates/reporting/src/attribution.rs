//! Campaign attribution: campaign windows, treatment vs. comparison period
//! performance, lift and incremental ROI.
//!
//! The comparison period is a fixed heuristic: a window of the same length
//! starting `offset_days` before the campaign starts. It is not calendar
//! aligned and does not control for seasonality.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use studio_core::types::{MarketingTable, MonthKey, TransactionRecord, TransactionTable};
use tracing::{debug, warn};

// ─── Campaign windows ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSource {
    /// Taken from reporting start/end columns.
    Explicit,
    /// One window per calendar month with spend.
    MonthlyFallback,
}

/// A date range bound to a marketing spend amount. Both ends inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignWindow {
    pub campaign_name: String,
    pub platform: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub spend: f64,
    pub source: WindowSource,
}

impl CampaignWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Window of the same length starting `offset_days` before this one.
    /// `None` when the shifted range falls outside the supported calendar.
    pub fn comparison_range(&self, offset_days: i64) -> Option<(NaiveDate, NaiveDate)> {
        let start = self
            .start_date
            .checked_sub_signed(Duration::try_days(offset_days)?)?;
        let end = start.checked_add_signed(self.end_date - self.start_date)?;
        Some((start, end))
    }
}

/// Derive campaign windows from the marketing table.
///
/// Rows carrying a reporting period become explicit windows; rows sharing
/// campaign name and period are merged and their spend summed. When no row
/// has a period, one window per calendar month with positive spend is
/// synthesized.
pub fn campaign_windows(table: &MarketingTable) -> Vec<CampaignWindow> {
    if table.has_reporting_periods() {
        let mut windows: Vec<CampaignWindow> = Vec::new();
        let mut index: HashMap<(String, NaiveDate, NaiveDate), usize> = HashMap::new();

        for record in table.iter() {
            let Some((start, end)) = record.period else {
                continue;
            };
            let key = (record.campaign_name.clone(), start, end);
            match index.get(&key) {
                Some(&i) => {
                    let window = &mut windows[i];
                    window.spend += record.spend_amount;
                    if window.platform.as_deref() != Some(record.platform.as_str()) {
                        window.platform = None;
                    }
                }
                None => {
                    index.insert(key, windows.len());
                    windows.push(CampaignWindow {
                        campaign_name: record.campaign_name.clone(),
                        platform: Some(record.platform.clone()),
                        start_date: start,
                        end_date: end,
                        spend: record.spend_amount,
                        source: WindowSource::Explicit,
                    });
                }
            }
        }
        return windows;
    }

    let mut monthly: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for record in table.iter() {
        if let Some(month) = record.month() {
            *monthly.entry(month).or_insert(0.0) += record.spend_amount;
        }
    }

    monthly
        .into_iter()
        .filter(|(_, spend)| *spend > 0.0)
        .filter_map(|(month, spend)| {
            Some(CampaignWindow {
                campaign_name: format!("{} Marketing", month.label()),
                platform: None,
                start_date: month.first_day()?,
                end_date: month.last_day()?,
                spend,
                source: WindowSource::MonthlyFallback,
            })
        })
        .collect()
}

// ─── Period statistics ──────────────────────────────────────────────────────

/// Restricts attribution to one item or to every product.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "item")]
pub enum ProductFilter {
    #[default]
    All,
    Item(String),
}

impl ProductFilter {
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        match self {
            ProductFilter::All => true,
            ProductFilter::Item(item) => record.item == *item,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub revenue: f64,
    pub transactions: u64,
    pub customers: u64,
}

fn select<'t>(
    table: &'t TransactionTable,
    start: NaiveDate,
    end: NaiveDate,
    filter: &'t ProductFilter,
) -> impl Iterator<Item = &'t TransactionRecord> + 't {
    table
        .iter()
        .filter(move |r| r.date >= start && r.date <= end && filter.matches(r))
}

pub fn period_stats(
    table: &TransactionTable,
    start: NaiveDate,
    end: NaiveDate,
    filter: &ProductFilter,
) -> PeriodStats {
    let mut revenue = 0.0;
    let mut transactions = 0u64;
    let mut customers: HashSet<&str> = HashSet::new();
    for record in select(table, start, end, filter) {
        revenue += record.amount_inc_tax;
        transactions += 1;
        if let Some(id) = record.customer_id.as_deref() {
            customers.insert(id);
        }
    }
    PeriodStats {
        start_date: start,
        end_date: end,
        revenue,
        transactions,
        customers: customers.len() as u64,
    }
}

/// `(current - baseline) / baseline * 100`, or 0 without a baseline.
pub fn lift_pct(current: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        (current - baseline) / baseline * 100.0
    } else {
        0.0
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

// ─── Product breakdown ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub item: String,
    pub revenue: f64,
    /// Quantity sold, or one per transaction when no quantity was recorded.
    pub units: u64,
    pub transactions: u64,
    pub customers: u64,
    /// `revenue / units`, with zero units counted as one.
    pub avg_price: f64,
    pub first_sale: NaiveDate,
    pub last_sale: NaiveDate,
}

/// Per-item performance over the given records, highest revenue first.
pub fn product_breakdown<'t>(records: impl Iterator<Item = &'t TransactionRecord>) -> Vec<ProductPerformance> {
    struct Acc<'r> {
        revenue: f64,
        units: u64,
        transactions: u64,
        customers: HashSet<&'r str>,
        first: NaiveDate,
        last: NaiveDate,
    }

    let mut by_item: HashMap<&'t str, Acc<'t>> = HashMap::new();
    for record in records {
        let acc = by_item.entry(record.item.as_str()).or_insert_with(|| Acc {
            revenue: 0.0,
            units: 0,
            transactions: 0,
            customers: HashSet::new(),
            first: record.date,
            last: record.date,
        });
        acc.revenue += record.amount_inc_tax;
        acc.units += record.units();
        acc.transactions += 1;
        if let Some(id) = record.customer_id.as_deref() {
            acc.customers.insert(id);
        }
        acc.first = acc.first.min(record.date);
        acc.last = acc.last.max(record.date);
    }

    let mut products: Vec<ProductPerformance> = by_item
        .into_iter()
        .map(|(item, acc)| ProductPerformance {
            item: item.to_string(),
            revenue: acc.revenue,
            units: acc.units,
            transactions: acc.transactions,
            customers: acc.customers.len() as u64,
            avg_price: acc.revenue / acc.units.max(1) as f64,
            first_sale: acc.first,
            last_sale: acc.last,
        })
        .collect();
    products.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.item.cmp(&b.item)));
    products
}

// ─── Promotion analysis ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionAnalysis {
    pub window: CampaignWindow,
    pub product_filter: ProductFilter,
    pub treatment: PeriodStats,
    /// `None` when no comparison range could be formed for the offset.
    pub comparison: Option<PeriodStats>,
    /// False when the comparison period is missing or had no transactions;
    /// lift figures are then reported as 0 rather than measured.
    pub baseline_available: bool,
    pub revenue_lift_pct: f64,
    pub transaction_lift_pct: f64,
    pub customer_lift_pct: f64,
    pub roi: f64,
    pub incremental_revenue: f64,
    pub incremental_roi: f64,
    pub product_breakdown: Vec<ProductPerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum PromotionOutcome {
    /// No transactions fell inside the campaign window.
    NoData {
        window: CampaignWindow,
        product_filter: ProductFilter,
    },
    Measured(Box<PromotionAnalysis>),
}

impl PromotionOutcome {
    pub fn analysis(&self) -> Option<&PromotionAnalysis> {
        match self {
            PromotionOutcome::Measured(analysis) => Some(analysis),
            PromotionOutcome::NoData { .. } => None,
        }
    }
}

/// Compare a campaign window against the same-length window `offset_days`
/// earlier, for one product or all products.
pub fn analyze_promotion(
    table: &TransactionTable,
    window: &CampaignWindow,
    filter: &ProductFilter,
    offset_days: i64,
) -> PromotionOutcome {
    let treatment = period_stats(table, window.start_date, window.end_date, filter);
    if treatment.transactions == 0 {
        debug!(campaign = %window.campaign_name, "No transactions inside campaign window");
        return PromotionOutcome::NoData {
            window: window.clone(),
            product_filter: filter.clone(),
        };
    }

    let comparison = match window.comparison_range(offset_days) {
        Some((start, end)) => Some(period_stats(table, start, end, filter)),
        None => {
            warn!(
                campaign = %window.campaign_name,
                offset_days,
                "Comparison window out of calendar range, no baseline"
            );
            None
        }
    };
    let (base_revenue, base_transactions, base_customers) = comparison
        .as_ref()
        .map(|c| (c.revenue, c.transactions, c.customers))
        .unwrap_or((0.0, 0, 0));
    let incremental_revenue = treatment.revenue - base_revenue;
    let breakdown = product_breakdown(select(table, window.start_date, window.end_date, filter));

    debug!(
        campaign = %window.campaign_name,
        treatment_revenue = treatment.revenue,
        comparison_revenue = base_revenue,
        "Promotion analyzed"
    );

    PromotionOutcome::Measured(Box::new(PromotionAnalysis {
        window: window.clone(),
        product_filter: filter.clone(),
        baseline_available: base_transactions > 0,
        revenue_lift_pct: lift_pct(treatment.revenue, base_revenue),
        transaction_lift_pct: lift_pct(treatment.transactions as f64, base_transactions as f64),
        customer_lift_pct: lift_pct(treatment.customers as f64, base_customers as f64),
        roi: ratio(treatment.revenue, window.spend),
        incremental_revenue,
        incremental_roi: ratio(incremental_revenue, window.spend),
        product_breakdown: breakdown,
        treatment,
        comparison,
    }))
}

/// Analyze every window across all products.
pub fn analyze_all(
    table: &TransactionTable,
    windows: &[CampaignWindow],
    offset_days: i64,
) -> Vec<PromotionOutcome> {
    windows
        .iter()
        .map(|w| analyze_promotion(table, w, &ProductFilter::All, offset_days))
        .collect()
}

/// Distinct item names, sorted, for product selection.
pub fn available_products(table: &TransactionTable) -> Vec<String> {
    let mut items: Vec<String> = table
        .iter()
        .map(|r| r.item.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    items.sort();
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_core::types::{Category, MarketingRecord};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sale(date: &str, item: &str, amount: f64, customer: &str, qty: Option<u32>) -> TransactionRecord {
        TransactionRecord {
            date: d(date),
            item: item.to_string(),
            category: Category::CreditPack,
            amount_inc_tax: amount,
            quantity_sold: qty,
            customer_id: Some(customer.to_string()),
            promo_code: None,
            source_file: "pos.csv".to_string(),
        }
    }

    fn table(records: Vec<TransactionRecord>) -> TransactionTable {
        TransactionTable {
            records,
            has_customer_column: true,
            ..Default::default()
        }
    }

    fn window(start: &str, end: &str, spend: f64) -> CampaignWindow {
        CampaignWindow {
            campaign_name: "July Promo".to_string(),
            platform: Some("Facebook".to_string()),
            start_date: d(start),
            end_date: d(end),
            spend,
            source: WindowSource::Explicit,
        }
    }

    fn marketing(date: Option<&str>, period: Option<(&str, &str)>, campaign: &str, spend: f64) -> MarketingRecord {
        MarketingRecord {
            date: date.map(d),
            period: period.map(|(s, e)| (d(s), d(e))),
            campaign_name: campaign.to_string(),
            platform: "Facebook".to_string(),
            spend_amount: spend,
            source_file: "ads.csv".to_string(),
        }
    }

    #[test]
    fn test_lift_scenario() {
        let t = table(vec![
            sale("2025-07-05", "10 Pack", 100.0, "alice", None),
            sale("2025-06-05", "10 Pack", 50.0, "bob", None),
        ]);
        let w = window("2025-07-01", "2025-07-10", 50.0);

        let outcome = analyze_promotion(&t, &w, &ProductFilter::All, 30);
        let a = outcome.analysis().unwrap();

        let comparison = a.comparison.as_ref().unwrap();
        assert_eq!(comparison.start_date, d("2025-06-01"));
        assert_eq!(comparison.end_date, d("2025-06-10"));
        assert!((a.treatment.revenue - 100.0).abs() < 1e-9);
        assert!((comparison.revenue - 50.0).abs() < 1e-9);
        assert!((a.revenue_lift_pct - 100.0).abs() < 1e-9);
        assert!((a.roi - 2.0).abs() < 1e-9);
        assert!((a.incremental_revenue - 50.0).abs() < 1e-9);
        assert!((a.incremental_roi - 1.0).abs() < 1e-9);
        assert!(a.baseline_available);
    }

    #[test]
    fn test_comparison_offset_is_days_not_calendar_months() {
        let t = table(vec![
            sale("2025-08-05", "10 Pack", 100.0, "alice", None),
            sale("2025-07-01", "10 Pack", 70.0, "bob", None),
            sale("2025-07-05", "10 Pack", 40.0, "carol", None),
        ]);
        let w = window("2025-08-01", "2025-08-10", 50.0);
        assert_eq!(w.comparison_range(30), Some((d("2025-07-02"), d("2025-07-11"))));

        let outcome = analyze_promotion(&t, &w, &ProductFilter::All, 30);
        let comparison = outcome.analysis().unwrap().comparison.clone().unwrap();
        assert_eq!(comparison.start_date, d("2025-07-02"));
        assert_eq!(comparison.end_date, d("2025-07-11"));
        assert_eq!(comparison.transactions, 1);
        assert!((comparison.revenue - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_offset_has_no_baseline() {
        let t = table(vec![sale("2025-07-05", "A", 100.0, "alice", None)]);
        let w = window("2025-07-01", "2025-07-10", 50.0);
        assert_eq!(w.comparison_range(1_000_000_000), None);
        assert_eq!(w.comparison_range(i64::MAX), None);

        let outcome = analyze_promotion(&t, &w, &ProductFilter::All, 1_000_000_000);
        let a = outcome.analysis().unwrap();
        assert!(a.comparison.is_none());
        assert!(!a.baseline_available);
        assert_eq!(a.revenue_lift_pct, 0.0);
        assert!((a.incremental_revenue - 100.0).abs() < 1e-9);
        assert!((a.roi - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let t = table(vec![
            sale("2025-07-01", "A", 10.0, "a", None),
            sale("2025-07-10", "A", 10.0, "b", None),
            sale("2025-07-11", "A", 10.0, "c", None),
        ]);
        let a = analyze_promotion(&t, &window("2025-07-01", "2025-07-10", 0.0), &ProductFilter::All, 30);
        let a = a.analysis().unwrap();
        assert_eq!(a.treatment.transactions, 2);
        assert_eq!(a.treatment.customers, 2);
        assert_eq!(a.roi, 0.0);
        assert_eq!(a.incremental_roi, 0.0);
    }

    #[test]
    fn test_empty_treatment_is_no_data() {
        let t = table(vec![sale("2025-06-05", "A", 50.0, "bob", None)]);
        let outcome = analyze_promotion(&t, &window("2025-07-01", "2025-07-10", 50.0), &ProductFilter::All, 30);
        assert!(matches!(outcome, PromotionOutcome::NoData { .. }));
        assert!(outcome.analysis().is_none());
    }

    #[test]
    fn test_missing_baseline_reports_zero_lift() {
        let t = table(vec![sale("2025-07-05", "A", 80.0, "alice", None)]);
        let outcome = analyze_promotion(&t, &window("2025-07-01", "2025-07-10", 40.0), &ProductFilter::All, 30);
        let a = outcome.analysis().unwrap();
        assert!(!a.baseline_available);
        assert_eq!(a.revenue_lift_pct, 0.0);
        assert_eq!(a.transaction_lift_pct, 0.0);
        assert_eq!(a.customer_lift_pct, 0.0);
        assert!((a.incremental_revenue - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_product_filter_applies_to_both_periods() {
        let t = table(vec![
            sale("2025-07-05", "Unlimited", 60.0, "alice", None),
            sale("2025-07-06", "10 Pack", 30.0, "bob", None),
            sale("2025-06-06", "10 Pack", 15.0, "bob", None),
            sale("2025-06-07", "Unlimited", 60.0, "carol", None),
        ]);
        let filter = ProductFilter::Item("10 Pack".to_string());
        let outcome = analyze_promotion(&t, &window("2025-07-01", "2025-07-10", 10.0), &filter, 30);
        let a = outcome.analysis().unwrap();

        assert!((a.treatment.revenue - 30.0).abs() < 1e-9);
        assert!((a.comparison.as_ref().unwrap().revenue - 15.0).abs() < 1e-9);
        assert!((a.revenue_lift_pct - 100.0).abs() < 1e-9);
        assert_eq!(a.product_breakdown.len(), 1);
        assert_eq!(a.product_breakdown[0].item, "10 Pack");
    }

    #[test]
    fn test_product_breakdown_units_and_avg_price() {
        let t = table(vec![
            sale("2025-07-02", "Drop-in", 16.0, "alice", Some(2)),
            sale("2025-07-03", "Drop-in", 8.0, "bob", Some(1)),
            sale("2025-07-04", "Towel", 5.0, "bob", None),
            sale("2025-07-05", "Guest Pass", 0.0, "carol", Some(0)),
        ]);
        let outcome = analyze_promotion(&t, &window("2025-07-01", "2025-07-10", 10.0), &ProductFilter::All, 30);
        let breakdown = &outcome.analysis().unwrap().product_breakdown;

        assert_eq!(breakdown[0].item, "Drop-in");
        assert_eq!(breakdown[0].units, 3);
        assert_eq!(breakdown[0].customers, 2);
        assert!((breakdown[0].avg_price - 8.0).abs() < 1e-9);
        assert_eq!(breakdown[0].first_sale, d("2025-07-02"));
        assert_eq!(breakdown[0].last_sale, d("2025-07-03"));

        assert_eq!(breakdown[1].item, "Towel");
        assert_eq!(breakdown[1].units, 1);

        let guest = breakdown.iter().find(|p| p.item == "Guest Pass").unwrap();
        assert_eq!(guest.units, 0);
        assert_eq!(guest.avg_price, 0.0);
    }

    #[test]
    fn test_explicit_windows_merge_duplicate_rows() {
        let t = MarketingTable {
            records: vec![
                marketing(None, Some(("2025-07-01", "2025-07-10")), "July Promo", 30.0),
                marketing(None, Some(("2025-07-01", "2025-07-10")), "July Promo", 20.0),
                marketing(None, Some(("2025-08-01", "2025-08-07")), "August Push", 70.0),
            ],
            spend_resolved: true,
            resolutions: Vec::new(),
        };
        let windows = campaign_windows(&t);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].campaign_name, "July Promo");
        assert!((windows[0].spend - 50.0).abs() < 1e-9);
        assert_eq!(windows[0].source, WindowSource::Explicit);
        assert_eq!(windows[1].end_date, d("2025-08-07"));
    }

    #[test]
    fn test_monthly_fallback_windows() {
        let t = MarketingTable {
            records: vec![
                marketing(Some("2025-08-03"), None, "General", 100.0),
                marketing(Some("2025-07-01"), None, "General", 150.0),
                marketing(Some("2025-07-15"), None, "General", 50.0),
                marketing(Some("2025-09-01"), None, "General", 0.0),
                marketing(None, None, "General", 999.0),
            ],
            spend_resolved: true,
            resolutions: Vec::new(),
        };
        let windows = campaign_windows(&t);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].campaign_name, "July 2025 Marketing");
        assert_eq!(windows[0].start_date, d("2025-07-01"));
        assert_eq!(windows[0].end_date, d("2025-07-31"));
        assert!((windows[0].spend - 200.0).abs() < 1e-9);
        assert_eq!(windows[0].source, WindowSource::MonthlyFallback);
        assert_eq!(windows[1].campaign_name, "August 2025 Marketing");
    }

    #[test]
    fn test_analyze_all_and_available_products() {
        let t = table(vec![
            sale("2025-07-05", "B", 10.0, "a", None),
            sale("2025-07-06", "A", 10.0, "b", None),
        ]);
        let windows = vec![window("2025-07-01", "2025-07-10", 5.0), window("2025-08-01", "2025-08-10", 5.0)];
        let outcomes = analyze_all(&t, &windows, 30);
        assert!(outcomes[0].analysis().is_some());
        assert!(outcomes[1].analysis().is_none());
        assert_eq!(available_products(&t), vec!["A".to_string(), "B".to_string()]);
    }
}
