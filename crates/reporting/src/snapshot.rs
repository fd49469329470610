//! One authoritative pipeline from normalized tables to a metrics snapshot.
//!
//! Stages run in order (business, marketing, windows, attribution, promo
//! codes, customers, benchmarks) and every run starts from scratch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use studio_core::config::{
    AppConfig, ReportingConfig, DEFAULT_COMPARISON_OFFSET_DAYS, MAX_COMPARISON_OFFSET_DAYS,
};
use studio_core::types::{ColumnResolution, FileStatus, MarketingTable, TransactionTable};
use tracing::{info, warn};
use uuid::Uuid;

use crate::attribution::{analyze_all, analyze_promotion, campaign_windows, CampaignWindow, ProductFilter, PromotionOutcome};
use crate::benchmark::{benchmark_report, BenchmarkResult, BenchmarkSet, HeadlineMetrics};
use crate::business::{revenue_trend, top_products, BusinessMetrics, ProductRevenue, RevenueTrend};
use crate::customer::{Cac, CustomerSegment, CustomerValueReport, SegmentThresholds};
use crate::marketing::MarketingMetrics;
use crate::promo::{promo_code_report, PromoCodeReport};

/// Which campaign (by window index) and product to analyze in detail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionSelection {
    pub campaign_index: Option<usize>,
    pub product: ProductFilter,
}

/// A narrative takeaway attached to the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub topic: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub run_id: Uuid,
    pub computed_at: DateTime<Utc>,
    pub files: Vec<FileStatus>,
    pub transactions: usize,
    pub marketing_rows: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub business: BusinessMetrics,
    pub trend: RevenueTrend,
    pub top_products: Vec<ProductRevenue>,
    pub marketing: MarketingMetrics,
    pub campaign_windows: Vec<CampaignWindow>,
    pub promotions: Vec<PromotionOutcome>,
    pub selected_promotion: Option<PromotionOutcome>,
    pub promo_codes: PromoCodeReport,
    pub customers: CustomerValueReport,
    pub benchmarks: Vec<BenchmarkResult>,
    pub insights: Vec<Insight>,
    /// Semantic fields no column could be found for.
    pub diagnostics: Vec<ColumnResolution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunOutcome {
    /// No transactions survived loading.
    NoData { files: Vec<FileStatus> },
    Snapshot(Box<MetricsSnapshot>),
}

impl RunOutcome {
    pub fn snapshot(&self) -> Option<&MetricsSnapshot> {
        match self {
            RunOutcome::Snapshot(snapshot) => Some(snapshot),
            RunOutcome::NoData { .. } => None,
        }
    }
}

/// Stateless computation over one set of uploaded tables.
pub struct ReportingEngine {
    reporting: ReportingConfig,
    segments: SegmentThresholds,
    benchmarks: BenchmarkSet,
}

impl ReportingEngine {
    pub fn new(config: &AppConfig) -> Self {
        let mut reporting = config.reporting.clone();
        let offset = reporting.comparison_offset_days;
        if !(1..=MAX_COMPARISON_OFFSET_DAYS).contains(&offset) {
            warn!(
                comparison_offset_days = offset,
                max = MAX_COMPARISON_OFFSET_DAYS,
                "Comparison offset out of range, using default"
            );
            reporting.comparison_offset_days = DEFAULT_COMPARISON_OFFSET_DAYS;
        }

        info!(
            comparison_offset_days = reporting.comparison_offset_days,
            monthly_target = reporting.monthly_revenue_target,
            vip = config.segments.vip_threshold,
            "Reporting engine initialized"
        );
        Self {
            reporting,
            segments: SegmentThresholds::from(&config.segments),
            benchmarks: BenchmarkSet::from(&config.benchmarks),
        }
    }

    pub fn run(
        &self,
        transactions: &TransactionTable,
        marketing: &MarketingTable,
        files: Vec<FileStatus>,
        selection: &PromotionSelection,
    ) -> RunOutcome {
        if transactions.is_empty() {
            warn!(files = files.len(), "No transactions loaded, nothing to report");
            return RunOutcome::NoData { files };
        }

        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            transactions = transactions.len(),
            marketing_rows = marketing.len(),
            "Computing metrics snapshot"
        );

        let business = BusinessMetrics::compute(transactions);
        let trend = revenue_trend(transactions, self.reporting.monthly_revenue_target);
        let top = top_products(transactions, self.reporting.top_products);

        let marketing_metrics = MarketingMetrics::compute(marketing, business.total_revenue);

        let windows = campaign_windows(marketing);
        let offset = self.reporting.comparison_offset_days;
        let promotions = analyze_all(transactions, &windows, offset);
        let selected_promotion = self.analyze_campaign(transactions, &windows, selection);
        info!(%run_id, windows = windows.len(), "Campaign attribution complete");

        let promo_codes = promo_code_report(transactions, marketing, business.total_revenue);

        let customers = CustomerValueReport::compute(
            transactions,
            &windows,
            &self.segments,
            self.reporting.min_frequency_months,
        );

        let headline = headline_metrics(&business, &marketing_metrics, &customers);
        let benchmarks = benchmark_report(&headline, &self.benchmarks);
        let insights = insights(&business, &marketing_metrics, &trend, &customers);

        let diagnostics: Vec<ColumnResolution> = transactions
            .resolutions
            .iter()
            .filter(|r| !r.is_resolved())
            .chain(marketing.unresolved())
            .cloned()
            .collect();

        metrics::counter!("reporting.snapshots").increment(1);
        info!(
            %run_id,
            total_revenue = business.total_revenue,
            roi = marketing_metrics.roi,
            customers = customers.total_customers,
            "Metrics snapshot computed"
        );

        RunOutcome::Snapshot(Box::new(MetricsSnapshot {
            run_id,
            computed_at: Utc::now(),
            files,
            transactions: transactions.len(),
            marketing_rows: marketing.len(),
            date_range: transactions.date_range(),
            business,
            trend,
            top_products: top,
            marketing: marketing_metrics,
            campaign_windows: windows,
            promotions,
            selected_promotion,
            promo_codes,
            customers,
            benchmarks,
            insights,
            diagnostics,
        }))
    }

    /// Detailed analysis of one window for the selected product.
    pub fn analyze_campaign(
        &self,
        transactions: &TransactionTable,
        windows: &[CampaignWindow],
        selection: &PromotionSelection,
    ) -> Option<PromotionOutcome> {
        let index = selection.campaign_index?;
        let Some(window) = windows.get(index) else {
            warn!(index, windows = windows.len(), "Selected campaign index out of range");
            return None;
        };
        Some(analyze_promotion(
            transactions,
            window,
            &selection.product,
            self.reporting.comparison_offset_days,
        ))
    }
}

/// Blended CAC over every window that acquired customers, and the matching
/// LTV:CAC ratio.
fn blended_acquisition(customers: &CustomerValueReport) -> Option<(f64, f64)> {
    let (spend, acquired, ltv_total) = customers
        .acquisitions
        .iter()
        .filter(|a| matches!(a.cac, Cac::Defined(_)))
        .fold((0.0, 0u64, 0.0), |(s, n, l), a| {
            (s + a.spend, n + a.acquired_customers, l + a.cohort_ltv_mean * a.acquired_customers as f64)
        });
    if acquired == 0 {
        return None;
    }
    let cac = spend / acquired as f64;
    let mean_ltv = ltv_total / acquired as f64;
    let ratio = if cac > 0.0 { mean_ltv / cac } else { 0.0 };
    Some((cac, ratio))
}

fn headline_metrics(
    business: &BusinessMetrics,
    marketing: &MarketingMetrics,
    customers: &CustomerValueReport,
) -> HeadlineMetrics {
    let blended = blended_acquisition(customers);
    HeadlineMetrics {
        roi: marketing.has_spend().then_some(marketing.roi),
        membership_share: (business.total_revenue > 0.0).then_some(business.membership_pct),
        revenue_per_customer: (business.unique_customers > 0).then_some(business.revenue_per_customer),
        ltv_cac_ratio: blended.map(|(_, ratio)| ratio),
        cac: blended.map(|(cac, _)| cac),
    }
}

fn insights(
    business: &BusinessMetrics,
    marketing: &MarketingMetrics,
    trend: &RevenueTrend,
    customers: &CustomerValueReport,
) -> Vec<Insight> {
    let mut out = Vec::new();
    let mut push = |topic: &str, message: String| {
        out.push(Insight {
            topic: topic.to_string(),
            message,
        })
    };

    if marketing.has_spend() {
        let message = if marketing.roi > 8.0 {
            format!("Marketing ROI of {:.1}x is excellent; consider scaling spend.", marketing.roi)
        } else if marketing.roi > 5.0 {
            format!("Marketing ROI of {:.1}x is profitable; current strategy is working.", marketing.roi)
        } else if marketing.roi > 3.0 {
            format!("Marketing ROI of {:.1}x could be improved; review underperforming platforms.", marketing.roi)
        } else {
            format!("Marketing ROI of {:.1}x is low; spend needs review.", marketing.roi)
        };
        push("roi", message);
    }

    if business.total_revenue > 0.0 {
        let message = if business.membership_pct > 60.0 {
            format!("Memberships drive {:.0}% of revenue, a strong recurring base.", business.membership_pct)
        } else if business.membership_pct > 40.0 {
            format!("Memberships drive {:.0}% of revenue, a balanced revenue model.", business.membership_pct)
        } else {
            format!("Memberships drive only {:.0}% of revenue; prioritise membership conversion.", business.membership_pct)
        };
        push("membership_share", message);
    }

    // A single month says nothing about a monthly run rate.
    if trend.unique_months > 1 {
        let message = if trend.target_met {
            format!(
                "Monthly average of £{:.0} meets the £{:.0} target.",
                trend.monthly_avg_revenue, trend.monthly_target
            )
        } else {
            format!(
                "Monthly average of £{:.0} is £{:.0} short of the £{:.0} target.",
                trend.monthly_avg_revenue, trend.target_gap, trend.monthly_target
            )
        };
        push("monthly_target", message);
    }

    if business.unique_customers > 0 {
        let message = if business.revenue_per_customer > 50.0 {
            format!("Revenue per customer of £{:.2} shows high customer value.", business.revenue_per_customer)
        } else {
            format!(
                "Revenue per customer of £{:.2} leaves room to upsell.",
                business.revenue_per_customer
            )
        };
        push("revenue_per_customer", message);
    }

    if customers.available {
        if let Some(vip) = customers.segments.iter().find(|s| s.segment == CustomerSegment::Vip) {
            if vip.customers > 0 {
                push(
                    "vip_customers",
                    format!("{} VIP customers average £{:.2} lifetime value.", vip.customers, vip.avg_ltv),
                );
            }
        }
    }

    out
}
