//! Threshold tiers for headline metrics.

use serde::{Deserialize, Serialize};
use studio_core::config::{BenchmarkConfig, MetricThresholds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkTier {
    Excellent,
    Good,
    NeedsAttention,
}

impl BenchmarkTier {
    pub fn label(&self) -> &'static str {
        match self {
            BenchmarkTier::Excellent => "Excellent",
            BenchmarkTier::Good => "Good",
            BenchmarkTier::NeedsAttention => "Needs Attention",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkThresholds {
    pub excellent: f64,
    pub good: f64,
    pub polarity: Polarity,
}

impl BenchmarkThresholds {
    pub fn higher_is_better(excellent: f64, good: f64) -> Self {
        Self {
            excellent,
            good,
            polarity: Polarity::HigherIsBetter,
        }
    }

    pub fn lower_is_better(excellent: f64, good: f64) -> Self {
        Self {
            excellent,
            good,
            polarity: Polarity::LowerIsBetter,
        }
    }
}

/// Classify `value` against inclusive thresholds. NaN never reaches a tier
/// above `NeedsAttention`.
pub fn classify(value: f64, thresholds: &BenchmarkThresholds) -> BenchmarkTier {
    let (excellent, good) = match thresholds.polarity {
        Polarity::HigherIsBetter => (value >= thresholds.excellent, value >= thresholds.good),
        Polarity::LowerIsBetter => (value <= thresholds.excellent, value <= thresholds.good),
    };
    if excellent {
        BenchmarkTier::Excellent
    } else if good {
        BenchmarkTier::Good
    } else {
        BenchmarkTier::NeedsAttention
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub metric: String,
    pub value: f64,
    pub tier: BenchmarkTier,
    pub label: String,
}

/// Named thresholds for every benchmarked metric.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSet {
    pub roi: BenchmarkThresholds,
    pub membership_share: BenchmarkThresholds,
    pub revenue_per_customer: BenchmarkThresholds,
    pub ltv_cac_ratio: BenchmarkThresholds,
    pub cac: BenchmarkThresholds,
}

impl Default for BenchmarkSet {
    fn default() -> Self {
        Self::from(&BenchmarkConfig::default())
    }
}

impl From<&BenchmarkConfig> for BenchmarkSet {
    fn from(config: &BenchmarkConfig) -> Self {
        let higher = |t: MetricThresholds| BenchmarkThresholds::higher_is_better(t.excellent, t.good);
        Self {
            roi: higher(config.roi),
            membership_share: higher(config.membership_share),
            revenue_per_customer: higher(config.revenue_per_customer),
            ltv_cac_ratio: higher(config.ltv_cac_ratio),
            cac: BenchmarkThresholds::lower_is_better(config.cac.excellent, config.cac.good),
        }
    }
}

/// Inputs to the benchmark report; `None` skips the metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeadlineMetrics {
    pub roi: Option<f64>,
    pub membership_share: Option<f64>,
    pub revenue_per_customer: Option<f64>,
    pub ltv_cac_ratio: Option<f64>,
    pub cac: Option<f64>,
}

pub fn benchmark_report(metrics: &HeadlineMetrics, set: &BenchmarkSet) -> Vec<BenchmarkResult> {
    [
        ("roi", metrics.roi, &set.roi),
        ("membership_share", metrics.membership_share, &set.membership_share),
        ("revenue_per_customer", metrics.revenue_per_customer, &set.revenue_per_customer),
        ("ltv_cac_ratio", metrics.ltv_cac_ratio, &set.ltv_cac_ratio),
        ("cac", metrics.cac, &set.cac),
    ]
    .into_iter()
    .filter_map(|(metric, value, thresholds)| {
        let value = value?;
        let tier = classify(value, thresholds);
        Some(BenchmarkResult {
            metric: metric.to_string(),
            value,
            tier,
            label: tier.label().to_string(),
        })
    })
    .collect()
}
