use std::path::Path;

use serde::Deserialize;

use crate::error::StudioResult;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `STUDIO_INSIGHTS__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub segments: SegmentConfig,
    #[serde(default)]
    pub benchmarks: BenchmarkConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    /// Days between the start of a campaign window and the start of its
    /// comparison window.
    #[serde(default = "default_comparison_offset_days")]
    pub comparison_offset_days: i64,
    #[serde(default = "default_top_products")]
    pub top_products: usize,
    #[serde(default = "default_monthly_revenue_target")]
    pub monthly_revenue_target: f64,
    /// Floor for the tenure (in months) used as purchase-frequency
    /// denominator, so single-purchase customers stay finite.
    #[serde(default = "default_min_frequency_months")]
    pub min_frequency_months: f64,
}

/// Lifetime-value cut-offs for customer segments. Each bound is inclusive.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentConfig {
    #[serde(default = "default_vip_threshold")]
    pub vip_threshold: f64,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MetricThresholds {
    pub excellent: f64,
    pub good: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default = "default_roi_thresholds")]
    pub roi: MetricThresholds,
    #[serde(default = "default_membership_share_thresholds")]
    pub membership_share: MetricThresholds,
    #[serde(default = "default_revenue_per_customer_thresholds")]
    pub revenue_per_customer: MetricThresholds,
    #[serde(default = "default_ltv_cac_thresholds")]
    pub ltv_cac_ratio: MetricThresholds,
    /// Lower is better.
    #[serde(default = "default_cac_thresholds")]
    pub cac: MetricThresholds,
}

// Default functions
pub const DEFAULT_COMPARISON_OFFSET_DAYS: i64 = 30;
/// Offsets beyond ten years are treated as misconfiguration.
pub const MAX_COMPARISON_OFFSET_DAYS: i64 = 3660;
pub const DEFAULT_VIP_THRESHOLD: f64 = 150.0;
pub const DEFAULT_HIGH_THRESHOLD: f64 = 75.0;
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 25.0;

fn default_comparison_offset_days() -> i64 {
    DEFAULT_COMPARISON_OFFSET_DAYS
}
fn default_top_products() -> usize {
    8
}
fn default_monthly_revenue_target() -> f64 {
    6000.0
}
fn default_min_frequency_months() -> f64 {
    1.0
}
fn default_vip_threshold() -> f64 {
    DEFAULT_VIP_THRESHOLD
}
fn default_high_threshold() -> f64 {
    DEFAULT_HIGH_THRESHOLD
}
fn default_medium_threshold() -> f64 {
    DEFAULT_MEDIUM_THRESHOLD
}
fn default_roi_thresholds() -> MetricThresholds {
    MetricThresholds { excellent: 10.0, good: 5.0 }
}
fn default_membership_share_thresholds() -> MetricThresholds {
    MetricThresholds { excellent: 60.0, good: 40.0 }
}
fn default_revenue_per_customer_thresholds() -> MetricThresholds {
    MetricThresholds { excellent: 100.0, good: 50.0 }
}
fn default_ltv_cac_thresholds() -> MetricThresholds {
    MetricThresholds { excellent: 3.0, good: 1.0 }
}
fn default_cac_thresholds() -> MetricThresholds {
    MetricThresholds { excellent: 25.0, good: 50.0 }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            comparison_offset_days: default_comparison_offset_days(),
            top_products: default_top_products(),
            monthly_revenue_target: default_monthly_revenue_target(),
            min_frequency_months: default_min_frequency_months(),
        }
    }
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            vip_threshold: default_vip_threshold(),
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
        }
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            roi: default_roi_thresholds(),
            membership_share: default_membership_share_thresholds(),
            revenue_per_customer: default_revenue_per_customer_thresholds(),
            ltv_cac_ratio: default_ltv_cac_thresholds(),
            cac: default_cac_thresholds(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    pub fn load(file: Option<&Path>) -> StudioResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        } else {
            builder = builder.add_source(config::File::with_name("studio-insights").required(false));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("STUDIO_INSIGHTS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
