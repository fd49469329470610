//! Studio metrics: business aggregates, marketing ROI, campaign attribution,
//! promo-code performance, customer value and benchmark tiers.

pub mod attribution;
pub mod benchmark;
pub mod business;
pub mod customer;
pub mod marketing;
pub mod promo;
pub mod snapshot;

pub use attribution::{CampaignWindow, ProductFilter, PromotionAnalysis, PromotionOutcome};
pub use benchmark::{classify, BenchmarkThresholds, BenchmarkTier};
pub use business::BusinessMetrics;
pub use customer::{CustomerValueReport, SegmentThresholds};
pub use marketing::MarketingMetrics;
pub use promo::PromoCodeReport;
pub use snapshot::{MetricsSnapshot, PromotionSelection, ReportingEngine, RunOutcome};
