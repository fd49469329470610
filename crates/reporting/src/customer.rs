//! Customer lifetime value, segmentation and campaign acquisition cost.
//!
//! Acquisition attribution is single-touch: a customer is credited to the
//! first campaign window (in window order) that contains their first
//! purchase, and to no other.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use studio_core::config::SegmentConfig;
use studio_core::types::TransactionTable;
use tracing::{debug, warn};

use crate::attribution::CampaignWindow;

/// Average month length used to turn tenure days into months.
pub const DAYS_PER_MONTH: f64 = 30.44;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSegment {
    Low,
    Medium,
    High,
    Vip,
}

impl CustomerSegment {
    pub const ALL: [CustomerSegment; 4] = [Self::Vip, Self::High, Self::Medium, Self::Low];

    pub fn label(&self) -> &'static str {
        match self {
            CustomerSegment::Vip => "VIP",
            CustomerSegment::High => "High",
            CustomerSegment::Medium => "Medium",
            CustomerSegment::Low => "Low",
        }
    }
}

/// Inclusive lower LTV bounds for each segment above `Low`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentThresholds {
    pub vip: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        Self::from(&SegmentConfig::default())
    }
}

impl From<&SegmentConfig> for SegmentThresholds {
    fn from(config: &SegmentConfig) -> Self {
        Self {
            vip: config.vip_threshold,
            high: config.high_threshold,
            medium: config.medium_threshold,
        }
    }
}

impl SegmentThresholds {
    pub fn segment_for(&self, lifetime_value: f64) -> CustomerSegment {
        if lifetime_value >= self.vip {
            CustomerSegment::Vip
        } else if lifetime_value >= self.high {
            CustomerSegment::High
        } else if lifetime_value >= self.medium {
            CustomerSegment::Medium
        } else {
            CustomerSegment::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub lifetime_value: f64,
    pub transaction_count: u64,
    pub avg_spend: f64,
    pub first_purchase: NaiveDate,
    pub last_purchase: NaiveDate,
    /// Zero for single-purchase customers.
    pub tenure_days: i64,
    /// Purchases per month over the customer's tenure.
    pub purchase_frequency: f64,
    pub segment: CustomerSegment,
}

impl CustomerProfile {
    /// Expected spend per month at the customer's observed rate.
    pub fn monthly_spend(&self) -> f64 {
        self.avg_spend * self.purchase_frequency
    }
}

/// Build one profile per customer id, ordered by descending lifetime value.
///
/// The tenure used as the frequency denominator is floored at
/// `min_frequency_months` so single-purchase customers get a finite rate.
pub fn customer_profiles(
    table: &TransactionTable,
    thresholds: &SegmentThresholds,
    min_frequency_months: f64,
) -> Vec<CustomerProfile> {
    struct Acc {
        total: f64,
        count: u64,
        first: NaiveDate,
        last: NaiveDate,
    }

    let mut by_customer: HashMap<&str, Acc> = HashMap::new();
    for record in table.iter() {
        let Some(id) = record.customer_id.as_deref() else {
            continue;
        };
        let acc = by_customer.entry(id).or_insert(Acc {
            total: 0.0,
            count: 0,
            first: record.date,
            last: record.date,
        });
        acc.total += record.amount_inc_tax;
        acc.count += 1;
        acc.first = acc.first.min(record.date);
        acc.last = acc.last.max(record.date);
    }

    // A non-positive floor would reintroduce the division by zero.
    let floor = if min_frequency_months > 0.0 {
        min_frequency_months
    } else {
        1.0
    };

    let mut profiles: Vec<CustomerProfile> = by_customer
        .into_iter()
        .map(|(id, acc)| {
            let tenure_days = (acc.last - acc.first).num_days();
            let tenure_months = (tenure_days as f64 / DAYS_PER_MONTH).max(floor);
            CustomerProfile {
                customer_id: id.to_string(),
                lifetime_value: acc.total,
                transaction_count: acc.count,
                avg_spend: acc.total / acc.count as f64,
                first_purchase: acc.first,
                last_purchase: acc.last,
                tenure_days,
                purchase_frequency: acc.count as f64 / tenure_months,
                segment: thresholds.segment_for(acc.total),
            }
        })
        .collect();
    profiles.sort_by(|a, b| {
        b.lifetime_value
            .total_cmp(&a.lifetime_value)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    profiles
}

/// Spend per acquired customer. `Undefined` when a window acquired nobody.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cac {
    Defined(f64),
    Undefined,
}

impl Cac {
    pub fn value(&self) -> Option<f64> {
        match self {
            Cac::Defined(v) => Some(*v),
            Cac::Undefined => None,
        }
    }
}

/// Months of cohort spend needed to recover the CAC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payback {
    Months(f64),
    /// The cohort spends nothing per month.
    Infinite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignAcquisition {
    pub campaign_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub spend: f64,
    pub acquired_customers: u64,
    pub cohort_ltv_mean: f64,
    pub cac: Cac,
    /// Cohort mean LTV over CAC; 0 when CAC is undefined or zero.
    pub ltv_cac_ratio: f64,
    pub cohort_avg_monthly_spend: f64,
    /// `None` when CAC is undefined.
    pub payback: Option<Payback>,
}

/// Attribute each customer to the first window containing their first
/// purchase and derive CAC, LTV:CAC and payback per window.
pub fn acquisition_costs(profiles: &[CustomerProfile], windows: &[CampaignWindow]) -> Vec<CampaignAcquisition> {
    let mut cohorts: Vec<Vec<&CustomerProfile>> = vec![Vec::new(); windows.len()];
    for profile in profiles {
        if let Some(idx) = windows.iter().position(|w| w.contains(profile.first_purchase)) {
            cohorts[idx].push(profile);
        }
    }

    windows
        .iter()
        .zip(cohorts)
        .map(|(window, cohort)| {
            let acquired = cohort.len() as u64;
            let (cohort_ltv_mean, cohort_avg_monthly_spend) = if acquired > 0 {
                let n = acquired as f64;
                (
                    cohort.iter().map(|p| p.lifetime_value).sum::<f64>() / n,
                    cohort.iter().map(|p| p.monthly_spend()).sum::<f64>() / n,
                )
            } else {
                (0.0, 0.0)
            };

            let cac = if acquired > 0 {
                Cac::Defined(window.spend / acquired as f64)
            } else {
                Cac::Undefined
            };

            let ltv_cac_ratio = match cac {
                Cac::Defined(v) if v > 0.0 => cohort_ltv_mean / v,
                _ => 0.0,
            };

            let payback = cac.value().map(|v| {
                if cohort_avg_monthly_spend > 0.0 {
                    Payback::Months(v / cohort_avg_monthly_spend)
                } else {
                    Payback::Infinite
                }
            });

            debug!(
                campaign = %window.campaign_name,
                acquired,
                cac = ?cac,
                "Campaign acquisition computed"
            );

            CampaignAcquisition {
                campaign_name: window.campaign_name.clone(),
                start_date: window.start_date,
                end_date: window.end_date,
                spend: window.spend,
                acquired_customers: acquired,
                cohort_ltv_mean,
                cac,
                ltv_cac_ratio,
                cohort_avg_monthly_spend,
                payback,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub segment: CustomerSegment,
    pub label: String,
    pub customers: u64,
    pub total_ltv: f64,
    pub avg_ltv: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerValueReport {
    /// False when no file carried a customer column.
    pub available: bool,
    pub profiles: Vec<CustomerProfile>,
    /// VIP first.
    pub segments: Vec<SegmentSummary>,
    pub total_customers: u64,
    pub avg_ltv: f64,
    pub avg_purchase_frequency: f64,
    pub acquisitions: Vec<CampaignAcquisition>,
}

impl CustomerValueReport {
    pub fn compute(
        table: &TransactionTable,
        windows: &[CampaignWindow],
        thresholds: &SegmentThresholds,
        min_frequency_months: f64,
    ) -> Self {
        if !table.has_customer_column {
            warn!("No customer column in transaction data, skipping customer value analysis");
            return Self::default();
        }

        let profiles = customer_profiles(table, thresholds, min_frequency_months);
        let total_customers = profiles.len() as u64;

        let segments = CustomerSegment::ALL
            .iter()
            .map(|&segment| {
                let (customers, total_ltv) = profiles
                    .iter()
                    .filter(|p| p.segment == segment)
                    .fold((0u64, 0.0), |(n, sum), p| (n + 1, sum + p.lifetime_value));
                SegmentSummary {
                    segment,
                    label: segment.label().to_string(),
                    customers,
                    total_ltv,
                    avg_ltv: if customers > 0 {
                        total_ltv / customers as f64
                    } else {
                        0.0
                    },
                }
            })
            .collect();

        let (avg_ltv, avg_purchase_frequency) = if total_customers > 0 {
            let n = total_customers as f64;
            (
                profiles.iter().map(|p| p.lifetime_value).sum::<f64>() / n,
                profiles.iter().map(|p| p.purchase_frequency).sum::<f64>() / n,
            )
        } else {
            (0.0, 0.0)
        };

        let acquisitions = acquisition_costs(&profiles, windows);

        Self {
            available: true,
            profiles,
            segments,
            total_customers,
            avg_ltv,
            avg_purchase_frequency,
            acquisitions,
        }
    }
}
