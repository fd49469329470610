//! Ad-spend totals, ROI and spend breakdowns.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use studio_core::types::{MarketingTable, MonthKey};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingMetrics {
    pub total_spend: f64,
    /// `total_revenue / total_spend` (0.0 when spend is zero).
    pub roi: f64,
    /// `total_spend / total_revenue` (0.0 when revenue is zero).
    pub cost_per_revenue: f64,
    pub profit_after_ads: f64,
    pub spend_by_platform: Vec<PlatformSpend>,
    /// Chronological.
    pub spend_by_month: Vec<MonthlySpend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpend {
    pub platform: String,
    pub spend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySpend {
    pub month: MonthKey,
    pub label: String,
    pub spend: f64,
}

impl MarketingMetrics {
    /// Result used when there is no usable spend data.
    pub fn zero(total_revenue: f64) -> Self {
        Self {
            total_spend: 0.0,
            roi: 0.0,
            cost_per_revenue: 0.0,
            profit_after_ads: total_revenue,
            spend_by_platform: Vec::new(),
            spend_by_month: Vec::new(),
        }
    }

    pub fn compute(table: &MarketingTable, total_revenue: f64) -> Self {
        if table.is_empty() || !table.spend_resolved {
            debug!(
                rows = table.len(),
                spend_resolved = table.spend_resolved,
                "No usable spend data, returning zero marketing metrics"
            );
            return Self::zero(total_revenue);
        }

        let total_spend: f64 = table.iter().map(|r| r.spend_amount).sum();

        let mut by_platform: HashMap<&str, f64> = HashMap::new();
        let mut by_month: BTreeMap<MonthKey, f64> = BTreeMap::new();
        for record in table.iter() {
            *by_platform.entry(record.platform.as_str()).or_insert(0.0) += record.spend_amount;
            if let Some(month) = record.month() {
                *by_month.entry(month).or_insert(0.0) += record.spend_amount;
            }
        }

        let mut spend_by_platform: Vec<PlatformSpend> = by_platform
            .into_iter()
            .map(|(platform, spend)| PlatformSpend {
                platform: platform.to_string(),
                spend,
            })
            .collect();
        spend_by_platform.sort_by(|a, b| a.platform.cmp(&b.platform));

        let spend_by_month = by_month
            .into_iter()
            .map(|(month, spend)| MonthlySpend {
                month,
                label: month.label(),
                spend,
            })
            .collect();

        Self {
            total_spend,
            roi: if total_spend > 0.0 {
                total_revenue / total_spend
            } else {
                0.0
            },
            cost_per_revenue: if total_revenue > 0.0 {
                total_spend / total_revenue
            } else {
                0.0
            },
            profit_after_ads: total_revenue - total_spend,
            spend_by_platform,
            spend_by_month,
        }
    }

    pub fn has_spend(&self) -> bool {
        self.total_spend > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use studio_core::types::MarketingRecord;

    fn spend(date: &str, platform: &str, amount: f64) -> MarketingRecord {
        MarketingRecord {
            date: Some(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
            period: None,
            campaign_name: "General".to_string(),
            platform: platform.to_string(),
            spend_amount: amount,
            source_file: "ads.csv".to_string(),
        }
    }

    fn table(records: Vec<MarketingRecord>) -> MarketingTable {
        MarketingTable {
            records,
            spend_resolved: true,
            resolutions: Vec::new(),
        }
    }

    #[test]
    fn test_empty_table_returns_zero_result() {
        let m = MarketingMetrics::compute(&MarketingTable::default(), 1234.5);
        assert_eq!(m.roi, 0.0);
        assert_eq!(m.total_spend, 0.0);
        assert_eq!(m.profit_after_ads, 1234.5);
    }

    #[test]
    fn test_unresolved_spend_column_returns_zero_result() {
        let mut t = table(vec![spend("2025-07-01", "Facebook", 0.0)]);
        t.spend_resolved = false;
        let m = MarketingMetrics::compute(&t, 500.0);
        assert_eq!(m, MarketingMetrics::zero(500.0));
    }

    #[test]
    fn test_roi_and_cost_per_revenue() {
        let t = table(vec![
            spend("2025-07-01", "Facebook", 150.0),
            spend("2025-07-15", "Google", 50.0),
            spend("2025-08-01", "Facebook", 100.0),
        ]);
        let m = MarketingMetrics::compute(&t, 3000.0);

        assert!((m.total_spend - 300.0).abs() < 1e-9);
        assert!((m.roi - 10.0).abs() < 1e-9);
        assert!((m.cost_per_revenue - 0.1).abs() < 1e-9);
        assert!((m.profit_after_ads - 2700.0).abs() < 1e-9);

        assert_eq!(m.spend_by_platform[0].platform, "Facebook");
        assert!((m.spend_by_platform[0].spend - 250.0).abs() < 1e-9);
        assert_eq!(m.spend_by_month.len(), 2);
        assert_eq!(m.spend_by_month[0].label, "July 2025");
        assert!((m.spend_by_month[0].spend - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_spend_and_zero_revenue_guards() {
        let m = MarketingMetrics::compute(&table(vec![spend("2025-07-01", "Facebook", 0.0)]), 0.0);
        assert_eq!(m.roi, 0.0);
        assert_eq!(m.cost_per_revenue, 0.0);
        assert_eq!(m.profit_after_ads, 0.0);
        assert!(!m.has_spend());
    }
}
