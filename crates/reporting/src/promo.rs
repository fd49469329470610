//! Promo-code performance and direct attribution.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use studio_core::types::{MarketingTable, TransactionTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoCodePerformance {
    pub code: String,
    pub revenue: f64,
    pub transactions: u64,
    pub customers: u64,
    /// First campaign (in upload order) whose name contains a word of the code.
    pub matched_campaign: Option<String>,
    pub campaign_spend: f64,
    pub roi: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromoCodeReport {
    pub has_promo_data: bool,
    /// Highest revenue first.
    pub codes: Vec<PromoCodePerformance>,
    pub total_promo_revenue: f64,
    pub total_promo_transactions: u64,
    pub promo_customers: u64,
    /// Share of total revenue carrying a promo code.
    pub attributed_revenue_pct: f64,
    pub non_promo_revenue: f64,
    pub non_promo_transactions: u64,
}

/// Group promo-coded transactions by code and match each code to campaign
/// spend by case-insensitive word overlap with the campaign name.
pub fn promo_code_report(
    transactions: &TransactionTable,
    marketing: &MarketingTable,
    total_revenue: f64,
) -> PromoCodeReport {
    let mut by_code: HashMap<&str, (f64, u64, HashSet<&str>)> = HashMap::new();
    let mut customers: HashSet<&str> = HashSet::new();
    for record in transactions.iter() {
        let Some(code) = record.promo_code.as_deref() else {
            continue;
        };
        let entry = by_code.entry(code).or_insert_with(|| (0.0, 0, HashSet::new()));
        entry.0 += record.amount_inc_tax;
        entry.1 += 1;
        if let Some(id) = record.customer_id.as_deref() {
            entry.2.insert(id);
            customers.insert(id);
        }
    }

    if by_code.is_empty() {
        return PromoCodeReport {
            non_promo_revenue: total_revenue,
            non_promo_transactions: transactions.len() as u64,
            ..Default::default()
        };
    }

    // Campaign spend in first-seen order.
    let mut campaigns: Vec<(&str, f64)> = Vec::new();
    for record in marketing.iter() {
        match campaigns.iter().position(|(name, _)| *name == record.campaign_name) {
            Some(i) => campaigns[i].1 += record.spend_amount,
            None => campaigns.push((record.campaign_name.as_str(), record.spend_amount)),
        }
    }

    let mut codes: Vec<PromoCodePerformance> = by_code
        .into_iter()
        .map(|(code, (revenue, count, code_customers))| {
            let upper = code.to_uppercase();
            let matched = campaigns.iter().find(|(name, _)| {
                let campaign = name.to_uppercase();
                upper.split_whitespace().any(|word| campaign.contains(word))
            });
            let campaign_spend = matched.map(|(_, spend)| *spend).unwrap_or(0.0);
            PromoCodePerformance {
                code: code.to_string(),
                revenue,
                transactions: count,
                customers: code_customers.len() as u64,
                matched_campaign: matched.map(|(name, _)| name.to_string()),
                campaign_spend,
                roi: if campaign_spend > 0.0 {
                    revenue / campaign_spend
                } else {
                    0.0
                },
            }
        })
        .collect();
    codes.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.code.cmp(&b.code)));

    let total_promo_revenue: f64 = codes.iter().map(|c| c.revenue).sum();
    let total_promo_transactions: u64 = codes.iter().map(|c| c.transactions).sum();

    PromoCodeReport {
        has_promo_data: true,
        codes,
        total_promo_revenue,
        total_promo_transactions,
        promo_customers: customers.len() as u64,
        attributed_revenue_pct: if total_revenue > 0.0 {
            total_promo_revenue / total_revenue * 100.0
        } else {
            0.0
        },
        non_promo_revenue: total_revenue - total_promo_revenue,
        non_promo_transactions: (transactions.len() as u64).saturating_sub(total_promo_transactions),
    }
}
