//! Revenue, customer and transaction-count aggregates over the transaction table.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use studio_core::types::{Category, MonthKey, TransactionTable};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessMetrics {
    pub total_revenue: f64,
    pub total_transactions: u64,
    /// Distinct customer ids; 0 when no file carried a customer column.
    pub unique_customers: u64,
    pub membership_revenue: f64,
    /// Pay-as-you-go (credit pack) revenue.
    pub payg_revenue: f64,
    pub membership_pct: f64,
    pub payg_pct: f64,
    pub avg_transaction: f64,
    pub revenue_per_customer: f64,
}

impl BusinessMetrics {
    /// Aggregate the table. An empty table yields the all-zero metrics.
    pub fn compute(table: &TransactionTable) -> Self {
        let mut total_revenue = 0.0;
        let mut membership_revenue = 0.0;
        let mut payg_revenue = 0.0;
        let mut customers: HashSet<&str> = HashSet::new();

        for record in table.iter() {
            total_revenue += record.amount_inc_tax;
            match record.category {
                Category::Membership => membership_revenue += record.amount_inc_tax,
                Category::CreditPack => payg_revenue += record.amount_inc_tax,
                Category::Other(_) => {}
            }
            if let Some(id) = record.customer_id.as_deref() {
                customers.insert(id);
            }
        }

        let total_transactions = table.len() as u64;
        let unique_customers = if table.has_customer_column {
            customers.len() as u64
        } else {
            0
        };

        Self {
            total_revenue,
            total_transactions,
            unique_customers,
            membership_revenue,
            payg_revenue,
            membership_pct: percentage(membership_revenue, total_revenue),
            payg_pct: percentage(payg_revenue, total_revenue),
            avg_transaction: if total_transactions > 0 {
                total_revenue / total_transactions as f64
            } else {
                0.0
            },
            revenue_per_customer: if unique_customers > 0 {
                total_revenue / unique_customers as f64
            } else {
                0.0
            },
        }
    }
}

/// `part / total * 100`, or 0 when the total is not positive.
fn percentage(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// Revenue for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub month: MonthKey,
    pub label: String,
    pub revenue: f64,
    pub transactions: u64,
    pub customers: u64,
}

/// Month-over-month view plus progress against the monthly revenue target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueTrend {
    /// Chronological.
    pub months: Vec<MonthlyRevenue>,
    pub unique_months: usize,
    pub monthly_avg_revenue: f64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub monthly_target: f64,
    pub target_met: bool,
    /// Revenue still missing per month to reach the target (0 once met).
    pub target_gap: f64,
}

pub fn revenue_trend(table: &TransactionTable, monthly_target: f64) -> RevenueTrend {
    let mut buckets: BTreeMap<MonthKey, (f64, u64, HashSet<&str>)> = BTreeMap::new();
    for record in table.iter() {
        let entry = buckets
            .entry(record.month())
            .or_insert_with(|| (0.0, 0, HashSet::new()));
        entry.0 += record.amount_inc_tax;
        entry.1 += 1;
        if let Some(id) = record.customer_id.as_deref() {
            entry.2.insert(id);
        }
    }

    let months: Vec<MonthlyRevenue> = buckets
        .into_iter()
        .map(|(month, (revenue, transactions, customers))| MonthlyRevenue {
            month,
            label: month.label(),
            revenue,
            transactions,
            customers: customers.len() as u64,
        })
        .collect();

    let unique_months = months.len();
    let total: f64 = months.iter().map(|m| m.revenue).sum();
    let monthly_avg_revenue = if unique_months > 0 {
        total / unique_months as f64
    } else {
        0.0
    };
    let (first_date, last_date) = match table.date_range() {
        Some((first, last)) => (Some(first), Some(last)),
        None => (None, None),
    };

    RevenueTrend {
        months,
        unique_months,
        monthly_avg_revenue,
        first_date,
        last_date,
        monthly_target,
        target_met: unique_months > 0 && monthly_avg_revenue >= monthly_target,
        target_gap: (monthly_target - monthly_avg_revenue).max(0.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRevenue {
    pub item: String,
    pub revenue: f64,
    pub transactions: u64,
}

/// The `limit` best-selling items by revenue, ties broken by name.
pub fn top_products(table: &TransactionTable, limit: usize) -> Vec<ProductRevenue> {
    let mut by_item: HashMap<&str, (f64, u64)> = HashMap::new();
    for record in table.iter() {
        let entry = by_item.entry(record.item.as_str()).or_insert((0.0, 0));
        entry.0 += record.amount_inc_tax;
        entry.1 += 1;
    }

    let mut products: Vec<ProductRevenue> = by_item
        .into_iter()
        .map(|(item, (revenue, transactions))| ProductRevenue {
            item: item.to_string(),
            revenue,
            transactions,
        })
        .collect();
    products.sort_by(|a, b| b.revenue.total_cmp(&a.revenue).then_with(|| a.item.cmp(&b.item)));
    products.truncate(limit);
    products
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_core::types::TransactionRecord;

    fn record(date: &str, item: &str, category: Category, amount: f64, customer: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            item: item.to_string(),
            category,
            amount_inc_tax: amount,
            quantity_sold: None,
            customer_id: customer.map(str::to_string),
            promo_code: None,
            source_file: "test.csv".to_string(),
        }
    }

    fn table(records: Vec<TransactionRecord>) -> TransactionTable {
        TransactionTable {
            records,
            has_customer_column: true,
            ..Default::default()
        }
    }

    fn sample() -> TransactionTable {
        table(vec![
            record("2025-07-01", "Unlimited", Category::Membership, 60.0, Some("alice")),
            record("2025-07-02", "10 Pack", Category::CreditPack, 30.0, Some("bob")),
            record("2025-07-03", "Towel", Category::Other("RETAIL".into()), 10.0, Some("alice")),
            record("2025-08-01", "Unlimited", Category::Membership, 60.0, Some("carol")),
        ])
    }

    #[test]
    fn test_business_metrics() {
        let m = BusinessMetrics::compute(&sample());
        assert!((m.total_revenue - 160.0).abs() < 1e-9);
        assert_eq!(m.total_transactions, 4);
        assert_eq!(m.unique_customers, 3);
        assert!((m.membership_revenue - 120.0).abs() < 1e-9);
        assert!((m.payg_revenue - 30.0).abs() < 1e-9);
        assert!((m.membership_pct - 75.0).abs() < 1e-9);
        assert!((m.payg_pct - 18.75).abs() < 1e-9);
        assert!((m.avg_transaction - 40.0).abs() < 1e-9);
        assert!((m.revenue_per_customer - 160.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_shares_bounded_when_other_categories_exist() {
        let m = BusinessMetrics::compute(&sample());
        assert!(m.membership_pct >= 0.0 && m.membership_pct <= 100.0);
        assert!(m.payg_pct >= 0.0 && m.payg_pct <= 100.0);
        assert!(m.membership_pct + m.payg_pct <= 100.0);
    }

    #[test]
    fn test_zero_revenue_guards() {
        let m = BusinessMetrics::compute(&table(vec![
            record("2025-07-01", "Free Trial", Category::Membership, 0.0, Some("alice")),
        ]));
        assert_eq!(m.total_transactions, 1);
        assert_eq!(m.avg_transaction, 0.0);
        assert_eq!(m.revenue_per_customer, 0.0);
        assert_eq!(m.membership_pct, 0.0);
        assert_eq!(m.payg_pct, 0.0);
    }

    #[test]
    fn test_empty_table_is_all_zero() {
        assert_eq!(BusinessMetrics::compute(&TransactionTable::default()), BusinessMetrics::default());
    }

    #[test]
    fn test_no_customer_column_counts_zero_customers() {
        let mut t = sample();
        t.has_customer_column = false;
        let m = BusinessMetrics::compute(&t);
        assert_eq!(m.unique_customers, 0);
        assert_eq!(m.revenue_per_customer, 0.0);
    }

    #[test]
    fn test_doubling_input_doubles_counts() {
        let once = BusinessMetrics::compute(&sample());
        let mut twice = sample();
        twice.append(sample());
        let doubled = BusinessMetrics::compute(&twice);
        assert_eq!(doubled.total_transactions, once.total_transactions * 2);
        assert!((doubled.total_revenue - once.total_revenue * 2.0).abs() < 1e-9);
        assert_eq!(doubled.unique_customers, once.unique_customers);
    }

    #[test]
    fn test_revenue_trend_is_chronological() {
        let mut t = sample();
        t.records.push(record("2024-12-15", "Unlimited", Category::Membership, 40.0, None));
        let trend = revenue_trend(&t, 100.0);

        let labels: Vec<&str> = trend.months.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["December 2024", "July 2025", "August 2025"]);
        assert_eq!(trend.unique_months, 3);
        assert!((trend.monthly_avg_revenue - 200.0 / 3.0).abs() < 1e-9);
        assert!(!trend.target_met);
        assert!((trend.target_gap - (100.0 - 200.0 / 3.0)).abs() < 1e-9);
        assert_eq!(trend.months[1].customers, 2);
    }

    #[test]
    fn test_top_products_ranked_and_truncated() {
        let products = top_products(&sample(), 2);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].item, "Unlimited");
        assert!((products[0].revenue - 120.0).abs() < 1e-9);
        assert_eq!(products[0].transactions, 2);
        assert_eq!(products[1].item, "10 Pack");
    }
}
