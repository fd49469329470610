//! Turn raw CSV tables into typed transaction and marketing tables.

use studio_core::types::{
    Category, MarketingRecord, MarketingTable, SemanticField, TransactionRecord, TransactionTable,
};
use tracing::{debug, info, warn};

use crate::columns::{default_for, ColumnResolver, ResolvedColumn};
use crate::loader::RawTable;
use crate::parse::{parse_amount, parse_date_day_first, parse_quantity};

fn cell<'r>(row: &'r [String], column: Option<&ResolvedColumn>) -> Option<&'r str> {
    column
        .and_then(|c| row.get(c.index))
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Concatenate transaction files. Rows whose date does not parse are dropped.
pub fn normalize_transactions(tables: &[RawTable]) -> TransactionTable {
    let mut out = TransactionTable::default();
    let amount_default = default_for(SemanticField::Amount).number();
    let item_default = default_for(SemanticField::Item).text();

    for table in tables {
        let mut resolver = ColumnResolver::new(&table.source_file, &table.headers);
        let date_col = resolver.resolve(SemanticField::Date);
        let amount_col = resolver.resolve(SemanticField::Amount);
        let item_col = resolver.resolve(SemanticField::Item);
        let category_col = resolver.resolve_optional(SemanticField::Category);
        let quantity_col = resolver.resolve_optional(SemanticField::Quantity);
        let customer_col = resolver.resolve_optional(SemanticField::Customer);
        let promo_col = resolver.resolve_optional(SemanticField::PromoCode);

        out.has_customer_column |= customer_col.is_some();
        out.has_quantity_column |= quantity_col.is_some();
        out.resolutions.extend(resolver.into_resolutions());

        let mut dropped = 0usize;
        for row in &table.rows {
            let Some(date) = cell(row, date_col.as_ref()).and_then(parse_date_day_first) else {
                dropped += 1;
                continue;
            };

            let amount_inc_tax = match cell(row, amount_col.as_ref()) {
                Some(raw) => parse_amount(raw).unwrap_or_else(|| {
                    debug!(file = %table.source_file, value = raw, "Unparseable amount replaced by default");
                    amount_default
                }),
                None => amount_default,
            };

            out.records.push(TransactionRecord {
                date,
                item: cell(row, item_col.as_ref()).unwrap_or(item_default).to_string(),
                category: cell(row, category_col.as_ref())
                    .map(Category::parse)
                    .unwrap_or_else(|| Category::Other(String::new())),
                amount_inc_tax,
                quantity_sold: cell(row, quantity_col.as_ref()).and_then(parse_quantity),
                customer_id: cell(row, customer_col.as_ref()).map(|s| s.trim().to_string()),
                promo_code: cell(row, promo_col.as_ref()).map(|s| s.trim().to_string()),
                source_file: table.source_file.clone(),
            });
        }

        if dropped > 0 {
            warn!(file = %table.source_file, dropped, "Dropped rows with unparseable dates");
            metrics::counter!("ingest.rows_dropped").increment(dropped as u64);
        }
    }

    info!(rows = out.len(), files = tables.len(), "Transactions normalized");
    out
}

/// Concatenate marketing files, applying the column resolver's defaults for
/// spend, campaign and platform.
pub fn normalize_marketing(tables: &[RawTable]) -> MarketingTable {
    let mut out = MarketingTable::default();
    let spend_default = default_for(SemanticField::Spend).number();
    let campaign_default = default_for(SemanticField::Campaign).text();
    let platform_default = default_for(SemanticField::Platform).text();

    for table in tables {
        let mut resolver = ColumnResolver::new(&table.source_file, &table.headers);
        let date_col = resolver.resolve_optional(SemanticField::Date);
        let spend_col = resolver.resolve(SemanticField::Spend);
        let campaign_col = resolver.resolve(SemanticField::Campaign);
        let platform_col = resolver.resolve(SemanticField::Platform);
        let start_col = resolver.resolve_optional(SemanticField::ReportingStart);
        let end_col = resolver.resolve_optional(SemanticField::ReportingEnd);

        if date_col.is_none() && start_col.is_none() {
            warn!(file = %table.source_file, "No date or reporting-period column; spend cannot be placed in time");
        }
        out.spend_resolved |= spend_col.is_some();
        out.resolutions.extend(resolver.into_resolutions());

        for row in &table.rows {
            let start = cell(row, start_col.as_ref()).and_then(parse_date_day_first);
            let end = cell(row, end_col.as_ref()).and_then(parse_date_day_first);
            let period = match (start, end) {
                (Some(s), Some(e)) if s <= e => Some((s, e)),
                (Some(s), Some(e)) => Some((e, s)),
                (Some(s), None) => Some((s, s)),
                _ => None,
            };

            out.records.push(MarketingRecord {
                date: cell(row, date_col.as_ref()).and_then(parse_date_day_first),
                period,
                campaign_name: cell(row, campaign_col.as_ref())
                    .unwrap_or(campaign_default)
                    .to_string(),
                platform: cell(row, platform_col.as_ref())
                    .unwrap_or(platform_default)
                    .to_string(),
                spend_amount: cell(row, spend_col.as_ref())
                    .and_then(parse_amount)
                    .unwrap_or(spend_default),
                source_file: table.source_file.clone(),
            });
        }
    }

    info!(
        rows = out.len(),
        files = tables.len(),
        spend_resolved = out.spend_resolved,
        "Marketing data normalized"
    );
    out
}
