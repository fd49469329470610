//! Heuristic column resolution across heterogeneous CSV exports.
//!
//! Every semantic field owns an ordered synonym list. The first synonym
//! present in a file's header row wins; exact matches are tried before a
//! case-insensitive, whitespace-trimmed pass. A field with no match is not an
//! error: callers fall back to the field's documented default.

use studio_core::types::{ColumnResolution, SemanticField, DEFAULT_CAMPAIGN_NAME, DEFAULT_PLATFORM};
use tracing::warn;

pub const DATE_COLUMNS: &[&str] = &["Date", "date", "DATE", "Day", "day"];
pub const AMOUNT_COLUMNS: &[&str] = &["Amount Inc Tax", "Amount inc tax", "Amount", "Total"];
pub const ITEM_COLUMNS: &[&str] = &["Item", "item", "Product", "product"];
pub const CATEGORY_COLUMNS: &[&str] = &["Category", "category"];
pub const SPEND_COLUMNS: &[&str] = &[
    "Amount",
    "amount",
    "Spend",
    "spend",
    "Cost",
    "cost",
    "Amount Spent",
    "Amount spent (GBP)",
    "Amount spent (USD)",
    "Amount (GBP)",
    "Amount (USD)",
    "Spent",
];
pub const CAMPAIGN_COLUMNS: &[&str] = &["Campaign name", "Campaign", "campaign"];
pub const PLATFORM_COLUMNS: &[&str] = &["Platform", "platform"];
pub const REPORTING_START_COLUMNS: &[&str] = &["Reporting starts", "Reporting Starts", "Start date"];
pub const REPORTING_END_COLUMNS: &[&str] = &["Reporting ends", "Reporting Ends", "End date"];
pub const PROMO_CODE_COLUMNS: &[&str] = &[
    "Promo Code",
    "promo_code",
    "Promotion",
    "promotion",
    "Code",
    "code",
    "Discount Code",
];
pub const QUANTITY_COLUMNS: &[&str] = &["Quantity Sold", "Quantity", "quantity", "Qty"];
pub const CUSTOMER_COLUMNS: &[&str] = &["Sold To", "Customer", "Customer ID", "customer_id"];

/// Value substituted for a field whose column was not found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Number(f64),
    Text(&'static str),
    /// The field stays absent (`None`) on every row.
    Absent,
}

impl FieldDefault {
    /// Numeric fallback; 0 for text and absent policies.
    pub fn number(self) -> f64 {
        match self {
            FieldDefault::Number(value) => value,
            _ => 0.0,
        }
    }

    /// Text fallback; empty for numeric and absent policies.
    pub fn text(self) -> &'static str {
        match self {
            FieldDefault::Text(value) => value,
            _ => "",
        }
    }
}

pub fn synonyms(field: SemanticField) -> &'static [&'static str] {
    match field {
        SemanticField::Date => DATE_COLUMNS,
        SemanticField::Amount => AMOUNT_COLUMNS,
        SemanticField::Item => ITEM_COLUMNS,
        SemanticField::Category => CATEGORY_COLUMNS,
        SemanticField::Spend => SPEND_COLUMNS,
        SemanticField::Campaign => CAMPAIGN_COLUMNS,
        SemanticField::Platform => PLATFORM_COLUMNS,
        SemanticField::ReportingStart => REPORTING_START_COLUMNS,
        SemanticField::ReportingEnd => REPORTING_END_COLUMNS,
        SemanticField::PromoCode => PROMO_CODE_COLUMNS,
        SemanticField::Quantity => QUANTITY_COLUMNS,
        SemanticField::Customer => CUSTOMER_COLUMNS,
    }
}

pub fn default_for(field: SemanticField) -> FieldDefault {
    match field {
        SemanticField::Spend | SemanticField::Amount => FieldDefault::Number(0.0),
        SemanticField::Campaign => FieldDefault::Text(DEFAULT_CAMPAIGN_NAME),
        SemanticField::Platform => FieldDefault::Text(DEFAULT_PLATFORM),
        SemanticField::Item => FieldDefault::Text("Unknown"),
        _ => FieldDefault::Absent,
    }
}

/// A header located for a semantic field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub index: usize,
    pub name: String,
}

/// Resolves semantic fields against one file's header row and records every
/// lookup for diagnostics.
pub struct ColumnResolver<'a> {
    source_file: &'a str,
    headers: &'a [String],
    resolutions: Vec<ColumnResolution>,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(source_file: &'a str, headers: &'a [String]) -> Self {
        Self {
            source_file,
            headers,
            resolutions: Vec::new(),
        }
    }

    /// Locate `field`, logging a warning when no synonym matched.
    pub fn resolve(&mut self, field: SemanticField) -> Option<ResolvedColumn> {
        let found = find_column(self.headers, synonyms(field));
        if found.is_none() && default_for(field) != FieldDefault::Absent {
            warn!(
                file = %self.source_file,
                field = %field,
                expected = ?synonyms(field),
                default = ?default_for(field),
                "No matching column found, using default"
            );
        }
        self.resolutions.push(ColumnResolution {
            source_file: self.source_file.to_string(),
            field,
            column: found.as_ref().map(|c| c.name.clone()),
        });
        found
    }

    /// Locate an optional field without warning when it is missing.
    pub fn resolve_optional(&mut self, field: SemanticField) -> Option<ResolvedColumn> {
        let found = find_column(self.headers, synonyms(field));
        self.resolutions.push(ColumnResolution {
            source_file: self.source_file.to_string(),
            field,
            column: found.as_ref().map(|c| c.name.clone()),
        });
        found
    }

    pub fn into_resolutions(self) -> Vec<ColumnResolution> {
        self.resolutions
    }
}

/// First synonym present in `headers`: exact pass, then case-insensitive.
pub fn find_column(headers: &[String], candidates: &[&str]) -> Option<ResolvedColumn> {
    for candidate in candidates {
        if let Some(index) = headers.iter().position(|h| h == candidate) {
            return Some(ResolvedColumn {
                index,
                name: headers[index].clone(),
            });
        }
    }
    for candidate in candidates {
        let wanted = candidate.trim().to_lowercase();
        if let Some(index) = headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
        {
            return Some(ResolvedColumn {
                index,
                name: headers[index].clone(),
            });
        }
    }
    None
}
