use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ─── Upload bookkeeping ─────────────────────────────────────────────────────

/// Which kind of upload a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Transaction,
    Marketing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "message")]
pub enum LoadStatus {
    Loaded,
    Failed(String),
}

/// Outcome of reading one uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStatus {
    pub filename: String,
    pub kind: DataKind,
    pub rows: usize,
    pub status: LoadStatus,
}

impl FileStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, LoadStatus::Loaded)
    }
}

// ─── Calendar ───────────────────────────────────────────────────────────────

/// Calendar month grouping key. Orders chronologically regardless of how the
/// label is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// `year * 100 + month`, e.g. 202507.
    pub fn sort_key(&self) -> i32 {
        self.year * 100 + self.month as i32
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
    }

    /// Human-readable label such as "July 2025".
    pub fn label(&self) -> String {
        match self.first_day() {
            Some(day) => day.format("%B %Y").to_string(),
            None => format!("{:04}-{:02}", self.year, self.month),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ─── Transactions ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Membership,
    CreditPack,
    Other(String),
}

impl Category {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "MEMBERSHIP" => Category::Membership,
            "CREDIT_PACK" => Category::CreditPack,
            other => Category::Other(other.to_string()),
        }
    }
}

/// One point-of-sale line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub item: String,
    pub category: Category,
    pub amount_inc_tax: f64,
    pub quantity_sold: Option<u32>,
    pub customer_id: Option<String>,
    pub promo_code: Option<String>,
    pub source_file: String,
}

impl TransactionRecord {
    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }

    /// Units sold on this line; one per row when no quantity was recorded.
    pub fn units(&self) -> u64 {
        self.quantity_sold.map(u64::from).unwrap_or(1)
    }
}

/// All transactions of one run, concatenated across uploaded files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionTable {
    pub records: Vec<TransactionRecord>,
    /// Whether any source file carried a customer identifier column.
    pub has_customer_column: bool,
    pub has_quantity_column: bool,
    pub resolutions: Vec<ColumnResolution>,
}

impl TransactionTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransactionRecord> {
        self.records.iter()
    }

    /// Append every row of `other`. No deduplication is performed.
    pub fn append(&mut self, other: TransactionTable) {
        self.records.extend(other.records);
        self.has_customer_column |= other.has_customer_column;
        self.has_quantity_column |= other.has_quantity_column;
        self.resolutions.extend(other.resolutions);
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.date).min()?;
        let last = self.records.iter().map(|r| r.date).max()?;
        Some((first, last))
    }
}

// ─── Marketing ──────────────────────────────────────────────────────────────

pub const DEFAULT_CAMPAIGN_NAME: &str = "General";
pub const DEFAULT_PLATFORM: &str = "Unknown";

/// One row of an ad-spend export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketingRecord {
    pub date: Option<NaiveDate>,
    /// Inclusive reporting period when the export carries start/end columns.
    pub period: Option<(NaiveDate, NaiveDate)>,
    pub campaign_name: String,
    pub platform: String,
    pub spend_amount: f64,
    pub source_file: String,
}

impl MarketingRecord {
    /// Month this spend belongs to: the row date, else the period start.
    pub fn month(&self) -> Option<MonthKey> {
        self.date
            .or_else(|| self.period.map(|(start, _)| start))
            .map(MonthKey::from_date)
    }
}

/// Semantic columns located heuristically in uploaded files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticField {
    Date,
    Amount,
    Item,
    Category,
    Spend,
    Campaign,
    Platform,
    ReportingStart,
    ReportingEnd,
    PromoCode,
    Quantity,
    Customer,
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Amount => write!(f, "amount"),
            Self::Item => write!(f, "item"),
            Self::Category => write!(f, "category"),
            Self::Spend => write!(f, "spend"),
            Self::Campaign => write!(f, "campaign"),
            Self::Platform => write!(f, "platform"),
            Self::ReportingStart => write!(f, "reporting_start"),
            Self::ReportingEnd => write!(f, "reporting_end"),
            Self::PromoCode => write!(f, "promo_code"),
            Self::Quantity => write!(f, "quantity"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

/// Which header (if any) a semantic field was resolved to in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnResolution {
    pub source_file: String,
    pub field: SemanticField,
    pub column: Option<String>,
}

impl ColumnResolution {
    pub fn is_resolved(&self) -> bool {
        self.column.is_some()
    }
}

/// All marketing rows of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketingTable {
    pub records: Vec<MarketingRecord>,
    /// True once at least one file had a spend column.
    pub spend_resolved: bool,
    pub resolutions: Vec<ColumnResolution>,
}

impl MarketingTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MarketingRecord> {
        self.records.iter()
    }

    pub fn has_reporting_periods(&self) -> bool {
        self.records.iter().any(|r| r.period.is_some())
    }

    /// Resolutions that found no column.
    pub fn unresolved(&self) -> impl Iterator<Item = &ColumnResolution> {
        self.resolutions.iter().filter(|r| !r.is_resolved())
    }
}
