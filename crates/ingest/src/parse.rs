//! Cell-level parsing: day-first dates and currency amounts.

use chrono::NaiveDate;

/// Month-name forms, tried against the whole cell.
const NAMED_MONTH_FORMATS: &[&str] = &["%d %B %Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y"];

/// Numeric forms, tried against the cell with any time component removed.
/// Two-digit years come before four-digit ones since `%Y` also accepts `25`.
const NUMERIC_FORMATS: &[&str] = &[
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
];

/// Parse a date using the day-first convention of UK point-of-sale exports.
///
/// Accepts `dd/mm/yyyy`, `dd/mm/yy`, `dd-mm-yyyy`, `dd.mm.yyyy`, ISO
/// `yyyy-mm-dd` (also with `/`), an optional trailing time component, and
/// month-name forms such as `5 July 2025`.
pub fn parse_date_day_first(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = NAMED_MONTH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
    {
        return Some(date);
    }

    let date_part = trimmed.split([' ', 'T']).next()?;
    NUMERIC_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Parse a monetary amount, tolerating currency symbols, thousands
/// separators and accounting-style parentheses for negatives.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '£' | '$' | '€' | ',' | ' '))
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Parse a whole-unit quantity such as `2` or `2.0`.
pub fn parse_quantity(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return Some(n);
    }
    let value: f64 = trimmed.parse().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}
