//! Lenient field coercion for the punctuality CSVs.
//!
//! Every function returns `None` instead of failing: a value that cannot be
//! coerced is treated as missing, and the cleaner decides what to do with the row.

use chrono::{DateTime, NaiveDate, NaiveTime};

fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Parses a text field, treating blank values as missing.
pub fn parse_text(raw: &str) -> Option<String> {
    non_empty(raw).map(str::to_string)
}

/// Parses a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM` (first of the month), `DD/MM/YYYY`, and
/// RFC 3339 timestamps (date part kept).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = non_empty(raw)?;

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Parses a finite float. `NaN` and infinities count as missing.
pub fn parse_float(raw: &str) -> Option<f64> {
    non_empty(raw)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parses a non-negative count. Integral float text such as `"100.0"` is accepted.
pub fn parse_count(raw: &str) -> Option<u32> {
    let s = non_empty(raw)?;

    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }

    let v = parse_float(s)?;
    if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
        Some(v as u32)
    } else {
        None
    }
}

/// Parses a time of day as `HH:MM:SS` or `HH:MM`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let s = non_empty(raw)?;
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}
