//! # Date Handling Utilities
//!
//! Compact date rendering for list rows and result panels.

use chrono::{DateTime, Datelike, Utc};

/// Formats a timestamp as `YYYY-MM-DD`.
pub fn format_date(date_time: &DateTime<Utc>) -> String {
    format!("{:04}-{:02}-{:02}", date_time.year(), date_time.month(), date_time.day())
}

/// Formats an optional timestamp, using `—` when it is unknown.
pub fn format_optional_date(date_time: Option<&DateTime<Utc>>) -> String {
    date_time.map(format_date).unwrap_or_else(|| "—".to_string())
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_timestamp(date_time: &DateTime<Utc>) -> String {
    date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
