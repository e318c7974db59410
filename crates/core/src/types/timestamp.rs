//! Display formatting for backend timestamps.
//!
//! The backend sends `created_at` as RFC 3339 most of the time and as a bare
//! `YYYY-MM-DD HH:MM:SS` from older endpoints.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Placeholder shown when a record carries no timestamp.
pub const UNKNOWN_DATE: &str = "Unknown date";

/// Parse a backend timestamp. Naive timestamps are taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Format a timestamp like `Mar 5, 2025, 14:07`.
///
/// Unparseable values are shown as-is; missing values as [`UNKNOWN_DATE`].
///
/// ```
/// use folio_core::display_timestamp;
///
/// assert_eq!(display_timestamp(Some("2025-03-05T14:07:00Z")), "Mar 5, 2025, 14:07");
/// assert_eq!(display_timestamp(Some("yesterday")), "yesterday");
/// assert_eq!(display_timestamp(None), "Unknown date");
/// ```
#[must_use]
pub fn display_timestamp(raw: Option<&str>) -> String {
    match raw {
        None => UNKNOWN_DATE.to_string(),
        Some(value) if value.trim().is_empty() => UNKNOWN_DATE.to_string(),
        Some(value) => parse_timestamp(value).map_or_else(
            || value.to_string(),
            |parsed| parsed.format("%b %-d, %Y, %H:%M").to_string(),
        ),
    }
}
