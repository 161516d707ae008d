//! Date/time utilities for gator.
//!
//! Timestamps are stored as fixed-width UTC strings so that ordering by the
//! column in SQL is the same as chronological ordering.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use chrono_tz::Tz;

/// Display format used by the browse output.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Encode a timestamp for storage.
pub fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a stored timestamp.
///
/// Accepts RFC3339 as written by [`to_db_timestamp`] as well as the plain
/// `YYYY-MM-DD HH:MM:SS` form SQLite's own datetime functions produce.
pub fn parse_db_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Format a DateTime<Utc> in the specified timezone.
///
/// Falls back to UTC when the timezone name is unknown.
pub fn format_utc_datetime(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return dt.format(format).to_string(),
    };
    dt.with_timezone(&tz).format(format).to_string()
}
