//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC time as ISO 8601 with millisecond precision and `Z` suffix
pub fn now_iso() -> String {
    to_iso(&now())
}

/// Format a timestamp as ISO 8601 (`2026-01-28T12:34:56.789Z`)
pub fn to_iso(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Elapsed seconds rounded to two decimals (for `response_time` fields)
pub fn seconds_rounded(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}
