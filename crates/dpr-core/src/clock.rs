//! Wall-clock helpers. Click timestamps and match records use Unix milliseconds.

use chrono::{Local, TimeZone};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as Unix milliseconds.
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Render Unix milliseconds as local `YYYY-MM-DD HH:MM:SS`, or the raw number if out of range.
pub fn format_local_millis(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}
