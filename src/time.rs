//! Millisecond timestamps and clock rendering.

use chrono::{DateTime, Local};

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Format a millisecond timestamp as a local HH:MM clock string.
///
/// Out-of-range timestamps render as an empty string rather than failing.
pub fn format_clock(timestamp_millis: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_millis)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}
