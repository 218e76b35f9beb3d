//! Wall-clock timestamps
//!
//! Asset and book records carry creation/update times as milliseconds since
//! the Unix epoch, which is what the persisted JSON stores.

use chrono::{DateTime, TimeZone, Utc};

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds to a UTC date-time, if in range
pub fn to_datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ts).single()
}
