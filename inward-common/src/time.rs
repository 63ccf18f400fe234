//! Timestamp utilities

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Calendar date (`YYYY-MM-DD`, UTC) used for entry date filtering
pub fn date_string(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

/// Strictly increasing timestamp source
///
/// Two calls never return the same instant, even within one microsecond or
/// across a backwards wall-clock step, so creation timestamps give a total order.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last_micros: Mutex<i64>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after an already-issued timestamp (e.g. newest stored entry)
    pub fn starting_after(last: Option<DateTime<Utc>>) -> Self {
        Self {
            last_micros: Mutex::new(last.map(|t| t.timestamp_micros()).unwrap_or(0)),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let mut last = self
            .last_micros
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = Utc::now().timestamp_micros().max(*last + 1);
        *last = next;
        DateTime::from_timestamp_micros(next).unwrap_or_else(Utc::now)
    }
}
