//! Time-related utilities with clock abstraction for testability.

use std::sync::Mutex;

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get the current instant in UTC
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for testing
///
/// Returns the same instant until [`FixedClock::advance`] is called.
#[derive(Debug)]
pub struct FixedClock {
    fixed_time: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a new fixed clock at the given instant
    pub fn new(fixed_time: DateTime<Utc>) -> Self {
        Self {
            fixed_time: Mutex::new(fixed_time),
        }
    }

    /// Create a new fixed clock from Unix milliseconds
    pub fn from_millis(fixed_time_millis: i64) -> Self {
        let fixed_time = Utc
            .timestamp_millis_opt(fixed_time_millis)
            .single()
            .unwrap_or_default();
        Self::new(fixed_time)
    }

    /// Move the clock forward by `duration`
    pub fn advance(&self, duration: Duration) {
        let mut guard = self.fixed_time.lock().unwrap_or_else(|e| e.into_inner());
        *guard += duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.fixed_time.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Format an instant as RFC 3339 with millisecond precision (e.g. `2026-10-17T12:00:00.000Z`)
pub fn to_rfc3339_millis(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Truncate an instant to the start of its fixed-width window
///
/// Windows are aligned on the Unix epoch. A zero `window_seconds` is treated as one second.
pub fn truncate_to_window(instant: DateTime<Utc>, window_seconds: u32) -> DateTime<Utc> {
    let window = i64::from(window_seconds.max(1));
    let start = instant.timestamp().div_euclid(window) * window;
    Utc.timestamp_opt(start, 0).single().unwrap_or(instant)
}
