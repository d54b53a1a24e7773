//! Clock Abstraction
//!
//! Every time-based rule (request timeout, daily submission window) goes
//! through [`Clock`] instead of calling `Utc::now()` directly, so the rules
//! are testable with a controlled clock.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Time source for age comparisons and daily windows
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Start of the current UTC calendar day
    ///
    /// Used for the rolling-calendar-day submission cap.
    fn start_of_day(&self) -> DateTime<Utc> {
        let now = self.now();
        now.date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time")
            .and_utc()
    }
}

/// Wall-clock implementation used in production
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually controlled clock for tests
///
/// Starts at a fixed instant; `advance`/`set` move it.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock lock poisoned") = now;
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut guard = self.now.lock().expect("clock lock poisoned");
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}
