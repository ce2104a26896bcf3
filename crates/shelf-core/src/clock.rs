//! # Clock
//!
//! Time source for the timestamp-derived barcode fallbacks.
//!
//! Production code uses [`SystemClock`]; tests pin time with a fixed clock so
//! fallback codes are predictable.

use chrono::{DateTime, Utc};

/// Provides the current time.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds since the Unix epoch, clamped at zero.
    fn now_millis(&self) -> u64 {
        u64::try_from(self.now().timestamp_millis()).unwrap_or(0)
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
