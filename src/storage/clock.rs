//! Time Source
//!
//! Decay settlement only needs "now" in microseconds. The engine reads it
//! through the [`Clock`] trait so tests can drive time by hand instead of
//! sleeping.
//!
//! Clock rollback is not handled here; settlement clamps negative elapsed
//! time to zero instead.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of absolute time in microseconds since the Unix epoch.
pub trait Clock: Send + Sync + Debug {
    fn now_micros(&self) -> i64;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_micros(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a clock reading `start_micros`.
    pub fn new(start_micros: i64) -> Self {
        Self {
            now: AtomicI64::new(start_micros),
        }
    }

    /// Jumps to an absolute time.
    pub fn set(&self, micros: i64) {
        self.now.store(micros, Ordering::SeqCst);
    }

    /// Moves the clock forward and returns the new reading.
    pub fn advance(&self, micros: i64) -> i64 {
        self.now.fetch_add(micros, Ordering::SeqCst) + micros
    }
}

impl Clock for ManualClock {
    fn now_micros(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Returns the current wall-clock time in microseconds.
pub fn now_micros() -> i64 {
    SystemClock.now_micros()
}
