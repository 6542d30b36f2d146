//! Monotonic time sources for lease expiry and queue bookkeeping.
//!
//! All lease arithmetic goes through a [`LeaseClock`] so that wall-clock
//! adjustments never shorten or extend a granted lease. Production code uses
//! [`MonotonicClock`]; tests drive a [`ManualClock`] forward explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of monotonic timestamps.
pub trait LeaseClock: Send + Sync {
    /// The current instant. Successive calls never go backwards.
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl LeaseClock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
///
/// Time starts at the instant the clock was created and advances by whole
/// milliseconds through [`ManualClock::advance`].
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            origin: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    /// Move the clock forward by `by` (sub-millisecond remainders are dropped).
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Total time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl LeaseClock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}
