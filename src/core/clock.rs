//! # Injected monotonic time source.
//!
//! The engine never reads wall-clock time for scheduling decisions; it
//! consumes a [`Clock`] that reports milliseconds on a monotonic axis.
//! [`MonotonicClock`] is the default implementation, built on
//! [`tokio::time::Instant`] so paused virtual time in tests drives the
//! engine deterministically.

use tokio::time::Instant;

/// Monotonic millisecond time source.
///
/// Implementations must be monotonic (never go backwards); the absolute
/// origin is irrelevant, only differences matter.
pub trait Clock: Send + Sync + 'static {
    /// Current time in milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;
}

/// Default clock: milliseconds elapsed since construction.
///
/// Uses [`tokio::time::Instant`], which respects `tokio::time::pause`,
/// so engine tests can advance time virtually.
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Creates a clock with its origin at the current instant.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}
