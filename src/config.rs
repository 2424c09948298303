//! # Global scheduler configuration.
//!
//! Provides [`Config`] centralized settings for the scheduling engine.
//!
//! Config is consumed once at [`Scheduler::new`](crate::Scheduler::new);
//! per-call timeouts may override [`Config::default_timeout`] on each
//! trigger operation.
//!
//! ## Field semantics
//! - `tick`: resolution of the scheduler loop; due deadlines are fired on
//!   the first tick at or after the deadline
//! - `default_timeout`: coalescing window used when a trigger omits one
//! - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
//! - `grace`: maximum wait for in-flight actions during `shutdown()`

use std::time::Duration;

/// Global configuration for the scheduling engine.
///
/// Defines:
/// - **Timing**: tick resolution and the default coalescing window
/// - **Event system**: bus capacity for event delivery
/// - **Shutdown behavior**: grace period for in-flight actions
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to
/// avoid sprinkling clamping logic across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Scheduler loop resolution.
    ///
    /// Every `tick` the engine drains all deadlines that have become due,
    /// so a fire can be observed up to one tick after its deadline.
    /// Independent of any individual trigger's timeout.
    pub tick: Duration,

    /// Default coalescing window applied when a trigger call passes
    /// `None` as its timeout.
    pub default_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// will receive `Lagged` and skip older items. Minimum value is 1
    /// (enforced by Bus).
    pub bus_capacity: usize,

    /// Maximum time to wait for in-flight actions during shutdown.
    ///
    /// When `shutdown()` is called:
    /// - The control loop stops; no further firings occur
    /// - The scheduler waits up to `grace` for running actions to finish
    /// - If the wait times out, returns `SchedulerError::GraceExceeded`
    pub grace: Duration,
}

impl Config {
    /// Returns the tick resolution clamped to a minimum of 1ms.
    ///
    /// A zero interval would spin the control loop.
    #[inline]
    pub fn tick_clamped(&self) -> Duration {
        self.tick.max(Duration::from_millis(1))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    ///
    /// The `Bus` uses this value to avoid constructing an invalid channel.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `tick = 100ms` (coarse enough to batch, fine enough for second-scale windows)
    /// - `default_timeout = 5s` (reference default window)
    /// - `bus_capacity = 1024` (good baseline)
    /// - `grace = 30s` (reasonable shutdown window)
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            default_timeout: Duration::from_secs(5),
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
        }
    }
}
