//! # Runtime events emitted by the scheduling engine and workers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Trigger events**: how an incoming trigger was absorbed (armed, coalesced, dropped, cancelled)
//! - **Execution events**: worker lifecycle (dispatched, queued, completed, failed, panicked)
//! - **Lifecycle events**: engine start/stop and shutdown grace outcome
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! the affected key, failure reasons, and scheduling delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use burstgate::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::TriggerArmed)
//!     .with_key("user:42")
//!     .with_delay(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::TriggerArmed);
//! assert_eq!(ev.key.as_deref(), Some("user:42"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Trigger events ===
    /// A trigger created a new pending record and armed its deadline.
    ///
    /// Sets:
    /// - `key`: coalescing key
    /// - `delay_ms`: window until the deadline
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TriggerArmed,

    /// A trigger was absorbed into an existing pending record
    /// (its action replaced the pending slot; deadline untouched).
    ///
    /// Sets:
    /// - `key`: coalescing key
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TriggerCoalesced,

    /// A trigger was dropped inside an `immediate2` gate window.
    ///
    /// Sets:
    /// - `key`: coalescing key
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TriggerDropped,

    /// A pending, not-yet-fired action was suppressed by `cancel`.
    ///
    /// Sets:
    /// - `key`: coalescing key
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TriggerCancelled,

    // === Execution events ===
    /// An action started executing (leading edge or fired deadline).
    ///
    /// Sets:
    /// - `key`: coalescing key
    /// - `worker`: numeric id of the run
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ActionDispatched,

    /// An action arrived while the key's previous action was still
    /// running; it was queued as the trailing run (replacing any
    /// previously queued action for the key).
    ///
    /// Sets:
    /// - `key`: coalescing key
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ActionQueued,

    /// A run finished successfully.
    ///
    /// Sets:
    /// - `key`: coalescing key
    /// - `worker`: numeric id of the run
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ActionCompleted,

    /// A run returned an error. The failure is isolated to that run.
    ///
    /// Sets:
    /// - `key`: coalescing key
    /// - `worker`: numeric id of the run
    /// - `reason`: error message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ActionFailed,

    /// A run panicked. The panic is caught; engine state is unaffected.
    ///
    /// Sets:
    /// - `key`: coalescing key
    /// - `worker`: numeric id of the run
    /// - `reason`: panic info
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ActionPanicked,

    // === Lifecycle events ===
    /// The control loop started.
    SchedulerStarted,

    /// The control loop stopped (shutdown requested).
    SchedulerStopped,

    /// Shutdown grace period exceeded; some actions were still running.
    GraceExceeded,

    /// A subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `key`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Coalescing key (or subscriber name for overflow events).
    pub key: Option<Arc<str>>,
    /// Numeric id of the worker run, if applicable.
    pub worker: Option<u64>,
    /// Delay until the armed deadline, in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, panic info, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and
    /// next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            key: None,
            worker: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a coalescing key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a worker run id.
    #[inline]
    pub fn with_worker(mut self, id: u64) -> Self {
        self.worker = Some(id);
        self
    }

    /// Attaches a scheduling delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_key(subscriber)
            .with_reason(reason)
    }
}
