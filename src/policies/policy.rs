//! # Coalescing policy state machine.
//!
//! [`CoalescePolicy`] decides how a burst of triggers for one key
//! collapses into actual executions. All four flavors share one pending
//! record shape, [`PendingEvent`]; they differ only in how a trigger
//! mutates it and whether the leading edge dispatches immediately.
//!
//! ## Transition table
//! `S` = current pending record for the key, `f` = incoming action, `t` = window:
//!
//! ```text
//! policy      | S absent                        | S suppressed (slot empty)   | S slot full
//! ------------+---------------------------------+-----------------------------+---------------------------
//! apply       | arm {now+t, f, repeat=t}        | slot := f (deadline kept)   | slot := f (deadline kept)
//! immediate   | dispatch f; arm {now+t, ∅, t}   | slot := f (deadline kept)   | slot := f (deadline kept)
//! immediate2  | dispatch f; arm {now+t, ∅, t}   | drop trigger                | drop trigger, slot := ∅
//! delay       | arm {now+t, f, repeat=∅}        | re-arm {now+t, f, ∅}        | re-arm {now+t, f, ∅}
//! ```
//!
//! ## Firing
//! When the scheduler loop finds `now ≥ deadline`:
//! - recurring gate (`repeat = Some(t)`): dispatch the slot if full, then
//!   reinsert a suppressed record at `deadline + t` — phase-aligned to the
//!   fired deadline, not to dispatch time, so long-run windows do not drift;
//! - single-shot (`repeat = None`, the `delay` family): dispatch the slot
//!   if full and delete the record either way.
//!
//! ## Why `apply` never dispatches on first call
//! It coalesces a burst into exactly one trailing call per window; the
//! first call only arms the timer. `immediate`/`immediate2` dispatch the
//! leading edge and differ in whether a trailing dispatch also occurs
//! (`immediate`) or is dropped (`immediate2`). `delay` resets its
//! deadline on every call, so it fires only after activity has fully
//! quiesced — it has no bounded latency guarantee.

use std::time::Duration;

use crate::actions::ActionRef;

/// Per-key pending record: one outstanding timer plus its payload.
///
/// - `action = None` means "suppressed": the timer exists purely to gate
///   future triggers (after an `immediate`/`immediate2` leading edge, or
///   after `cancel`).
/// - `repeat = Some(t)` marks a recurring gate (`apply`/`immediate`/
///   `immediate2`); `repeat = None` marks the single-shot `delay` family.
#[derive(Clone)]
pub struct PendingEvent {
    /// Absolute deadline on the engine's monotonic clock, in milliseconds.
    pub deadline_ms: u64,
    /// Pending action, or `None` for a suppressed gate.
    pub action: Option<ActionRef>,
    /// Recurrence window; `None` for single-shot records.
    pub repeat: Option<Duration>,
}

impl PendingEvent {
    /// True if the record is a pure gate with nothing to run.
    #[inline]
    pub fn is_suppressed(&self) -> bool {
        self.action.is_none()
    }
}

/// The four coalescing flavors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoalescePolicy {
    /// Trailing edge only: one execution per window, using the latest action.
    Apply,
    /// Leading and trailing edge: first trigger runs now, latest trigger
    /// runs at the window's end.
    Immediate,
    /// Leading edge only: first trigger runs now, the rest of the window
    /// is dropped.
    Immediate2,
    /// Quiescence debounce: deadline resets on every trigger; fires once
    /// activity stops for a full window.
    Delay,
}

/// How a trigger was absorbed; drives event reporting, nothing else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Absorption {
    /// A new record was created (or re-armed, for `delay`).
    Armed,
    /// The trigger replaced the pending action slot of an existing record.
    Coalesced,
    /// The trigger was discarded (`immediate2` inside a gate window).
    Dropped,
}

/// Result of absorbing one trigger.
pub struct TriggerOutcome {
    /// The key's new pending record (always present after a trigger).
    pub record: PendingEvent,
    /// Action to start right now (leading edge), if any.
    pub dispatch: Option<ActionRef>,
    /// How the trigger was absorbed (for events).
    pub absorbed: Absorption,
}

/// Result of a deadline firing.
pub struct FireOutcome {
    /// Action to start now, if the slot was full.
    pub dispatch: Option<ActionRef>,
    /// Suppressed successor record for recurring gates; `None` deletes the key.
    pub next: Option<PendingEvent>,
}

impl CoalescePolicy {
    /// Absorbs one trigger into the key's current state.
    ///
    /// Pure: computes the new record and the leading-edge dispatch (if
    /// any); the caller owns clocks, indexing, and actually running
    /// things.
    pub fn on_trigger(
        self,
        existing: Option<PendingEvent>,
        action: ActionRef,
        now_ms: u64,
        timeout: Duration,
    ) -> TriggerOutcome {
        let timeout_ms = timeout.as_millis() as u64;

        match self {
            CoalescePolicy::Apply => match existing {
                None => TriggerOutcome {
                    record: PendingEvent {
                        deadline_ms: now_ms + timeout_ms,
                        action: Some(action),
                        repeat: Some(timeout),
                    },
                    dispatch: None,
                    absorbed: Absorption::Armed,
                },
                Some(mut rec) => {
                    rec.action = Some(action);
                    TriggerOutcome {
                        record: rec,
                        dispatch: None,
                        absorbed: Absorption::Coalesced,
                    }
                }
            },
            CoalescePolicy::Immediate => match existing {
                None => TriggerOutcome {
                    record: PendingEvent {
                        deadline_ms: now_ms + timeout_ms,
                        action: None,
                        repeat: Some(timeout),
                    },
                    dispatch: Some(action),
                    absorbed: Absorption::Armed,
                },
                Some(mut rec) => {
                    rec.action = Some(action);
                    TriggerOutcome {
                        record: rec,
                        dispatch: None,
                        absorbed: Absorption::Coalesced,
                    }
                }
            },
            CoalescePolicy::Immediate2 => match existing {
                None => TriggerOutcome {
                    record: PendingEvent {
                        deadline_ms: now_ms + timeout_ms,
                        action: None,
                        repeat: Some(timeout),
                    },
                    dispatch: Some(action),
                    absorbed: Absorption::Armed,
                },
                Some(mut rec) => {
                    // Inside the gate window every trigger is dropped,
                    // and any pending slot is forced empty as well.
                    rec.action = None;
                    TriggerOutcome {
                        record: rec,
                        dispatch: None,
                        absorbed: Absorption::Dropped,
                    }
                }
            },
            CoalescePolicy::Delay => TriggerOutcome {
                record: PendingEvent {
                    deadline_ms: now_ms + timeout_ms,
                    action: Some(action),
                    repeat: None,
                },
                dispatch: None,
                absorbed: Absorption::Armed,
            },
        }
    }
}

/// Advances a due record past its deadline.
///
/// Recurring gates reinsert a suppressed successor at `deadline + repeat`
/// (phase-aligned; see module docs). Single-shot records are deleted.
pub fn on_fire(record: PendingEvent) -> FireOutcome {
    match record.repeat {
        Some(repeat) => {
            if record.action.is_some() {
                let next = PendingEvent {
                    deadline_ms: record.deadline_ms + repeat.as_millis() as u64,
                    action: None,
                    repeat: Some(repeat),
                };
                FireOutcome {
                    dispatch: record.action,
                    next: Some(next),
                }
            } else {
                // Gate expired with nothing queued behind it.
                FireOutcome {
                    dispatch: None,
                    next: None,
                }
            }
        }
        None => FireOutcome {
            dispatch: record.action,
            next: None,
        },
    }
}

/// Suppresses a not-yet-fired pending action.
///
/// Recurring gates keep their timer (deadline and repeat untouched) so
/// the window still gates future triggers; single-shot records are
/// removed outright — no firing occurs.
pub fn on_cancel(record: PendingEvent) -> Option<PendingEvent> {
    match record.repeat {
        Some(_) => Some(PendingEvent {
            action: None,
            ..record
        }),
        None => None,
    }
}
