//! Coalescing policies.
//!
//! This module groups the pure decision logic that controls **which**
//! trigger in a burst actually runs and **when**.
//!
//! ## Contents
//! - [`CoalescePolicy`] the four coalescing flavors (apply / immediate / immediate2 / delay)
//! - [`PendingEvent`] the per-key pending record the policies operate on
//! - [`on_fire`] / [`on_cancel`] transitions driven by the scheduler loop and `cancel`
//!
//! ## Quick wiring
//! ```text
//! trigger(k, f, t) ──► CoalescePolicy::on_trigger(existing, f, now, t)
//!                           └─► TriggerOutcome { record, dispatch, absorbed }
//! tick, now ≥ deadline ──► on_fire(record)
//!                           └─► FireOutcome { dispatch, next }
//! cancel(k)           ──► on_cancel(record) → Option<PendingEvent>
//! ```
//!
//! Everything here is pure: no clocks, no channels, no spawning. The
//! engine in `core::engine` owns the side effects.

mod policy;

pub use policy::{
    Absorption, CoalescePolicy, FireOutcome, PendingEvent, TriggerOutcome, on_cancel, on_fire,
};
