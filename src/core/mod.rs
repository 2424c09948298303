//! Runtime core: the scheduling engine and its lifecycle.
//!
//! This module contains the embedded implementation of the burstgate
//! runtime. The public API from this module is [`Scheduler`], plus the
//! [`Clock`] seam and the [`WorkerHandle`] introspection type.
//!
//! Internal modules:
//! - [`clock`]: injected monotonic millisecond time source;
//! - [`state`]: key state table + time-ordered pending index;
//! - [`engine`]: single-owner control loop (commands + periodic tick);
//! - [`dispatch`]: executes one run with fault isolation and event publishing;
//! - [`workers`]: per-key single-flight table with trailing-run coalescing;
//! - [`scheduler`]: public handle (lifecycle, trigger ops, introspection).

mod clock;
mod dispatch;
mod engine;
mod scheduler;
mod state;
mod workers;

pub use clock::{Clock, MonotonicClock};
pub use scheduler::Scheduler;
pub use workers::WorkerHandle;
