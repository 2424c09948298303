//! # burstgate
//!
//! **Burstgate** is a keyed, time-driven call-coalescing scheduler for Rust.
//!
//! Given a stream of trigger requests tagged with an arbitrary key, it
//! decides which underlying actions actually run and when, according to
//! one of four coalescing policies. It guarantees at most one
//! concurrently running action per key, queues a pending re-run if a new
//! trigger arrives while the key's action is still executing, and exposes
//! cancellation and introspection of in-flight work.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     apply(k,f,t)   immediate(k,f,t)   immediate2(k,f,t)   delay(k,f,t)   cancel(k)
//!          │               │                   │                 │             │
//!          └───────────────┴───────── commands (FIFO) ───────────┴─────────────┘
//!                                          ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Engine (single-owner control loop)                               │
//! │  - Key State Table (key → PendingEvent)                           │
//! │  - Pending Index (deadline → keys, time-ordered)                  │
//! │  - periodic tick drains due deadlines, deadline-ascending         │
//! │  - CoalescePolicy decides arm / coalesce / drop / dispatch        │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  WorkerTable (per-key single-flight)                              │
//! │  - one run at a time per key; trailing run coalesces the rest     │
//! │  - worker_handle(k) exposes the in-flight run's identity          │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//!                        Bus (broadcast channel)
//!                                │
//!                    subscriber listener (in Scheduler)
//!                                ▼
//!                          SubscriberSet
//!                     ┌─────────┼─────────┐
//!                     ▼         ▼         ▼
//!                  sub1.on   sub2.on   subN.on
//!                  _event()  _event()  _event()
//! ```
//!
//! ### Policies
//! ```text
//! apply       trailing edge: burst → one run of the LAST action, t after the FIRST call
//! immediate   leading + trailing: first runs now, last runs at the window's end
//! immediate2  leading only: first runs now, the rest of the window is dropped
//! delay       quiescence: deadline resets per call; fires once activity stops for t
//! ```
//!
//! ## Features
//! | Area               | Description                                                        | Key types / traits                    |
//! |--------------------|--------------------------------------------------------------------|---------------------------------------|
//! | **Trigger ops**    | Coalesce bursts per key under one of four policies.                | [`Scheduler`], [`CoalescePolicy`]     |
//! | **Single-flight**  | Never two overlapping runs per key; trailing run coalescing.       | [`WorkerHandle`]                      |
//! | **Actions**        | Fire-and-forget async units, closures or named-call impls.         | [`Action`], [`ActionFn`], [`ActionRef`] |
//! | **Subscriber API** | Hook into engine events (logging, metrics, custom subscribers).    | [`Subscribe`], [`SubscriberSet`]      |
//! | **Errors**         | Typed errors for the engine boundary and action runs.              | [`SchedulerError`], [`ActionError`]   |
//! | **Configuration**  | Centralize tick, default window, grace period.                     | [`Config`]                            |
//! | **Time source**    | Injected monotonic millisecond clock.                              | [`Clock`], [`MonotonicClock`]         |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//! use burstgate::{ActionFn, Config, Scheduler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.default_timeout = Duration::from_millis(200);
//!
//!     let sched = Scheduler::new(cfg, Vec::new());
//!     sched.start()?;
//!
//!     let saves = Arc::new(AtomicU32::new(0));
//!     for _ in 0..10 {
//!         let saves = saves.clone();
//!         // Ten rapid-fire triggers, one trailing save.
//!         sched.apply(
//!             "doc:42",
//!             ActionFn::arc(move || {
//!                 let saves = saves.clone();
//!                 async move {
//!                     saves.fetch_add(1, Ordering::SeqCst);
//!                     Ok(())
//!                 }
//!             }),
//!             None,
//!         )?;
//!     }
//!
//!     tokio::time::sleep(Duration::from_millis(400)).await;
//!     assert_eq!(saves.load(Ordering::SeqCst), 1);
//!
//!     sched.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod actions;
mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use actions::{Action, ActionFn, ActionRef};
pub use config::Config;
pub use crate::core::{Clock, MonotonicClock, Scheduler, WorkerHandle};
pub use error::{ActionError, SchedulerError};
pub use events::{Bus, Event, EventKind};
pub use policies::{Absorption, CoalescePolicy, FireOutcome, PendingEvent, TriggerOutcome};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
