//! # Run a single action with fault isolation and event reporting.
//!
//! This helper drives one execution of an [`Action`], publishing
//! lifecycle [`Event`]s to the [`Bus`] and containing both application
//! errors and panics so they never reach engine state.
//!
//! ```text
//!   ┌────────────┐
//!   │   Action   │
//!   └──────┬─────┘
//!      run_once()
//!          ▼
//!  catch_unwind ──► Ok(Ok)   ──► ActionCompleted
//!               ──► Ok(Err)  ──► ActionFailed
//!               ──► Err(panic) ─► ActionPanicked
//! ```
//!
//! The engine surfaces no result to trigger callers — actions are
//! fire-and-forget, and the events above are the only observable outcome.

use std::sync::Arc;

use futures::FutureExt;

use crate::actions::ActionRef;
use crate::events::{Bus, Event, EventKind};

/// Executes a single run of an action.
///
/// Publishes `ActionDispatched` before the run and exactly one of
/// `ActionCompleted` / `ActionFailed` / `ActionPanicked` after it.
pub(crate) async fn run_once(key: &Arc<str>, id: u64, action: ActionRef, bus: &Bus) {
    bus.publish(
        Event::now(EventKind::ActionDispatched)
            .with_key(key.clone())
            .with_worker(id),
    );

    let fut = async move { action.run().await };
    match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => {
            bus.publish(
                Event::now(EventKind::ActionCompleted)
                    .with_key(key.clone())
                    .with_worker(id),
            );
        }
        Ok(Err(e)) => {
            bus.publish(
                Event::now(EventKind::ActionFailed)
                    .with_key(key.clone())
                    .with_worker(id)
                    .with_reason(e.to_string()),
            );
        }
        Err(panic_err) => {
            bus.publish(
                Event::now(EventKind::ActionPanicked)
                    .with_key(key.clone())
                    .with_worker(id)
                    .with_reason(format!("{panic_err:?}")),
            );
        }
    }
}
