//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [armed] key=doc:42 window=5000ms
//! [coalesced] key=doc:42
//! [dropped] key=doc:42
//! [dispatched] key=doc:42 worker=7
//! [queued] key=doc:42
//! [completed] key=doc:42 worker=7
//! [failed] key=doc:42 worker=8 err="io error"
//! [scheduler-started]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Not intended for production use -
/// implement a custom [`Subscribe`] for structured logging or metrics
/// collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TriggerArmed => {
                println!(
                    "[armed] key={:?} window={:?}ms",
                    e.key,
                    e.delay_ms.unwrap_or(0)
                );
            }
            EventKind::TriggerCoalesced => {
                println!("[coalesced] key={:?}", e.key);
            }
            EventKind::TriggerDropped => {
                println!("[dropped] key={:?}", e.key);
            }
            EventKind::TriggerCancelled => {
                println!("[cancelled] key={:?}", e.key);
            }
            EventKind::ActionDispatched => {
                println!("[dispatched] key={:?} worker={:?}", e.key, e.worker);
            }
            EventKind::ActionQueued => {
                println!("[queued] key={:?}", e.key);
            }
            EventKind::ActionCompleted => {
                println!("[completed] key={:?} worker={:?}", e.key, e.worker);
            }
            EventKind::ActionFailed => {
                println!(
                    "[failed] key={:?} worker={:?} err={:?}",
                    e.key, e.worker, e.reason
                );
            }
            EventKind::ActionPanicked => {
                println!(
                    "[panicked] key={:?} worker={:?} info={:?}",
                    e.key, e.worker, e.reason
                );
            }
            EventKind::SchedulerStarted => {
                println!("[scheduler-started]");
            }
            EventKind::SchedulerStopped => {
                println!("[scheduler-stopped]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] sub={:?} reason={:?}", e.key, e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
