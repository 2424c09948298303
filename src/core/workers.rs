//! # Per-key single-flight worker table.
//!
//! [`WorkerTable`] enforces the invariant that no two runs for the same
//! key ever overlap. Each key with an in-flight run owns one entry; a
//! dispatch that finds an entry queues its action as the trailing run
//! instead of starting a second one.
//!
//! ## Architecture
//! ```text
//! dispatch(key, f)
//!     ├─ no entry  ──► register {id, done-token} ──► spawn worker loop
//!     └─ entry     ──► queued := f, repeat := true     (ActionQueued)
//!
//! worker loop (one task per busy key):
//!     run_once(action)
//!     ├─ trailing run queued ──► rotate {id, done-token}, run it next
//!     └─ nothing queued      ──► remove entry, cancel done-token
//! ```
//!
//! ## Rules
//! - In-flight queuing is coalescing, not FIFO: only the most recent
//!   trailing action survives.
//! - A burst of N dispatches against one running key collapses to at
//!   most 2 runs (the one in flight plus one trailing).
//! - Each run has a distinct numeric id; the entry's done-token is
//!   cancelled when that run finishes, which is what
//!   [`WorkerHandle::finished`] awaits.
//! - Worker tasks are tracked by a [`TaskTracker`] so shutdown can wait
//!   for in-flight runs with a grace period.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::actions::ActionRef;
use crate::core::dispatch::run_once;
use crate::events::{Bus, Event, EventKind};

/// Identity of an in-flight run for one key.
///
/// Returned by [`Scheduler::worker_handle`](crate::Scheduler::worker_handle);
/// lets callers and tests synchronize with the run without the engine
/// exposing any other scheduling state.
#[derive(Clone, Debug)]
pub struct WorkerHandle {
    id: u64,
    done: CancellationToken,
}

impl WorkerHandle {
    /// Stable numeric id of this run (distinct across runs, including
    /// the trailing run for the same key).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Completes when this run finishes (success, failure, or panic).
    pub async fn finished(&self) {
        self.done.cancelled().await;
    }

    /// True if this run has already finished.
    pub fn is_finished(&self) -> bool {
        self.done.is_cancelled()
    }
}

/// One busy key's record.
struct WorkerEntry {
    id: u64,
    done: CancellationToken,
    queued: Option<ActionRef>,
    repeat: bool,
}

/// Table of in-flight runs, shared between the engine loop (dispatch)
/// and worker tasks (completion).
pub(crate) struct WorkerTable {
    entries: RwLock<HashMap<Arc<str>, WorkerEntry>>,
    tracker: TaskTracker,
    next_id: AtomicU64,
}

impl WorkerTable {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: RwLock::new(HashMap::new()),
            tracker: TaskTracker::new(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Starts `action` for `key`, or queues it as the trailing run if the
    /// key is already busy.
    pub(crate) async fn dispatch(self: &Arc<Self>, key: Arc<str>, action: ActionRef, bus: &Bus) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(&key) {
            // Coalesce: the latest trailing action wins.
            entry.queued = Some(action);
            entry.repeat = true;
            bus.publish(Event::now(EventKind::ActionQueued).with_key(key));
            return;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            key.clone(),
            WorkerEntry {
                id,
                done: CancellationToken::new(),
                queued: None,
                repeat: false,
            },
        );
        drop(entries);

        let me = Arc::clone(self);
        let bus = bus.clone();
        self.tracker
            .spawn(async move { me.worker_loop(key, id, action, bus).await });
    }

    /// Runs `first` and then any trailing actions queued while it was in
    /// flight, one at a time, until the key goes idle.
    async fn worker_loop(self: Arc<Self>, key: Arc<str>, first_id: u64, first: ActionRef, bus: Bus) {
        let mut id = first_id;
        let mut action = first;

        loop {
            run_once(&key, id, action, &bus).await;

            let next = {
                let mut entries = self.entries.write().await;
                match entries.get_mut(&key) {
                    Some(entry) if entry.repeat => {
                        // Atomically take the trailing action and rotate
                        // the run identity while still holding the entry.
                        entry.repeat = false;
                        let queued = entry.queued.take();
                        entry.done.cancel();
                        entry.id = self.next_id.fetch_add(1, Ordering::Relaxed);
                        entry.done = CancellationToken::new();
                        id = entry.id;
                        queued
                    }
                    _ => {
                        if let Some(entry) = entries.remove(&key) {
                            entry.done.cancel();
                        }
                        None
                    }
                }
            };

            match next {
                Some(a) => action = a,
                None => break,
            }
        }
    }

    /// Returns the in-flight run's identity for `key`, if any.
    pub(crate) async fn handle(&self, key: &str) -> Option<WorkerHandle> {
        let entries = self.entries.read().await;
        entries.get(key).map(|e| WorkerHandle {
            id: e.id,
            done: e.done.clone(),
        })
    }

    /// Sorted list of keys with an in-flight run.
    pub(crate) async fn running_keys(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries.keys().map(|k| k.to_string()).collect();
        keys.sort_unstable();
        keys
    }

    /// Stops accepting new worker tasks and waits for in-flight ones.
    pub(crate) async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
