//! # Engine: the single-owner control loop.
//!
//! One task owns the [`ScheduleTable`] (key state table + pending index)
//! and serializes every mutation against it: trigger commands arrive on
//! an mpsc channel, and a periodic tick drains due deadlines. No two
//! state transitions ever interleave.
//!
//! ## Architecture
//! ```text
//! Scheduler handle ── Command ──► mpsc ──► Engine::run()
//!                                            │
//!                         ┌──────────────────┤
//!                         ▼                  ▼
//!                  handle(Command)      tick: fire_due()
//!                         │                  │
//!                         └── policies ──────┘
//!                                │
//!                                ▼
//!                     WorkerTable::dispatch  (single-flight)
//! ```
//!
//! ## Rules
//! - Commands are processed in arrival order (per-sender FIFO).
//! - Each tick drains *all* due buckets, deadline-ascending, until the
//!   minimum deadline is in the future.
//! - A fault in one key's firing step never aborts the rest of a tick:
//!   policy transitions are pure and dispatch only spawns.

use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::actions::ActionRef;
use crate::core::clock::Clock;
use crate::core::state::ScheduleTable;
use crate::core::workers::WorkerTable;
use crate::events::{Bus, Event, EventKind};
use crate::policies::{self, Absorption, CoalescePolicy};

/// Messages accepted by the control loop.
pub(crate) enum Command {
    /// Absorb one trigger under the given policy.
    Trigger {
        policy: CoalescePolicy,
        key: Arc<str>,
        action: ActionRef,
        timeout: Duration,
    },
    /// Suppress the key's pending action, if any.
    Cancel { key: Arc<str> },
    /// Snapshot of keys with an outstanding timer.
    PendingKeys { reply: oneshot::Sender<Vec<String>> },
}

/// Control loop state. Constructed by the scheduler on `start()` and
/// consumed by [`Engine::run`].
pub(crate) struct Engine {
    pub(crate) table: ScheduleTable,
    pub(crate) workers: Arc<WorkerTable>,
    pub(crate) bus: Bus,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) rx: mpsc::UnboundedReceiver<Command>,
    pub(crate) tick: Duration,
}

impl Engine {
    /// Runs until the token is cancelled or every sender is dropped.
    pub(crate) async fn run(mut self, token: CancellationToken) {
        self.bus.publish(Event::now(EventKind::SchedulerStarted));
        let mut ticker = tokio::time::interval(self.tick);

        loop {
            select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => self.fire_due().await,
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
            }
        }

        self.bus.publish(Event::now(EventKind::SchedulerStopped));
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Trigger {
                policy,
                key,
                action,
                timeout,
            } => self.on_trigger(policy, key, action, timeout).await,
            Command::Cancel { key } => self.on_cancel(&key),
            Command::PendingKeys { reply } => {
                let _ = reply.send(self.table.keys());
            }
        }
    }

    /// Runs the policy state machine for one trigger and applies its
    /// side effects (reindexing, events, leading-edge dispatch).
    async fn on_trigger(
        &mut self,
        policy: CoalescePolicy,
        key: Arc<str>,
        action: ActionRef,
        timeout: Duration,
    ) {
        let now = self.clock.now_ms();
        let existing = self.table.take(&key);
        let out = policy.on_trigger(existing, action, now, timeout);

        match out.absorbed {
            Absorption::Armed => {
                let delay = Duration::from_millis(out.record.deadline_ms.saturating_sub(now));
                self.bus.publish(
                    Event::now(EventKind::TriggerArmed)
                        .with_key(key.clone())
                        .with_delay(delay),
                );
            }
            Absorption::Coalesced => {
                self.bus
                    .publish(Event::now(EventKind::TriggerCoalesced).with_key(key.clone()));
            }
            Absorption::Dropped => {
                self.bus
                    .publish(Event::now(EventKind::TriggerDropped).with_key(key.clone()));
            }
        }

        self.table.insert(key.clone(), out.record);
        if let Some(f) = out.dispatch {
            self.workers.dispatch(key, f, &self.bus).await;
        }
    }

    /// Suppresses a not-yet-fired pending action. Unknown keys are a
    /// no-op; a running action is unaffected (no preemption).
    fn on_cancel(&mut self, key: &Arc<str>) {
        if let Some(rec) = self.table.take(key) {
            let had_action = !rec.is_suppressed();
            if let Some(kept) = policies::on_cancel(rec) {
                self.table.insert(key.clone(), kept);
            }
            if had_action {
                self.bus
                    .publish(Event::now(EventKind::TriggerCancelled).with_key(key.clone()));
            }
        }
    }

    /// Drains every due bucket, firing each key's record, until the
    /// minimum deadline is in the future. Successor records inserted
    /// while draining (recurring gates) are re-examined in the same
    /// pass if they are somehow already due.
    async fn fire_due(&mut self) {
        let now = self.clock.now_ms();
        loop {
            let due = self.table.pop_due(now);
            if due.is_empty() {
                break;
            }
            for (key, rec) in due {
                let out = policies::on_fire(rec);
                if let Some(next) = out.next {
                    self.table.insert(key.clone(), next);
                }
                if let Some(f) = out.dispatch {
                    self.workers.dispatch(key, f, &self.bus).await;
                }
            }
        }
    }
}
