//! # Scheduler: public handle over the coalescing engine.
//!
//! The [`Scheduler`] owns the event bus, a [`SubscriberSet`], and the
//! worker table. `start()` spawns the control loop; the four trigger
//! operations, `cancel`, and the introspection calls talk to it over a
//! command channel.
//!
//! ## Key responsibilities
//! - validate trigger calls at the boundary (timeout, lifecycle)
//! - forward commands to the engine in arrival order
//! - fan out engine events to subscribers via [`SubscriberSet`]
//! - perform graceful shutdown with a configurable [`Config::grace`]
//!
//! ## High-level architecture
//! ```text
//! apply/immediate/immediate2/delay/cancel
//!       │ (validated, FIFO)
//!       ▼
//!   mpsc ──► Engine loop ──► policies ──► WorkerTable ──► worker tasks
//!                │                                             │
//!                └────────────► Bus ◄──────────────────────────┘
//!                                │
//!                   subscriber listener ──► SubscriberSet ──► Subscribe impls
//!
//! Shutdown path:
//!   shutdown():
//!     ├─ cancel control-loop token (no further firings)
//!     └─ wait for in-flight workers up to cfg.grace
//!          ├─ Ok            → Ok(())
//!          └─ still busy    → Bus.publish(GraceExceeded),
//!                             Err(SchedulerError::GraceExceeded { busy })
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use burstgate::{ActionFn, Config, Scheduler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sched = Scheduler::new(Config::default(), Vec::new());
//!     sched.start()?;
//!
//!     // Collapse a burst of saves into one trailing write per 5s window.
//!     sched.apply(
//!         "doc:42",
//!         ActionFn::arc(|| async {
//!             // persist...
//!             Ok(())
//!         }),
//!         Some(Duration::from_secs(5)),
//!     )?;
//!
//!     sched.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::actions::ActionRef;
use crate::config::Config;
use crate::core::clock::{Clock, MonotonicClock};
use crate::core::engine::{Command, Engine};
use crate::core::state::ScheduleTable;
use crate::core::workers::{WorkerHandle, WorkerTable};
use crate::error::SchedulerError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::CoalescePolicy;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Lifecycle state guarded by a plain mutex (held only for field access).
struct Lifecycle {
    tx: Option<mpsc::UnboundedSender<Command>>,
    token: Option<CancellationToken>,
    started: bool,
}

/// Coordinates the coalescing engine, worker dispatch, and event delivery.
///
/// All coalescing and single-flight guarantees are scoped by the opaque
/// key: different call sites sharing a key coalesce together.
pub struct Scheduler {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    workers: Arc<WorkerTable>,
    clock: Arc<dyn Clock>,
    lifecycle: Mutex<Lifecycle>,
}

impl Scheduler {
    /// Creates a new scheduler with the given config and subscribers.
    ///
    /// Nothing runs until [`Scheduler::start`] is called.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self::with_clock(cfg, subscribers, Arc::new(MonotonicClock::new()))
    }

    /// Creates a scheduler with an injected time source.
    pub fn with_clock(
        cfg: Config,
        subscribers: Vec<Arc<dyn Subscribe>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
        Self {
            cfg,
            bus,
            subs,
            workers: WorkerTable::new(),
            clock,
            lifecycle: Mutex::new(Lifecycle {
                tx: None,
                token: None,
                started: false,
            }),
        }
    }

    /// Spawns the control loop and the subscriber listener.
    ///
    /// A scheduler is started at most once; a second call (even after
    /// `shutdown()`) returns [`SchedulerError::AlreadyStarted`].
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut lc = self.lifecycle.lock().expect("lifecycle mutex poisoned");
        if lc.started {
            return Err(SchedulerError::AlreadyStarted);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        let engine = Engine {
            table: ScheduleTable::new(),
            workers: Arc::clone(&self.workers),
            bus: self.bus.clone(),
            clock: Arc::clone(&self.clock),
            rx,
            tick: self.cfg.tick_clamped(),
        };
        tokio::spawn(engine.run(token.clone()));
        self.spawn_subscriber_listener();

        lc.tx = Some(tx);
        lc.token = Some(token);
        lc.started = true;
        Ok(())
    }

    /// Trailing edge only: coalesces a burst into one execution per
    /// window, using the latest action, `timeout` after the first call.
    pub fn apply(
        &self,
        key: impl Into<Arc<str>>,
        action: ActionRef,
        timeout: Option<Duration>,
    ) -> Result<(), SchedulerError> {
        self.trigger(CoalescePolicy::Apply, key.into(), action, timeout)
    }

    /// Leading and trailing edge: the first trigger of a burst runs
    /// immediately, the latest action also runs when the window closes.
    pub fn immediate(
        &self,
        key: impl Into<Arc<str>>,
        action: ActionRef,
        timeout: Option<Duration>,
    ) -> Result<(), SchedulerError> {
        self.trigger(CoalescePolicy::Immediate, key.into(), action, timeout)
    }

    /// Leading edge only: the first trigger of a burst runs immediately;
    /// every further trigger inside the window is dropped.
    pub fn immediate2(
        &self,
        key: impl Into<Arc<str>>,
        action: ActionRef,
        timeout: Option<Duration>,
    ) -> Result<(), SchedulerError> {
        self.trigger(CoalescePolicy::Immediate2, key.into(), action, timeout)
    }

    /// Quiescence debounce: the deadline resets on every call, so the
    /// latest action runs once activity stops for a full window. No
    /// bounded latency guarantee.
    pub fn delay(
        &self,
        key: impl Into<Arc<str>>,
        action: ActionRef,
        timeout: Option<Duration>,
    ) -> Result<(), SchedulerError> {
        self.trigger(CoalescePolicy::Delay, key.into(), action, timeout)
    }

    /// Suppresses the key's pending, not-yet-fired action.
    ///
    /// Has no effect on an already running action (no preemption), and
    /// is a no-op for unknown keys.
    pub fn cancel(&self, key: impl Into<Arc<str>>) -> Result<(), SchedulerError> {
        self.send(Command::Cancel { key: key.into() })
    }

    /// Returns the identity of the key's in-flight run, if any.
    ///
    /// The handle outlives the table entry: callers can await
    /// [`WorkerHandle::finished`] even after the run completes.
    pub async fn worker_handle(&self, key: &str) -> Option<WorkerHandle> {
        self.workers.handle(key).await
    }

    /// Sorted list of keys with an outstanding timer.
    pub async fn pending_keys(&self) -> Result<Vec<String>, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::PendingKeys { reply })?;
        rx.await.map_err(|_| SchedulerError::NotRunning)
    }

    /// Sorted list of keys with an in-flight run.
    pub async fn running_keys(&self) -> Vec<String> {
        self.workers.running_keys().await
    }

    /// Creates an independent receiver for runtime events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops the control loop and waits for in-flight actions.
    ///
    /// No further firings occur after this returns. If running actions
    /// do not finish within [`Config::grace`], returns
    /// [`SchedulerError::GraceExceeded`] listing the busy keys.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        let (tx, token) = {
            let mut lc = self.lifecycle.lock().expect("lifecycle mutex poisoned");
            (lc.tx.take(), lc.token.take())
        };
        let token = match token {
            Some(t) => t,
            None => return Err(SchedulerError::NotRunning),
        };
        drop(tx);
        token.cancel();

        let grace = self.cfg.grace;
        match tokio::time::timeout(grace, self.workers.wait_idle()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                self.bus.publish(Event::now(EventKind::GraceExceeded));
                let busy = self.workers.running_keys().await;
                Err(SchedulerError::GraceExceeded { grace, busy })
            }
        }
    }

    fn trigger(
        &self,
        policy: CoalescePolicy,
        key: Arc<str>,
        action: ActionRef,
        timeout: Option<Duration>,
    ) -> Result<(), SchedulerError> {
        let timeout = timeout.unwrap_or(self.cfg.default_timeout);
        if timeout.is_zero() {
            return Err(SchedulerError::InvalidTimeout { timeout });
        }
        self.send(Command::Trigger {
            policy,
            key,
            action,
            timeout,
        })
    }

    fn send(&self, cmd: Command) -> Result<(), SchedulerError> {
        let lc = self.lifecycle.lock().expect("lifecycle mutex poisoned");
        match &lc.tx {
            Some(tx) => tx.send(cmd).map_err(|_| SchedulerError::NotRunning),
            None => Err(SchedulerError::NotRunning),
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set
    /// (fire-and-forget). Lagging skips events, it never blocks the bus.
    ///
    /// Runs until the bus closes (when the scheduler is dropped), not
    /// until the control loop stops: `SchedulerStopped`, `GraceExceeded`,
    /// and completions of workers finishing inside the grace window are
    /// all published during shutdown and must still reach subscribers.
    fn spawn_subscriber_listener(&self) {
        if self.subs.is_empty() {
            return;
        }
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => subs.emit(&ev),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionFn;
    use crate::error::ActionError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::sleep;

    const WINDOW: Duration = Duration::from_millis(1000);

    fn test_config() -> Config {
        Config {
            tick: Duration::from_millis(100),
            default_timeout: WINDOW,
            grace: Duration::from_secs(5),
            ..Config::default()
        }
    }

    fn started() -> Scheduler {
        let sched = Scheduler::new(test_config(), Vec::new());
        sched.start().unwrap();
        sched
    }

    /// Action that adds `label` to a shared sum.
    fn adder(sum: Arc<AtomicU32>, label: u32) -> ActionRef {
        ActionFn::arc(move || {
            let sum = sum.clone();
            async move {
                sum.fetch_add(label, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    /// Action that blocks until the token is cancelled.
    fn blocker(gate: CancellationToken, runs: Arc<AtomicU32>) -> ActionRef {
        ActionFn::arc(move || {
            let gate = gate.clone();
            let runs = runs.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                gate.cancelled().await;
                Ok(())
            }
        })
    }

    /// Lets queued commands and spawned workers run without advancing time.
    async fn settle() {
        for _ in 0..25 {
            tokio::task::yield_now().await;
        }
    }

    fn fire(sched: &Scheduler, policy: CoalescePolicy, sum: &Arc<AtomicU32>, label: u32) {
        let action = adder(sum.clone(), label);
        match policy {
            CoalescePolicy::Apply => sched.apply("k", action, Some(WINDOW)),
            CoalescePolicy::Immediate => sched.immediate("k", action, Some(WINDOW)),
            CoalescePolicy::Immediate2 => sched.immediate2("k", action, Some(WINDOW)),
            CoalescePolicy::Delay => sched.delay("k", action, Some(WINDOW)),
        }
        .unwrap();
    }

    /// Regression fixture: triggers at 0, 500, 1300, 2200ms with a
    /// 1000ms window, labels 1..=4.
    async fn run_fixture(policy: CoalescePolicy) -> u32 {
        let sched = started();
        let sum = Arc::new(AtomicU32::new(0));
        settle().await;

        fire(&sched, policy, &sum, 1);
        settle().await;
        sleep(Duration::from_millis(500)).await;
        fire(&sched, policy, &sum, 2);
        settle().await;
        sleep(Duration::from_millis(800)).await;
        fire(&sched, policy, &sum, 3);
        settle().await;
        sleep(Duration::from_millis(900)).await;
        fire(&sched, policy, &sum, 4);
        settle().await;
        sleep(Duration::from_millis(1800)).await;
        settle().await;

        sum.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixture_apply() {
        assert_eq!(run_fixture(CoalescePolicy::Apply).await, 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixture_immediate() {
        assert_eq!(run_fixture(CoalescePolicy::Immediate).await, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixture_immediate2() {
        assert_eq!(run_fixture(CoalescePolicy::Immediate2).await, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixture_delay() {
        assert_eq!(run_fixture(CoalescePolicy::Delay).await, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_single_trigger_fires_once_not_early() {
        let sched = started();
        let sum = Arc::new(AtomicU32::new(0));
        settle().await;

        sched.apply("k", adder(sum.clone(), 1), Some(WINDOW)).unwrap();
        settle().await;

        sleep(Duration::from_millis(900)).await;
        assert_eq!(sum.load(Ordering::SeqCst), 0, "must not fire before the window");

        sleep(Duration::from_millis(300)).await;
        settle().await;
        assert_eq!(sum.load(Ordering::SeqCst), 1);

        // The trailing gate expires silently; nothing fires again.
        sleep(Duration::from_millis(2000)).await;
        settle().await;
        assert_eq!(sum.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_fires_after_quiescence_only() {
        let sched = started();
        let sum = Arc::new(AtomicU32::new(0));
        settle().await;

        for _ in 0..5 {
            sched.delay("k", adder(sum.clone(), 1), Some(WINDOW)).unwrap();
            settle().await;
            sleep(Duration::from_millis(600)).await;
        }
        // 5 triggers 600ms apart: every one reset the deadline.
        assert_eq!(sum.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(600)).await;
        settle().await;
        assert_eq!(sum.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_timeout_applies_when_omitted() {
        let sched = started();
        let sum = Arc::new(AtomicU32::new(0));
        settle().await;

        sched.apply("k", adder(sum.clone(), 1), None).unwrap();
        settle().await;
        sleep(Duration::from_millis(1200)).await;
        settle().await;
        assert_eq!(sum.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_rejected_at_boundary() {
        let sched = started();
        let sum = Arc::new(AtomicU32::new(0));
        let err = sched
            .apply("k", adder(sum.clone(), 1), Some(Duration::ZERO))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidTimeout { .. }));

        // Nothing was admitted into the state table.
        settle().await;
        assert!(sched.pending_keys().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_start_and_reject_restart() {
        let sched = Scheduler::new(test_config(), Vec::new());
        assert!(matches!(
            sched.cancel("k").unwrap_err(),
            SchedulerError::NotRunning
        ));

        sched.start().unwrap();
        assert!(matches!(
            sched.start().unwrap_err(),
            SchedulerError::AlreadyStarted
        ));

        sched.shutdown().await.unwrap();
        assert!(matches!(
            sched.cancel("k").unwrap_err(),
            SchedulerError::NotRunning
        ));
        assert!(matches!(
            sched.start().unwrap_err(),
            SchedulerError::AlreadyStarted
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_suppresses_pending_fire() {
        let sched = started();
        let sum = Arc::new(AtomicU32::new(0));
        settle().await;

        sched.apply("k", adder(sum.clone(), 1), Some(WINDOW)).unwrap();
        settle().await;
        sleep(Duration::from_millis(300)).await;
        sched.cancel("k").unwrap();
        settle().await;

        // The recurring gate's timer survives cancel; the action does not.
        assert_eq!(sched.pending_keys().await.unwrap(), vec!["k".to_string()]);

        sleep(Duration::from_millis(1500)).await;
        settle().await;
        assert_eq!(sum.load(Ordering::SeqCst), 0);
        assert!(sched.pending_keys().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_removes_delay_record_entirely() {
        let sched = started();
        let sum = Arc::new(AtomicU32::new(0));
        settle().await;

        sched.delay("k", adder(sum.clone(), 1), Some(WINDOW)).unwrap();
        settle().await;
        assert_eq!(sched.pending_keys().await.unwrap(), vec!["k".to_string()]);

        sched.cancel("k").unwrap();
        settle().await;
        assert!(sched.pending_keys().await.unwrap().is_empty());

        sleep(Duration::from_millis(1500)).await;
        settle().await;
        assert_eq!(sum.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_of_unknown_key_is_noop() {
        let sched = started();
        settle().await;
        sched.cancel("nope").unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_does_not_preempt_running_action() {
        let sched = started();
        let runs = Arc::new(AtomicU32::new(0));
        let gate = CancellationToken::new();
        settle().await;

        sched
            .immediate("k", blocker(gate.clone(), runs.clone()), Some(WINDOW))
            .unwrap();
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        sched.cancel("k").unwrap();
        settle().await;
        assert!(sched.worker_handle("k").await.is_some(), "run unaffected");

        gate.cancel();
        settle().await;
        assert!(sched.worker_handle("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_with_trailing_run() {
        let sched = started();
        let runs = Arc::new(AtomicU32::new(0));
        let gate = CancellationToken::new();
        let sum = Arc::new(AtomicU32::new(0));
        settle().await;

        sched
            .immediate("k", blocker(gate.clone(), runs.clone()), Some(WINDOW))
            .unwrap();
        settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // Let the gate window lapse so the next trigger is a fresh
        // leading edge, dispatched while the first run still blocks.
        sleep(Duration::from_millis(1200)).await;
        sched.immediate("k", adder(sum.clone(), 1), Some(WINDOW)).unwrap();
        settle().await;

        // No concurrent second run.
        assert_eq!(sum.load(Ordering::SeqCst), 0);
        assert_eq!(sched.running_keys().await, vec!["k".to_string()]);

        gate.cancel();
        settle().await;
        assert_eq!(sum.load(Ordering::SeqCst), 1, "trailing run after completion");
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_handle_tracks_in_flight_run() {
        let sched = started();
        let runs = Arc::new(AtomicU32::new(0));
        let gate = CancellationToken::new();
        settle().await;

        assert!(sched.worker_handle("k").await.is_none());

        sched
            .immediate("k", blocker(gate.clone(), runs.clone()), Some(WINDOW))
            .unwrap();
        settle().await;

        let handle = sched.worker_handle("k").await.unwrap();
        assert!(!handle.is_finished());

        gate.cancel();
        handle.finished().await;
        settle().await;
        assert!(sched.worker_handle("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_failure_is_isolated() {
        let sched = started();
        let sum = Arc::new(AtomicU32::new(0));
        settle().await;

        let failing = ActionFn::arc(|| async {
            Err(ActionError::Failed {
                error: "boom".into(),
            })
        });
        sched.immediate("k", failing, Some(WINDOW)).unwrap();
        settle().await;
        sleep(Duration::from_millis(1200)).await;

        // Same key dispatches fine afterwards.
        sched.immediate("k", adder(sum.clone(), 1), Some(WINDOW)).unwrap();
        settle().await;
        assert_eq!(sum.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_panic_is_isolated() {
        let sched = started();
        let sum = Arc::new(AtomicU32::new(0));
        settle().await;

        let panicking = ActionFn::arc(|| async {
            panic!("kaboom");
            #[allow(unreachable_code)]
            Ok(())
        });
        sched.immediate("k", panicking, Some(WINDOW)).unwrap();
        settle().await;
        assert!(sched.worker_handle("k").await.is_none(), "entry cleaned up");
        sleep(Duration::from_millis(1200)).await;

        sched.immediate("k", adder(sum.clone(), 1), Some(WINDOW)).unwrap();
        settle().await;
        assert_eq!(sum.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate2_drop_is_observable() {
        let sched = started();
        let mut rx = sched.events();
        let sum = Arc::new(AtomicU32::new(0));
        settle().await;

        sched.immediate2("k", adder(sum.clone(), 1), Some(WINDOW)).unwrap();
        settle().await;
        sched.immediate2("k", adder(sum.clone(), 2), Some(WINDOW)).unwrap();
        settle().await;

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert!(kinds.contains(&EventKind::TriggerArmed));
        assert!(kinds.contains(&EventKind::ActionDispatched));
        assert!(kinds.contains(&EventKind::TriggerDropped));
        assert_eq!(sum.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_do_not_interfere() {
        let sched = started();
        let sum_a = Arc::new(AtomicU32::new(0));
        let sum_b = Arc::new(AtomicU32::new(0));
        settle().await;

        sched.apply("a", adder(sum_a.clone(), 1), Some(WINDOW)).unwrap();
        sched
            .apply("b", adder(sum_b.clone(), 1), Some(Duration::from_millis(300)))
            .unwrap();
        settle().await;

        sleep(Duration::from_millis(400)).await;
        settle().await;
        assert_eq!(sum_b.load(Ordering::SeqCst), 1, "short window fired");
        assert_eq!(sum_a.load(Ordering::SeqCst), 0, "long window still pending");

        sleep(Duration::from_millis(800)).await;
        settle().await;
        assert_eq!(sum_a.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_then_reports_busy_keys() {
        let cfg = Config {
            grace: Duration::from_millis(200),
            ..test_config()
        };
        let sched = Scheduler::new(cfg, Vec::new());
        sched.start().unwrap();
        let runs = Arc::new(AtomicU32::new(0));
        let gate = CancellationToken::new();
        settle().await;

        sched
            .immediate("stuck", blocker(gate.clone(), runs.clone()), Some(WINDOW))
            .unwrap();
        settle().await;

        let err = sched.shutdown().await.unwrap_err();
        match err {
            SchedulerError::GraceExceeded { busy, .. } => {
                assert_eq!(busy, vec!["stuck".to_string()]);
            }
            other => panic!("expected GraceExceeded, got {other:?}"),
        }
        gate.cancel();
    }

    struct Recorder {
        kinds: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait::async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.kinds.lock().unwrap().push(ev.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_observe_shutdown_phase_events() {
        let cfg = Config {
            grace: Duration::from_millis(200),
            ..test_config()
        };
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let sched = Scheduler::new(
            cfg,
            vec![Arc::new(Recorder {
                kinds: kinds.clone(),
            })],
        );
        sched.start().unwrap();
        let runs = Arc::new(AtomicU32::new(0));
        let gate = CancellationToken::new();
        settle().await;

        sched
            .immediate("stuck", blocker(gate.clone(), runs.clone()), Some(WINDOW))
            .unwrap();
        settle().await;

        let err = sched.shutdown().await.unwrap_err();
        assert!(matches!(err, SchedulerError::GraceExceeded { .. }));
        settle().await;

        // Shutdown-phase events still reach subscribers.
        {
            let seen = kinds.lock().unwrap();
            assert!(seen.contains(&EventKind::SchedulerStopped));
            assert!(seen.contains(&EventKind::GraceExceeded));
        }

        // So does the completion of a worker outliving the grace window.
        gate.cancel();
        settle().await;
        assert!(kinds.lock().unwrap().contains(&EventKind::ActionCompleted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_clean_when_idle() {
        let sched = started();
        let sum = Arc::new(AtomicU32::new(0));
        settle().await;

        sched.immediate("k", adder(sum.clone(), 1), Some(WINDOW)).unwrap();
        settle().await;
        sched.shutdown().await.unwrap();
        assert_eq!(sum.load(Ordering::SeqCst), 1);

        // Pending (unfired) work is discarded with the control loop.
        assert!(matches!(
            sched.shutdown().await.unwrap_err(),
            SchedulerError::NotRunning
        ));
    }
}
