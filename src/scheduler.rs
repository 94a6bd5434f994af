//! Wall-clock aligned poll scheduler.
//!
//! The first cycle waits for the next multiple of the interval (counted from
//! the Unix epoch, so `:00/:10/:20…` for a 10-minute interval in whole-hour
//! zones), then a fixed-period timer re-triggers it. Cycles run on their own
//! task behind a single run-lock: a tick that finds the previous cycle still
//! running is skipped, so two cycles never touch the day files at once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Aligning,
    Running,
    Stopped,
}

/// Snapshot of the scheduler's own state.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerState {
    pub phase: Phase,
    pub interval: Duration,
    pub last_fired: Option<DateTime<Utc>>,
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub cycles_skipped: u64,
}

impl SchedulerState {
    fn new(interval: Duration) -> Self {
        Self {
            phase: Phase::Aligning,
            interval,
            last_fired: None,
            cycles_started: 0,
            cycles_completed: 0,
            cycles_failed: 0,
            cycles_skipped: 0,
        }
    }
}

/// Time from `now` until the next multiple of `interval` since the epoch.
/// Zero when `now` sits exactly on a boundary.
pub fn delay_until_next_boundary(now: DateTime<Utc>, interval: Duration) -> Duration {
    let interval_ms = interval.as_millis() as i64;
    if interval_ms <= 0 {
        return Duration::ZERO;
    }
    let rem = now.timestamp_millis().rem_euclid(interval_ms);
    if rem == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis((interval_ms - rem) as u64)
    }
}

#[derive(Debug, Clone)]
pub struct PollScheduler {
    interval: Duration,
}

/// Running scheduler. Dropping it stops the tick loop as well.
pub struct SchedulerHandle {
    state: Arc<RwLock<SchedulerState>>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }

    /// Stop ticking, wait for an in-flight cycle to finish, and return the
    /// final state.
    pub async fn stop(self) -> SchedulerState {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            error!("Scheduler task ended abnormally: {}", e);
        }
        self.state.read().await.clone()
    }
}

struct Shared<C> {
    cycle: C,
    state: Arc<RwLock<SchedulerState>>,
    run_lock: Arc<Mutex<()>>,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Align against the current wall clock and start.
    pub fn start<C, Fut, T>(self, cycle: C) -> SchedulerHandle
    where
        C: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = common::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.start_from(Utc::now(), cycle)
    }

    /// Start as if the wall clock read `now`.
    pub fn start_from<C, Fut, T>(self, now: DateTime<Utc>, cycle: C) -> SchedulerHandle
    where
        C: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = common::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::new(RwLock::new(SchedulerState::new(self.interval)));
        let (stop_tx, stop_rx) = watch::channel(false);
        let shared = Arc::new(Shared {
            cycle,
            state: state.clone(),
            run_lock: Arc::new(Mutex::new(())),
        });
        let delay = delay_until_next_boundary(now, self.interval);

        let task = tokio::spawn(run(self.interval, delay, shared, stop_rx));
        SchedulerHandle {
            state,
            stop_tx,
            task,
        }
    }
}

async fn run<C, Fut, T>(
    interval: Duration,
    delay: Duration,
    shared: Arc<Shared<C>>,
    mut stop_rx: watch::Receiver<bool>,
) where
    C: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = common::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let mut stopped = false;

    if !delay.is_zero() {
        info!("Aligning to interval {:?}: first cycle in {:?}", interval, delay);
        tokio::select! {
            _ = sleep(delay) => {}
            _ = stop_rx.changed() => stopped = true,
        }
    }

    if !stopped {
        shared.state.write().await.phase = Phase::Running;
        fire(&shared).await;

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => fire(&shared).await,
                _ = stop_rx.changed() => break,
            }
        }
    }

    let _idle = shared.run_lock.lock().await;
    shared.state.write().await.phase = Phase::Stopped;
    info!("Scheduler stopped");
}

async fn fire<C, Fut, T>(shared: &Arc<Shared<C>>)
where
    C: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = common::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let guard = match shared.run_lock.clone().try_lock_owned() {
        Ok(guard) => guard,
        Err(_) => {
            let mut state = shared.state.write().await;
            state.cycles_skipped += 1;
            warn!(
                "Previous cycle still running; skipping tick ({} skipped so far)",
                state.cycles_skipped
            );
            return;
        }
    };

    let cycle_id = {
        let mut state = shared.state.write().await;
        state.cycles_started += 1;
        state.last_fired = Some(Utc::now());
        state.cycles_started
    };
    debug!("Starting cycle {}", cycle_id);

    let fut = (shared.cycle)();
    let state = shared.state.clone();
    tokio::spawn(async move {
        let result = fut.await;
        let mut state = state.write().await;
        match result {
            Ok(_) => state.cycles_completed += 1,
            Err(e) => {
                state.cycles_failed += 1;
                error!("Cycle {} failed: {}", cycle_id, e);
            }
        }
        drop(guard);
    });
}
