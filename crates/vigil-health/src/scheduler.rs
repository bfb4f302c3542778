//! Periodic probe scheduler.
//!
//! Owns the worker pool plus two background tasks: the tick loop, which
//! snapshots the registry every interval and hands the batch to the pool,
//! and the drain loop, which writes finished probes back into the registry.
//!
//! At most one batch is being queued at a time. A tick that arrives while
//! the previous batch is still waiting on the job queue is skipped, so a
//! slow pool never accumulates stale snapshots. Probes from consecutive
//! batches may still run side by side in the pool.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use vigil_registry::{Registry, RegistryError, Target, TargetId};

use crate::pool::{PoolConfig, Submitter, WorkerPool};
use crate::prober::Prober;

/// Default interval between probe cycles.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(3);

/// Shortest accepted tick interval.
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);

/// Scheduler tuning.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between ticks. The first tick fires one interval after start.
    /// Values below [`MIN_CHECK_INTERVAL`] are raised to it.
    pub interval: Duration,
    pub pool: PoolConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CHECK_INTERVAL,
            pool: PoolConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    /// Terminal.
    Stopped,
}

/// Drives periodic probing of every registered target.
pub struct Scheduler {
    state: SchedulerState,
    shutdown_tx: watch::Sender<bool>,
    ticker: Option<JoinHandle<()>>,
    drainer: Option<JoinHandle<()>>,
    pool: Option<WorkerPool>,
}

impl Scheduler {
    /// Start the worker pool, the tick loop, and the drain loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(registry: Registry, prober: Prober, config: SchedulerConfig) -> Self {
        let interval = config.interval.max(MIN_CHECK_INTERVAL);
        if interval != config.interval {
            warn!(requested = ?config.interval, using = ?interval, "check interval too short");
        }

        let (pool, results) = WorkerPool::start(prober, config.pool.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let ticker = tokio::spawn(run_ticker(
            registry.clone(),
            pool.submitter(),
            interval,
            shutdown_rx.clone(),
        ));
        let drainer = tokio::spawn(run_drainer(registry, results, shutdown_rx));

        info!(
            ?interval,
            workers = pool.worker_count(),
            "probe scheduler started"
        );

        Self {
            state: SchedulerState::Running,
            shutdown_tx,
            ticker: Some(ticker),
            drainer: Some(drainer),
            pool: Some(pool),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Stop ticking, abort pending batch submissions, end the drain loop,
    /// and shut the worker pool down. Probes already running finish under
    /// their own timeout, so this can take up to one probe timeout; callers
    /// with a deadline should bound it. Calling `stop` again is a no-op.
    pub async fn stop(&mut self) {
        if self.state == SchedulerState::Stopped {
            return;
        }
        self.state = SchedulerState::Stopped;
        let _ = self.shutdown_tx.send(true);

        for handle in [self.ticker.take(), self.drainer.take()].into_iter().flatten() {
            if let Err(e) = handle.await {
                warn!(error = %e, "scheduler task failed");
            }
        }
        if let Some(pool) = self.pool.take() {
            pool.shutdown().await;
        }

        info!("probe scheduler stopped");
    }
}

/// Queue a batch of probes every `period` until shutdown.
async fn run_ticker(
    registry: Registry,
    submitter: Submitter,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut batch: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if batch.as_ref().is_some_and(|b| !b.is_finished()) {
                    debug!("previous probe batch still queueing, skipping tick");
                } else {
                    if let Some(finished) = batch.take() {
                        if let Err(e) = finished.await {
                            warn!(error = %e, "probe batch task failed");
                        }
                    }
                    let ids: Vec<TargetId> = registry.list().into_iter().map(|t| t.id).collect();
                    debug!(targets = ids.len(), "probe cycle");
                    if !ids.is_empty() {
                        batch = Some(tokio::spawn(submit_batch(
                            registry.clone(),
                            submitter.clone(),
                            ids,
                        )));
                    }
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    if let Some(pending) = batch {
        pending.abort();
        let _ = pending.await;
    }
    debug!("tick loop stopped");
}

/// Submit each target still registered, reading it fresh from the registry.
async fn submit_batch(registry: Registry, submitter: Submitter, ids: Vec<TargetId>) {
    for id in ids {
        let Ok(target) = registry.get(&id) else {
            continue;
        };
        if submitter.submit(target).await.is_err() {
            debug!("worker pool closed, abandoning probe batch");
            return;
        }
    }
}

/// Apply results in completion order until shutdown.
async fn run_drainer(
    registry: Registry,
    mut results: mpsc::Receiver<Target>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            result = results.recv() => match result {
                Some(target) => record_result(&registry, &target),
                None => break,
            },
            _ = shutdown.changed() => break,
        }
    }
    debug!("result drain loop stopped");
}

fn record_result(registry: &Registry, result: &Target) {
    match registry.upsert(result) {
        Ok(()) => debug!(
            id = %result.id,
            endpoint = %result.endpoint,
            code = result.code,
            duration = %result.duration,
            "probe result recorded"
        ),
        Err(RegistryError::NotFound(_)) => {
            debug!(id = %result.id, "dropping probe result for removed target")
        }
        Err(e) => warn!(id = %result.id, error = %e, "failed to record probe result"),
    }
}
