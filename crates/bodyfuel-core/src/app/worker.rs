//! Periodic background workers.
//!
//! A worker owns one tokio task that waits for either the next tick or a
//! shutdown signal. Each tick runs in its own spawned task so a panic is
//! reported as a `JoinError` and the worker keeps going.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// One unit of periodic work.
#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Run one tick. Long ticks should check `shutdown` between items and
    /// return early once it reads `true`.
    async fn tick(&self, shutdown: &watch::Receiver<bool>);
}

/// Handle to a running worker.
/// - `request_shutdown` asks the worker to stop after the current item
/// - `stop` does the same and waits for the worker task to exit
pub struct WorkerHandle {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn stop(self) {
        self.request_shutdown();
        if let Err(e) = self.join.await {
            tracing::error!(worker = self.name, error = %e, "worker task ended abnormally");
        }
    }
}

/// Spawn `job` on a fixed `period`. The first tick fires one period after
/// start.
pub fn spawn_periodic<J: PeriodicJob>(job: Arc<J>, period: Duration) -> WorkerHandle {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let name = job.name();
    let join = tokio::spawn(run_periodic(job, period, shutdown_rx));

    WorkerHandle {
        name,
        shutdown_tx,
        join,
    }
}

async fn run_periodic<J: PeriodicJob>(job: Arc<J>, period: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    let name = job.name();
    tracing::info!(worker = name, period_secs = period.as_secs_f64(), "worker started");

    let period = period.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    // handle dropped without stop()
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        let tick_job = Arc::clone(&job);
        let tick_rx = shutdown_rx.clone();
        let tick = tokio::spawn(async move { tick_job.tick(&tick_rx).await });

        if let Err(e) = tick.await {
            if e.is_panic() {
                tracing::error!(worker = name, error = %e, "tick panicked");
            } else {
                tracing::warn!(worker = name, error = %e, "tick cancelled");
            }
        }
    }

    tracing::info!(worker = name, "worker stopped");
}
