//! Delivers queued tasks through the notification port and applies the
//! retry policy when delivery fails.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;

use super::config::ExecutorConfig;
use super::worker::{PeriodicJob, WorkerHandle, spawn_periodic};
use crate::domain::{DomainError, ResultExt, RetryDecision, Task, TasksFilter};
use crate::ports::{Clock, NotificationSender, Repositories, TransactionManager};

/// What one poll did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub polled: usize,
    pub delivered: usize,
    pub rescheduled: usize,
    pub exhausted: usize,
    pub errors: usize,
}

enum Delivery {
    Delivered,
    Failed {
        decision: RetryDecision,
        error: DomainError,
    },
}

pub struct TaskExecutor {
    repos: Repositories,
    tx: Arc<dyn TransactionManager>,
    clock: Arc<dyn Clock>,
    sender: Arc<dyn NotificationSender>,
    config: ExecutorConfig,
    rng: Mutex<StdRng>,
}

impl TaskExecutor {
    pub fn new(
        repos: Repositories,
        tx: Arc<dyn TransactionManager>,
        clock: Arc<dyn Clock>,
        sender: Arc<dyn NotificationSender>,
        config: ExecutorConfig,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            repos,
            tx,
            clock,
            sender,
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn start(self) -> WorkerHandle {
        let interval = self.config.poll_interval();
        spawn_periodic(Arc::new(self), interval)
    }

    /// Handle every task that is due right now, up to `batch_size`.
    pub async fn run_once(&self) -> ExecutionReport {
        self.poll(None).await
    }

    async fn poll(&self, shutdown: Option<&watch::Receiver<bool>>) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let now = self.clock.now();

        let mut due = match self.repos.tasks.list(&TasksFilter::due(now)).await {
            Ok(due) => due,
            Err(e) => {
                tracing::error!(error = %e, "failed to list due tasks");
                return report;
            }
        };
        due.truncate(self.config.batch_size);

        for task in due {
            if shutdown.is_some_and(|rx| *rx.borrow()) {
                break;
            }
            if !task.is_eligible_for_execution(now) {
                continue;
            }

            report.polled += 1;
            let task_id = task.id();
            match self.execute(task, now).await {
                Ok(Delivery::Delivered) => {
                    report.delivered += 1;
                    tracing::debug!(task_id = %task_id, "task delivered");
                }
                Ok(Delivery::Failed {
                    decision: RetryDecision::Scheduled { retry_at, delay },
                    error,
                }) => {
                    report.rescheduled += 1;
                    tracing::warn!(
                        task_id = %task_id,
                        retry_at = %retry_at,
                        delay_secs = delay.as_secs(),
                        error = %error,
                        "task delivery failed, retry scheduled"
                    );
                }
                Ok(Delivery::Failed {
                    decision: RetryDecision::Exhausted,
                    error,
                }) => {
                    report.exhausted += 1;
                    tracing::error!(task_id = %task_id, error = %error, "task delivery failed, attempts exhausted");
                }
                Err(e) => {
                    report.errors += 1;
                    tracing::error!(task_id = %task_id, error = %e, "task bookkeeping failed");
                }
            }
        }

        report
    }

    /// Deliver one task and record the result in the same transaction.
    async fn execute(&self, mut task: Task, now: chrono::DateTime<chrono::Utc>) -> Result<Delivery, DomainError> {
        let mut delivery = Delivery::Delivered;
        let slot = &mut delivery;

        self.tx
            .run(Box::pin(async move {
                match self.sender.send(task.task_type(), task.payload()).await {
                    Ok(()) => {
                        self.repos.tasks.delete(&[task.id()]).await.context("delete delivered task")?;
                        *slot = Delivery::Delivered;
                    }
                    Err(error) => {
                        let decision = {
                            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                            task.record_failure(now, &mut *rng)
                        };
                        tracing::debug!(task_id = %task.id(), attempts = task.attempts(), "recording failed attempt");
                        self.repos.tasks.update(&task).await.context("update failed task")?;
                        *slot = Delivery::Failed { decision, error };
                    }
                }
                Ok(())
            }))
            .await?;

        Ok(delivery)
    }
}

#[async_trait]
impl PeriodicJob for TaskExecutor {
    fn name(&self) -> &'static str {
        "task-executor"
    }

    async fn tick(&self, shutdown: &watch::Receiver<bool>) {
        let report = self.poll(Some(shutdown)).await;
        if report.polled > 0 {
            tracing::info!(
                polled = report.polled,
                delivered = report.delivered,
                rescheduled = report.rescheduled,
                exhausted = report.exhausted,
                errors = report.errors,
                "task executor poll finished"
            );
        }
    }
}
