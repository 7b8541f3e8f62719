//! Job runner: drains the queue into registered handlers.

use crate::{InsertOpts, Job, JobOutcome, Queue};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// A typed consumer for one job kind.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    /// The job kind this handler consumes.
    fn kind(&self) -> &'static str;

    /// Executes one job.
    ///
    /// Returning an error schedules a retry with backoff until the job's
    /// attempt budget is spent; returning [JobOutcome::Cancel] terminates the
    /// job permanently.
    async fn run(&self, job: Job) -> Result<JobOutcome>;
}

/// A job re-enqueued on a fixed schedule.
#[derive(Debug, Clone)]
pub struct PeriodicJob {
    /// Handler discriminator.
    pub kind: &'static str,
    /// Argument payload inserted on every tick.
    pub args: Value,
    /// Tick interval.
    pub interval: Duration,
    /// Whether to enqueue immediately on runner start.
    pub run_on_start: bool,
}

/// Drains the default queue into registered handlers with bounded
/// concurrency.
pub struct Runner {
    queue: Queue,
    handlers: HashMap<&'static str, Arc<dyn JobHandler>>,
    periodic: Vec<PeriodicJob>,
    max_workers: usize,
    poll_interval: Duration,
    drain_deadline: Duration,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("max_workers", &self.max_workers)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Creates a runner over the queue with the given concurrency bound.
    pub fn new(queue: Queue, max_workers: usize, drain_deadline: Duration) -> Self {
        Self {
            queue,
            handlers: HashMap::new(),
            periodic: Vec::new(),
            max_workers: max_workers.max(1),
            poll_interval: Duration::from_millis(250),
            drain_deadline,
        }
    }

    /// Registers a handler under its kind.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    /// Registers a periodic job.
    pub fn register_periodic(&mut self, periodic: PeriodicJob) {
        self.periodic.push(periodic);
    }

    /// Runs until cancelled, then drains in-flight jobs up to the configured
    /// deadline.
    pub async fn run(self, cancel: CancellationToken) {
        let mut tickers = JoinSet::new();
        for periodic in self.periodic.clone() {
            let queue = self.queue.clone();
            let cancel = cancel.clone();
            tickers.spawn(async move { tick_periodic(queue, periodic, cancel).await });
        }

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut inflight = JoinSet::new();

        loop {
            // Reap whatever finished since the last pass.
            while inflight.try_join_next().is_some() {}

            let permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let job = match self.queue.fetch_next().await {
                Ok(Some(job)) => job,
                Ok(None) => {
                    drop(permit);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_interval) => continue,
                    }
                }
                Err(e) => {
                    drop(permit);
                    error!(target: "queue", "job fetch failed: {e}");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_interval) => continue,
                    }
                }
            };

            let Some(handler) = self.handlers.get(job.kind.as_str()).cloned() else {
                error!(target: "queue", kind = %job.kind, id = job.id, "no handler registered");
                if let Err(e) = self.queue.retry_job(&job, "no handler registered").await {
                    error!(target: "queue", "failed to park handlerless job: {e}");
                }
                drop(permit);
                continue;
            };

            let queue = self.queue.clone();
            inflight.spawn(async move {
                let _permit = permit;
                run_one(queue, handler, job).await;
            });
        }

        tickers.shutdown().await;

        debug!(target: "queue", "draining in-flight jobs");
        let drain = async {
            while inflight.join_next().await.is_some() {}
        };
        if tokio::time::timeout(self.drain_deadline, drain).await.is_err() {
            warn!(target: "queue", "drain deadline exceeded, aborting in-flight jobs");
            inflight.shutdown().await;
        }
    }
}

async fn run_one(queue: Queue, handler: Arc<dyn JobHandler>, job: Job) {
    let id = job.id;
    let kind = job.kind.clone();
    let attempt = job.attempt;
    debug!(target: "queue", %kind, id, attempt, "running job");

    let finalize = match handler.run(job.clone()).await {
        Ok(JobOutcome::Complete) => queue.complete_job(id).await,
        Ok(JobOutcome::Cancel(reason)) => {
            debug!(target: "queue", %kind, id, %reason, "job cancelled by handler");
            queue.cancel_job(id, &reason).await
        }
        Err(e) => {
            warn!(target: "queue", %kind, id, attempt, "job failed: {e:#}");
            queue.retry_job(&job, &format!("{e:#}")).await
        }
    };
    if let Err(e) = finalize {
        error!(target: "queue", %kind, id, "failed to finalize job state: {e}");
    }
}

async fn tick_periodic(queue: Queue, periodic: PeriodicJob, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(periodic.interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    if !periodic.run_on_start {
        // The first tick of a tokio interval fires immediately.
        interval.tick().await;
    }
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let opts = InsertOpts::default().max_attempts(1);
                if let Err(e) = queue.insert_value(periodic.kind, periodic.args.clone(), opts).await {
                    error!(target: "queue", kind = %periodic.kind, "periodic enqueue failed: {e}");
                }
            }
        }
    }
}
