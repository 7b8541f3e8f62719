//! Job records and insertion options.

use crate::QueueError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Default attempt budget before a job is discarded.
pub(crate) const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// Default drain priority; lower drains first.
pub(crate) const DEFAULT_PRIORITY: i16 = 1;

/// A fetched, running job as handed to its handler.
#[derive(Debug, Clone)]
pub struct Job {
    /// Queue row id.
    pub id: u64,
    /// Handler discriminator.
    pub kind: String,
    /// Kind-specific argument payload.
    pub args: Value,
    /// Drain priority the job was enqueued with.
    pub priority: i16,
    /// 1-based attempt counter, including the current attempt.
    pub attempt: i32,
    /// Attempt budget.
    pub max_attempts: i32,
}

impl Job {
    /// Deserializes the argument payload into the handler's typed args.
    pub fn decode_args<T: serde::de::DeserializeOwned>(&self) -> Result<T, QueueError> {
        Ok(serde_json::from_value(self.args.clone())?)
    }
}

/// What a handler decided about a finished job.
#[derive(Debug)]
pub enum JobOutcome {
    /// The job is done; mark completed.
    Complete,
    /// Terminate the job permanently without further retries.
    Cancel(String),
}

/// Per-job insertion options.
#[derive(Debug, Clone)]
pub struct InsertOpts {
    /// Drain priority; lower runs first, ties break FIFO.
    pub priority: i16,
    /// Attempt budget before the job is discarded.
    pub max_attempts: i32,
    /// Earliest time the job may be fetched. `None` means immediately.
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Default for InsertOpts {
    fn default() -> Self {
        Self { priority: DEFAULT_PRIORITY, max_attempts: DEFAULT_MAX_ATTEMPTS, scheduled_at: None }
    }
}

impl InsertOpts {
    /// Options with a custom priority.
    pub fn priority(priority: i16) -> Self {
        Self { priority, ..Self::default() }
    }

    /// Caps the attempt budget.
    pub fn max_attempts(mut self, max_attempts: i32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// One entry of a multi-job transactional insert.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Handler discriminator.
    pub kind: &'static str,
    /// Kind-specific argument payload.
    pub args: Value,
    /// Insertion options.
    pub opts: InsertOpts,
}

impl JobSpec {
    /// Builds a spec from typed handler args.
    pub fn new<T: Serialize>(
        kind: &'static str,
        args: &T,
        opts: InsertOpts,
    ) -> Result<Self, QueueError> {
        Ok(Self { kind, args: serde_json::to_value(args)?, opts })
    }
}
