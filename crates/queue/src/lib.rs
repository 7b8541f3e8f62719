//! A durable job queue backed by the same Postgres instance as the ledger.
//!
//! Jobs enqueued with [Queue::insert_tx] become visible atomically with the
//! ledger rows written in the same transaction; the queue is therefore the
//! source of truth for in-flight work and survives process restarts. Jobs
//! drain in ascending priority order (FIFO within a priority), retry with
//! exponential backoff up to their attempt budget, and can be cancelled
//! permanently by their handler.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod job;
pub use job::{InsertOpts, Job, JobOutcome, JobSpec};

mod queue;
pub use queue::{Queue, QueueError};

mod runner;
pub use runner::{JobHandler, PeriodicJob, Runner};
