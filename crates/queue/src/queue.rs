//! Queue client: schema migration, insertion and job state transitions.

use crate::{InsertOpts, Job, JobSpec};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::{PgConnection, PgPool};
use std::time::Duration;
use thiserror::Error;

/// Current queue schema version.
const SCHEMA_VERSION: i32 = 1;

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id BIGSERIAL PRIMARY KEY,
    kind TEXT NOT NULL,
    args JSONB NOT NULL,
    priority SMALLINT NOT NULL DEFAULT 1,
    state TEXT NOT NULL DEFAULT 'available',
    attempt INT NOT NULL DEFAULT 0,
    max_attempts INT NOT NULL DEFAULT 3,
    scheduled_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    last_error TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    started_at TIMESTAMPTZ,
    finalized_at TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS jobs_fetch_idx
    ON jobs (priority, id) WHERE state IN ('available', 'retryable');
";

/// An error from the queue layer.
#[derive(Error, Debug)]
pub enum QueueError {
    /// The database rejected the operation.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    /// A job argument payload failed to (de)serialize.
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Client half of the durable queue: insertion and job state transitions.
#[derive(Debug, Clone)]
pub struct Queue {
    pool: PgPool,
}

impl Queue {
    /// Creates a client over the shared pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Migrates the queue schema to its current version.
    ///
    /// Runs on the caller's connection so the pipeline can enlist it in its
    /// startup transaction.
    pub async fn migrate(conn: &mut PgConnection) -> Result<(), QueueError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS queue_schema_version (version INT NOT NULL)",
        )
        .execute(&mut *conn)
        .await?;
        let current: Option<(i32,)> =
            sqlx::query_as("SELECT version FROM queue_schema_version FOR UPDATE")
                .fetch_optional(&mut *conn)
                .await?;
        let current = current.map(|(v,)| v).unwrap_or_default();
        if current < 1 {
            sqlx::raw_sql(SCHEMA_V1).execute(&mut *conn).await?;
        }
        if current == 0 {
            sqlx::query("INSERT INTO queue_schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(&mut *conn)
                .await?;
        } else if current < SCHEMA_VERSION {
            sqlx::query("UPDATE queue_schema_version SET version = $1")
                .bind(SCHEMA_VERSION)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Enqueues one job on a pool connection, outside any caller transaction.
    pub async fn insert<T: Serialize>(
        &self,
        kind: &'static str,
        args: &T,
        opts: InsertOpts,
    ) -> Result<u64, QueueError> {
        let mut conn = self.pool.acquire().await?;
        self.insert_tx(&mut conn, kind, args, opts).await
    }

    /// Enqueues one job with an already-serialized payload.
    pub async fn insert_value(
        &self,
        kind: &'static str,
        args: Value,
        opts: InsertOpts,
    ) -> Result<u64, QueueError> {
        let mut conn = self.pool.acquire().await?;
        self.insert_raw(&mut conn, kind, args, opts).await
    }

    /// Enqueues one job on the caller's connection.
    ///
    /// Inside a transaction, the job becomes visible atomically with the
    /// rows the caller writes in the same transaction.
    pub async fn insert_tx<T: Serialize>(
        &self,
        conn: &mut PgConnection,
        kind: &'static str,
        args: &T,
        opts: InsertOpts,
    ) -> Result<u64, QueueError> {
        self.insert_raw(conn, kind, serde_json::to_value(args)?, opts).await
    }

    /// Enqueues several jobs on the caller's connection, preserving the
    /// per-job priorities.
    pub async fn insert_many(
        &self,
        conn: &mut PgConnection,
        jobs: Vec<JobSpec>,
    ) -> Result<Vec<u64>, QueueError> {
        let mut ids = Vec::with_capacity(jobs.len());
        for spec in jobs {
            ids.push(self.insert_raw(&mut *conn, spec.kind, spec.args, spec.opts).await?);
        }
        Ok(ids)
    }

    async fn insert_raw(
        &self,
        conn: &mut PgConnection,
        kind: &str,
        args: Value,
        opts: InsertOpts,
    ) -> Result<u64, QueueError> {
        let scheduled_at: DateTime<Utc> = opts.scheduled_at.unwrap_or_else(Utc::now);
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO jobs (kind, args, priority, max_attempts, scheduled_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(kind)
        .bind(args)
        .bind(opts.priority)
        .bind(opts.max_attempts)
        .bind(scheduled_at)
        .fetch_one(conn)
        .await?;
        Ok(id as u64)
    }

    /// Fetches the next runnable job, marking it running.
    ///
    /// Lower priority drains first and ties break FIFO by insertion id;
    /// `FOR UPDATE SKIP LOCKED` lets concurrent fetchers coexist.
    pub async fn fetch_next(&self) -> Result<Option<Job>, QueueError> {
        let row: Option<(i64, String, Value, i16, i32, i32)> = sqlx::query_as(
            "UPDATE jobs SET state = 'running', attempt = attempt + 1, started_at = now()
             WHERE id = (
                 SELECT id FROM jobs
                 WHERE state IN ('available', 'retryable') AND scheduled_at <= now()
                 ORDER BY priority ASC, id ASC
                 FOR UPDATE SKIP LOCKED
                 LIMIT 1
             )
             RETURNING id, kind, args, priority, attempt, max_attempts",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, kind, args, priority, attempt, max_attempts)| Job {
            id: id as u64,
            kind,
            args,
            priority,
            attempt,
            max_attempts,
        }))
    }

    /// Marks a job completed.
    pub async fn complete_job(&self, id: u64) -> Result<(), QueueError> {
        sqlx::query("UPDATE jobs SET state = 'completed', finalized_at = now() WHERE id = $1")
            .bind(id as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Terminates a job permanently at its handler's request.
    pub async fn cancel_job(&self, id: u64, reason: &str) -> Result<(), QueueError> {
        sqlx::query(
            "UPDATE jobs SET state = 'cancelled', last_error = $2, finalized_at = now()
             WHERE id = $1",
        )
        .bind(id as i64)
        .bind(reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Schedules a failed job for another attempt, or discards it once its
    /// attempt budget is spent.
    pub async fn retry_job(&self, job: &Job, error: &str) -> Result<(), QueueError> {
        if job.attempt >= job.max_attempts {
            sqlx::query(
                "UPDATE jobs SET state = 'discarded', last_error = $2, finalized_at = now()
                 WHERE id = $1",
            )
            .bind(job.id as i64)
            .bind(error)
            .execute(&self.pool)
            .await?;
            return Ok(());
        }
        let delay = backoff(job.attempt);
        sqlx::query(
            "UPDATE jobs SET state = 'retryable', last_error = $2,
                    scheduled_at = now() + make_interval(secs => $3)
             WHERE id = $1",
        )
        .bind(job.id as i64)
        .bind(error)
        .bind(delay.as_secs_f64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Exponential retry backoff, capped at five minutes.
pub(crate) fn backoff(attempt: i32) -> Duration {
    let exp = attempt.clamp(1, 16) as u32;
    Duration::from_secs(2u64.saturating_pow(exp).min(300))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        assert_eq!(backoff(1), Duration::from_secs(2));
        assert_eq!(backoff(2), Duration::from_secs(4));
        assert_eq!(backoff(3), Duration::from_secs(8));
        assert_eq!(backoff(10), Duration::from_secs(300));
        assert_eq!(backoff(0), Duration::from_secs(2));
        assert_eq!(backoff(i32::MAX), Duration::from_secs(300));
    }
}
