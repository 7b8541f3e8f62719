//! Postgres persistence for the custodial orchestrator.
//!
//! One [Pg] handle wraps the shared connection pool. Every operation takes a
//! `&mut PgConnection` so callers decide the transaction boundary: an intent
//! handler opens one transaction and threads it through key loading, nonce
//! allocation, ledger inserts and job enqueueing so they commit or roll back
//! together.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Postgres, Transaction,
};
use tracing::info;

mod error;
pub use error::StoreError;

mod keystore;
mod nonce;

mod otx;
pub use otx::{NewOtx, MAX_PAGE_SIZE};

/// A short alias for a store transaction.
pub type PgTx = Transaction<'static, Postgres>;

/// The Postgres-backed store.
#[derive(Debug, Clone)]
pub struct Pg {
    pool: PgPool,
}

impl Pg {
    /// Connects to Postgres and applies pending migrations.
    pub async fn connect(dsn: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(dsn).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(target: "store", "migrations ran successfully");
        Ok(Self { pool })
    }

    /// Wraps an existing pool without running migrations.
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The shared connection pool.
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Opens a new transaction on the shared pool.
    pub async fn begin(&self) -> Result<PgTx, StoreError> {
        Ok(self.pool.begin().await?)
    }

    /// One-time startup actions: ensures the master signer exists.
    pub async fn bootstrap(&self) -> Result<(), StoreError> {
        let mut tx = self.begin().await?;
        self.bootstrap_master(&mut tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
