//! Store error type.

use thiserror::Error;

/// An error from the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("record not found")]
    NotFound,
    /// A stored value could not be mapped back into its domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),
    /// The database rejected the operation.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    /// A migration failed to apply.
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Whether this error is a plain missing-record condition.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
