//! Per-account monotonic nonce allocation.

use crate::{Pg, StoreError};
use alloy_primitives::Address;
use sqlx::postgres::PgConnection;

impl Pg {
    /// Returns the next nonce that would be handed out, without allocating.
    pub async fn peek_nonce(
        &self,
        conn: &mut PgConnection,
        address: Address,
    ) -> Result<u64, StoreError> {
        let next: Option<(i64,)> =
            sqlx::query_as("SELECT next_nonce FROM nonce WHERE public_address = $1")
                .bind(address.to_checksum(None))
                .fetch_optional(conn)
                .await?;
        Ok(next.map(|(n,)| n as u64).unwrap_or_default())
    }

    /// Allocates the next nonce for `address`.
    ///
    /// The upsert takes a row lock inside the caller's transaction, so
    /// concurrent acquires for the same address serialize in commit order and
    /// an aborted enclosing transaction rolls the allocation back. If a later
    /// allocation has committed above an aborted one, the aborted value is a
    /// permanent gap; repair is an operator action via [Self::set_nonce].
    pub async fn acquire_nonce(
        &self,
        conn: &mut PgConnection,
        address: Address,
    ) -> Result<u64, StoreError> {
        let (allocated,): (i64,) = sqlx::query_as(
            "INSERT INTO nonce (public_address, next_nonce) VALUES ($1, 1)
             ON CONFLICT (public_address)
             DO UPDATE SET next_nonce = nonce.next_nonce + 1, updated_at = now()
             RETURNING next_nonce - 1",
        )
        .bind(address.to_checksum(None))
        .fetch_one(conn)
        .await?;
        Ok(allocated as u64)
    }

    /// Administrative reset of an account's allocation state.
    pub async fn set_nonce(
        &self,
        conn: &mut PgConnection,
        address: Address,
        nonce: u64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO nonce (public_address, next_nonce) VALUES ($1, $2)
             ON CONFLICT (public_address)
             DO UPDATE SET next_nonce = $2, updated_at = now()",
        )
        .bind(address.to_checksum(None))
        .bind(nonce as i64)
        .execute(conn)
        .await?;
        Ok(())
    }
}
