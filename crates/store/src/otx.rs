//! Origin-transaction ledger operations.

use crate::{Pg, StoreError};
use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};
use custodia_primitives::{DispatchStatus, Otx, OtxType};
use sqlx::postgres::PgConnection;
use uuid::Uuid;

/// Page size ceiling for account timeline queries.
pub const MAX_PAGE_SIZE: u32 = 100;

const OTX_SELECT: &str = "SELECT otx.id, otx.tracking_id, otx.otx_type, otx.signer_account,
        otx.raw_tx, otx.tx_hash, otx.nonce, otx.replaced, otx.created_at, otx.updated_at,
        dispatch_tx.status, dispatch_tx.updated_at AS status_updated_at
   FROM otx
   JOIN dispatch_tx ON dispatch_tx.otx_id = otx.id";

/// Input record for a new ledger entry.
#[derive(Debug, Clone)]
pub struct NewOtx {
    /// Caller-supplied correlation token.
    pub tracking_id: Uuid,
    /// Intent category.
    pub otx_type: OtxType,
    /// The account whose key signed the raw transaction.
    pub signer_account: Address,
    /// EIP-2718 encoded signed transaction, `0x`-prefixed hex.
    pub raw_tx: String,
    /// Transaction hash of the signed payload.
    pub tx_hash: B256,
    /// Nonce consumed from the signer's allocation sequence.
    pub nonce: u64,
}

#[derive(sqlx::FromRow)]
struct OtxRow {
    id: i64,
    tracking_id: Uuid,
    otx_type: String,
    signer_account: String,
    raw_tx: String,
    tx_hash: String,
    nonce: i64,
    replaced: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    status: String,
    status_updated_at: DateTime<Utc>,
}

impl OtxRow {
    fn into_otx(self) -> Result<Otx, StoreError> {
        let otx_type = OtxType::parse(&self.otx_type)
            .ok_or_else(|| StoreError::Corrupt(format!("otx type: {}", self.otx_type)))?;
        let signer_account = self
            .signer_account
            .parse::<Address>()
            .map_err(|e| StoreError::Corrupt(format!("signer account: {e}")))?;
        let tx_hash = self
            .tx_hash
            .parse::<B256>()
            .map_err(|e| StoreError::Corrupt(format!("tx hash: {e}")))?;
        let status = DispatchStatus::parse(&self.status)
            .ok_or_else(|| StoreError::Corrupt(format!("dispatch status: {}", self.status)))?;
        Ok(Otx {
            id: self.id as u64,
            tracking_id: self.tracking_id,
            otx_type,
            signer_account,
            raw_tx: self.raw_tx,
            tx_hash,
            nonce: self.nonce as u64,
            replaced: self.replaced,
            status,
            created_at: self.created_at,
            // The ledger exposes the most recent touch of either row.
            updated_at: self.updated_at.max(self.status_updated_at),
        })
    }
}

fn collect(rows: Vec<OtxRow>) -> Result<Vec<Otx>, StoreError> {
    rows.into_iter().map(OtxRow::into_otx).collect()
}

impl Pg {
    /// Inserts a new origin transaction, returning its ledger id.
    pub async fn insert_otx(
        &self,
        conn: &mut PgConnection,
        otx: &NewOtx,
    ) -> Result<u64, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO otx (tracking_id, otx_type, signer_account, raw_tx, tx_hash, nonce)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(otx.tracking_id)
        .bind(otx.otx_type.as_str())
        .bind(otx.signer_account.to_checksum(None))
        .bind(&otx.raw_tx)
        .bind(otx.tx_hash.to_string())
        .bind(otx.nonce as i64)
        .fetch_one(conn)
        .await?;
        Ok(id as u64)
    }

    /// Creates the dispatch-status child row for a new origin transaction.
    pub async fn insert_dispatch(
        &self,
        conn: &mut PgConnection,
        otx_id: u64,
        status: DispatchStatus,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO dispatch_tx (otx_id, status) VALUES ($1, $2)")
            .bind(otx_id as i64)
            .bind(status.as_str())
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Transitions the dispatch status of an origin transaction.
    ///
    /// Terminal statuses are never overwritten; a transition attempt against
    /// one reports `false` so redelivered chain events stay idempotent.
    pub async fn update_dispatch(
        &self,
        conn: &mut PgConnection,
        otx_id: u64,
        status: DispatchStatus,
    ) -> Result<bool, StoreError> {
        let res = sqlx::query(
            "UPDATE dispatch_tx SET status = $2, updated_at = now()
             WHERE otx_id = $1
               AND status NOT IN ('SUCCESS', 'REVERTED', 'LOW_NONCE')",
        )
        .bind(otx_id as i64)
        .bind(status.as_str())
        .execute(conn)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Flags an origin transaction as superseded by a re-issued replacement.
    pub async fn mark_replaced(
        &self,
        conn: &mut PgConnection,
        otx_id: u64,
    ) -> Result<(), StoreError> {
        let res = sqlx::query(
            "UPDATE otx SET replaced = true, updated_at = now() WHERE id = $1",
        )
        .bind(otx_id as i64)
        .execute(conn)
        .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// All origin transactions for one intent, in ascending nonce order.
    pub async fn get_otx_by_tracking_id(
        &self,
        conn: &mut PgConnection,
        tracking_id: Uuid,
    ) -> Result<Vec<Otx>, StoreError> {
        let rows = sqlx::query_as::<_, OtxRow>(&format!(
            "{OTX_SELECT} WHERE otx.tracking_id = $1 ORDER BY otx.nonce ASC, otx.id ASC"
        ))
        .bind(tracking_id)
        .fetch_all(conn)
        .await?;
        collect(rows)
    }

    /// Looks up the origin transaction that produced `tx_hash`.
    pub async fn get_otx_by_tx_hash(
        &self,
        conn: &mut PgConnection,
        tx_hash: B256,
    ) -> Result<Option<Otx>, StoreError> {
        let row = sqlx::query_as::<_, OtxRow>(&format!(
            "{OTX_SELECT} WHERE otx.tx_hash = $1"
        ))
        .bind(tx_hash.to_string())
        .fetch_optional(conn)
        .await?;
        row.map(OtxRow::into_otx).transpose()
    }

    /// First page of an account's timeline, newest first.
    pub async fn get_otx_by_account(
        &self,
        conn: &mut PgConnection,
        account: Address,
        limit: u32,
    ) -> Result<Vec<Otx>, StoreError> {
        let rows = sqlx::query_as::<_, OtxRow>(&format!(
            "{OTX_SELECT} WHERE otx.signer_account = $1 ORDER BY otx.id DESC LIMIT $2"
        ))
        .bind(account.to_checksum(None))
        .bind(i64::from(limit.min(MAX_PAGE_SIZE)))
        .fetch_all(conn)
        .await?;
        collect(rows)
    }

    /// Timeline page strictly older than `cursor`, newest first.
    pub async fn get_otx_by_account_next(
        &self,
        conn: &mut PgConnection,
        account: Address,
        cursor: u64,
        limit: u32,
    ) -> Result<Vec<Otx>, StoreError> {
        let rows = sqlx::query_as::<_, OtxRow>(&format!(
            "{OTX_SELECT} WHERE otx.signer_account = $1 AND otx.id < $2
             ORDER BY otx.id DESC LIMIT $3"
        ))
        .bind(account.to_checksum(None))
        .bind(cursor as i64)
        .bind(i64::from(limit.min(MAX_PAGE_SIZE)))
        .fetch_all(conn)
        .await?;
        collect(rows)
    }

    /// Timeline window strictly newer than `cursor`, oldest first.
    pub async fn get_otx_by_account_previous(
        &self,
        conn: &mut PgConnection,
        account: Address,
        cursor: u64,
        limit: u32,
    ) -> Result<Vec<Otx>, StoreError> {
        let rows = sqlx::query_as::<_, OtxRow>(&format!(
            "{OTX_SELECT} WHERE otx.signer_account = $1 AND otx.id > $2
             ORDER BY otx.id ASC LIMIT $3"
        ))
        .bind(account.to_checksum(None))
        .bind(cursor as i64)
        .bind(i64::from(limit.min(MAX_PAGE_SIZE)))
        .fetch_all(conn)
        .await?;
        collect(rows)
    }

    /// Non-terminal origin transactions whose status has not moved for at
    /// least `stale_secs`. These are candidates for operator attention and
    /// retrier pickup.
    pub async fn get_failed_otx(
        &self,
        conn: &mut PgConnection,
        stale_secs: f64,
    ) -> Result<Vec<Otx>, StoreError> {
        let rows = sqlx::query_as::<_, OtxRow>(&format!(
            "{OTX_SELECT}
             WHERE dispatch_tx.status NOT IN ('SUCCESS', 'REVERTED', 'LOW_NONCE')
               AND dispatch_tx.updated_at < now() - make_interval(secs => $1)
             ORDER BY otx.id ASC"
        ))
        .bind(stale_secs)
        .fetch_all(conn)
        .await?;
        collect(rows)
    }

    /// `IN_NETWORK` origin transactions stale for at least `stale_secs`,
    /// awaiting a receipt sweep.
    pub async fn get_unconfirmed_otx(
        &self,
        conn: &mut PgConnection,
        stale_secs: f64,
    ) -> Result<Vec<Otx>, StoreError> {
        let rows = sqlx::query_as::<_, OtxRow>(&format!(
            "{OTX_SELECT}
             WHERE dispatch_tx.status = 'IN_NETWORK'
               AND dispatch_tx.updated_at < now() - make_interval(secs => $1)
             ORDER BY otx.id ASC"
        ))
        .bind(stale_secs)
        .fetch_all(conn)
        .await?;
        collect(rows)
    }
}
