//! The flat component registry handlers run against.

use crate::{dispatch::DispatchArgs, ens::EnsClient, kind};
use alloy_primitives::{Address, Bytes, B256, U256};
use anyhow::Result;
use custodia_chain::{sign_deploy_tx, sign_execution_tx, ChainClient, GasSettings, SignedTx};
use custodia_events::EventPub;
use custodia_gas::GasOracle;
use custodia_primitives::{DispatchStatus, Event, OtxType};
use custodia_queue::{InsertOpts, JobSpec, Queue};
use custodia_store::{NewOtx, Pg};
use sqlx::postgres::PgConnection;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Well-known contract addresses the workers call into.
#[derive(Debug, Clone, Copy)]
pub struct ContractRegistry {
    /// Custodial registration proxy; `register` is called through it.
    pub registration_proxy: Address,
    /// Gas faucet handing out top-ups via `giveTo`.
    pub gas_faucet: Address,
    /// Global token index new ERC20 deployments are added to.
    pub token_index: Address,
    /// Global pool index new pool deployments are added to.
    pub pool_index: Address,
}

/// Everything an intent handler needs, wired once at startup and passed to
/// the handlers by reference.
pub struct WorkerContainer {
    /// Shared persistence handle.
    pub store: Pg,
    /// Durable queue client for follow-up jobs.
    pub queue: Queue,
    /// Gas settings source.
    pub gas_oracle: Arc<dyn GasOracle>,
    /// Shared RPC client.
    pub chain: ChainClient,
    /// Outbound event publisher.
    pub publisher: EventPub,
    /// Well-known contract addresses.
    pub registry: ContractRegistry,
    /// Optional best-effort ENS registration client.
    pub ens: Option<EnsClient>,
}

impl std::fmt::Debug for WorkerContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerContainer").field("registry", &self.registry).finish_non_exhaustive()
    }
}

/// A signed transaction staged on the ledger, awaiting its dispatch job.
#[derive(Debug, Clone)]
pub(crate) struct StagedOtx {
    pub otx_id: u64,
    pub raw_hex: String,
    #[allow(dead_code)]
    pub tx_hash: B256,
    pub nonce: u64,
}

impl WorkerContainer {
    /// Signs a contract execution, records the origin transaction with a
    /// `PENDING` dispatch row and emits the `PENDING` event. The caller
    /// enqueues the dispatch job so sequences control their priorities.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn stage_execution(
        &self,
        conn: &mut PgConnection,
        tracking_id: Uuid,
        otx_type: OtxType,
        signer: &alloy_signer_local::PrivateKeySigner,
        signer_account: Address,
        to: Address,
        input: Bytes,
        value: U256,
        gas: &GasSettings,
    ) -> Result<StagedOtx> {
        let nonce = self.store.acquire_nonce(conn, signer_account).await?;
        let signed =
            sign_execution_tx(signer, self.chain.chain_id(), to, input, value, gas, nonce)?;
        self.record_signed(conn, tracking_id, otx_type, signer_account, signed).await
    }

    /// Signs a contract creation and records it like [Self::stage_execution].
    /// The consumed nonce is reported back so callers can precompute the
    /// deployment address for follow-up transactions.
    pub(crate) async fn stage_deploy(
        &self,
        conn: &mut PgConnection,
        tracking_id: Uuid,
        otx_type: OtxType,
        signer: &alloy_signer_local::PrivateKeySigner,
        signer_account: Address,
        init_code: Bytes,
        gas: &GasSettings,
    ) -> Result<StagedOtx> {
        let nonce = self.store.acquire_nonce(conn, signer_account).await?;
        let signed = sign_deploy_tx(signer, self.chain.chain_id(), init_code, gas, nonce)?;
        self.record_signed(conn, tracking_id, otx_type, signer_account, signed).await
    }

    async fn record_signed(
        &self,
        conn: &mut PgConnection,
        tracking_id: Uuid,
        otx_type: OtxType,
        signer_account: Address,
        signed: SignedTx,
    ) -> Result<StagedOtx> {
        let otx_id = self
            .store
            .insert_otx(
                conn,
                &NewOtx {
                    tracking_id,
                    otx_type,
                    signer_account,
                    raw_tx: signed.raw_hex.clone(),
                    tx_hash: signed.tx_hash,
                    nonce: signed.nonce,
                },
            )
            .await?;
        self.store.insert_dispatch(conn, otx_id, DispatchStatus::Pending).await?;
        self.emit(tracking_id, DispatchStatus::Pending).await;
        Ok(StagedOtx {
            otx_id,
            raw_hex: signed.raw_hex,
            tx_hash: signed.tx_hash,
            nonce: signed.nonce,
        })
    }

    /// Publishes a status event, logging instead of failing on error.
    pub(crate) async fn emit(&self, tracking_id: Uuid, status: DispatchStatus) {
        if let Err(e) = self.publisher.send(Event::new(tracking_id, status)).await {
            warn!(target: "worker", %tracking_id, %status, "event publish failed: {e}");
        }
    }

    /// Builds the dispatch-job spec for a staged origin transaction.
    pub(crate) fn dispatch_spec(
        &self,
        tracking_id: Uuid,
        staged: &StagedOtx,
        priority: i16,
    ) -> Result<JobSpec> {
        Ok(JobSpec::new(
            kind::DISPATCH,
            &DispatchArgs {
                tracking_id,
                otx_id: staged.otx_id,
                raw_tx: staged.raw_hex.clone(),
            },
            InsertOpts::priority(priority),
        )?)
    }
}
