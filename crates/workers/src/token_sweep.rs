//! ERC20 full-balance sweep intent handler.

use crate::{kind, WorkerContainer};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use anyhow::Result;
use async_trait::async_trait;
use custodia_chain::abi;
use custodia_primitives::OtxType;
use custodia_queue::{Job, JobHandler, JobOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Payload of a [kind::TOKEN_SWEEP] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSweepArgs {
    /// Intent correlation token.
    pub tracking_id: Uuid,
    /// Account being emptied.
    pub from: Address,
    /// Recipient of the full balance.
    pub to: Address,
    /// ERC20 contract.
    pub token_address: Address,
}

/// Signs and stages a `sweep` moving the entire token balance of `from` to
/// `to`.
#[derive(Debug)]
pub struct TokenSweepWorker {
    wc: Arc<WorkerContainer>,
}

impl TokenSweepWorker {
    /// Creates the handler.
    pub const fn new(wc: Arc<WorkerContainer>) -> Self {
        Self { wc }
    }
}

#[async_trait]
impl JobHandler for TokenSweepWorker {
    fn kind(&self) -> &'static str {
        kind::TOKEN_SWEEP
    }

    async fn run(&self, job: Job) -> Result<JobOutcome> {
        let args: TokenSweepArgs = job.decode_args()?;
        let gas = self.wc.gas_oracle.get();

        let mut tx = self.wc.store.begin().await?;

        let keypair = self.wc.store.load_keypair(&mut tx, args.from).await?;
        let signer = keypair.signer()?;

        let input = abi::sweepCall { to: args.to }.abi_encode();
        let staged = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::TokenSweep,
                &signer,
                args.from,
                args.token_address,
                input.into(),
                U256::ZERO,
                &gas,
            )
            .await?;

        let spec = self.wc.dispatch_spec(args.tracking_id, &staged, 1)?;
        self.wc.queue.insert_many(&mut tx, vec![spec]).await?;

        tx.commit().await?;
        Ok(JobOutcome::Complete)
    }
}
