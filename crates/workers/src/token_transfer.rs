//! ERC20 transfer intent handler.

use crate::{gas_refill::GasRefillArgs, kind, WorkerContainer};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use anyhow::Result;
use async_trait::async_trait;
use custodia_chain::abi;
use custodia_primitives::{parse_amount, OtxType};
use custodia_queue::{InsertOpts, Job, JobHandler, JobOutcome, JobSpec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Payload of a [kind::TOKEN_TRANSFER] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransferArgs {
    /// Intent correlation token.
    pub tracking_id: Uuid,
    /// Sending custodial account.
    pub from: Address,
    /// Recipient.
    pub to: Address,
    /// ERC20 contract.
    pub token_address: Address,
    /// Decimal token amount.
    pub amount: String,
}

/// Signs and stages an ERC20 `transfer`, then a best-effort gas refill for
/// the sender.
#[derive(Debug)]
pub struct TokenTransferWorker {
    wc: Arc<WorkerContainer>,
}

impl TokenTransferWorker {
    /// Creates the handler.
    pub const fn new(wc: Arc<WorkerContainer>) -> Self {
        Self { wc }
    }
}

#[async_trait]
impl JobHandler for TokenTransferWorker {
    fn kind(&self) -> &'static str {
        kind::TOKEN_TRANSFER
    }

    async fn run(&self, job: Job) -> Result<JobOutcome> {
        let args: TokenTransferArgs = job.decode_args()?;
        let amount = parse_amount(&args.amount)?;
        let gas = self.wc.gas_oracle.get();

        let mut tx = self.wc.store.begin().await?;

        let keypair = self.wc.store.load_keypair(&mut tx, args.from).await?;
        let signer = keypair.signer()?;

        let input = abi::transferCall { to: args.to, value: amount }.abi_encode();
        let staged = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::TokenTransfer,
                &signer,
                args.from,
                args.token_address,
                input.into(),
                U256::ZERO,
                &gas,
            )
            .await?;

        self.wc
            .queue
            .insert_many(
                &mut tx,
                vec![
                    self.wc.dispatch_spec(args.tracking_id, &staged, 1)?,
                    JobSpec::new(
                        kind::GAS_REFILL,
                        &GasRefillArgs { tracking_id: args.tracking_id, address: args.from },
                        InsertOpts::priority(2),
                    )?,
                ],
            )
            .await?;

        tx.commit().await?;
        Ok(JobOutcome::Complete)
    }
}
