//! Pool deposit intent handler.

use crate::{gas_refill::GasRefillArgs, kind, WorkerContainer};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use anyhow::Result;
use async_trait::async_trait;
use custodia_chain::abi;
use custodia_primitives::{bump_approval, parse_amount, OtxType};
use custodia_queue::{InsertOpts, Job, JobHandler, JobOutcome, JobSpec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Payload of a [kind::POOL_DEPOSIT] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDepositArgs {
    /// Intent correlation token.
    pub tracking_id: Uuid,
    /// Depositing custodial account.
    pub from: Address,
    /// Token being seeded into the pool.
    pub token_address: Address,
    /// The liquidity pool.
    pub pool_address: Address,
    /// Decimal token amount.
    pub amount: String,
}

/// Same approval dance as a swap, with `deposit(token, amount)` as the final
/// step instead of a withdrawal.
#[derive(Debug)]
pub struct PoolDepositWorker {
    wc: Arc<WorkerContainer>,
}

impl PoolDepositWorker {
    /// Creates the handler.
    pub const fn new(wc: Arc<WorkerContainer>) -> Self {
        Self { wc }
    }
}

#[async_trait]
impl JobHandler for PoolDepositWorker {
    fn kind(&self) -> &'static str {
        kind::POOL_DEPOSIT
    }

    async fn run(&self, job: Job) -> Result<JobOutcome> {
        let args: PoolDepositArgs = job.decode_args()?;
        let amount = parse_amount(&args.amount)?;
        let approval = bump_approval(amount)?;
        let gas = self.wc.gas_oracle.get();

        let mut tx = self.wc.store.begin().await?;

        let keypair = self.wc.store.load_keypair(&mut tx, args.from).await?;
        let signer = keypair.signer()?;

        let reset = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::TokenApprove,
                &signer,
                args.from,
                args.token_address,
                abi::approveCall { spender: args.pool_address, value: U256::ZERO }
                    .abi_encode()
                    .into(),
                U256::ZERO,
                &gas,
            )
            .await?;

        let approve = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::TokenApprove,
                &signer,
                args.from,
                args.token_address,
                abi::approveCall { spender: args.pool_address, value: approval }
                    .abi_encode()
                    .into(),
                U256::ZERO,
                &gas,
            )
            .await?;

        let deposit = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::PoolDeposit,
                &signer,
                args.from,
                args.pool_address,
                abi::depositCall { inToken: args.token_address, value: amount }
                    .abi_encode()
                    .into(),
                U256::ZERO,
                &gas,
            )
            .await?;

        self.wc
            .queue
            .insert_many(
                &mut tx,
                vec![
                    self.wc.dispatch_spec(args.tracking_id, &reset, 1)?,
                    self.wc.dispatch_spec(args.tracking_id, &approve, 2)?,
                    self.wc.dispatch_spec(args.tracking_id, &deposit, 3)?,
                    JobSpec::new(
                        kind::GAS_REFILL,
                        &GasRefillArgs { tracking_id: args.tracking_id, address: args.from },
                        InsertOpts::priority(4),
                    )?,
                ],
            )
            .await?;

        tx.commit().await?;
        Ok(JobOutcome::Complete)
    }
}
