//! Master-signed gas top-up handler.

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
use tracing::{info, warn};
use uuid::Uuid;

/// Payload of a [kind::GAS_REFILL] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasRefillArgs {
    /// Intent correlation token of the sequence that requested the refill.
    pub tracking_id: Uuid,
    /// Account to top up.
    pub address: Address,
}

/// Checks the faucet's cooldown and eligibility gates and, when both pass,
/// stages a master-signed `giveTo` for the account.
///
/// Refills are best-effort follow-ups: an ineligible account completes the
/// job without staging anything.
#[derive(Debug)]
pub struct GasRefillWorker {
    wc: Arc<WorkerContainer>,
}

impl GasRefillWorker {
    /// Creates the handler.
    pub const fn new(wc: Arc<WorkerContainer>) -> Self {
        Self { wc }
    }
}

#[async_trait]
impl JobHandler for GasRefillWorker {
    fn kind(&self) -> &'static str {
        kind::GAS_REFILL
    }

    async fn run(&self, job: Job) -> Result<JobOutcome> {
        let args: GasRefillArgs = job.decode_args()?;
        let faucet = self.wc.registry.gas_faucet;

        // Faucet gates are read before any transaction is opened; no row
        // locks are held across RPC.
        let next_time = self
            .wc
            .chain
            .call_function(faucet, abi::nextTimeCall { subject: args.address })
            .await?
            ._0;
        let now = U256::from(chrono::Utc::now().timestamp().max(0) as u64);
        if next_time > now {
            info!(target: "worker", address = %args.address, "gas refill not needed");
            return Ok(JobOutcome::Complete);
        }

        let eligible = self
            .wc
            .chain
            .call_function(faucet, abi::checkCall { subject: args.address })
            .await?
            ._0;
        if !eligible {
            warn!(target: "worker", address = %args.address, "gas faucet check failed");
            return Ok(JobOutcome::Complete);
        }

        let gas = self.wc.gas_oracle.get();

        let mut tx = self.wc.store.begin().await?;

        let master = self.wc.store.load_master_keypair(&mut tx).await?;
        let signer = master.signer()?;

        let input = abi::giveToCall { subject: args.address }.abi_encode();
        let staged = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::GasRefill,
                &signer,
                master.public_address,
                faucet,
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
