//! Arbitrary user-signed call intent handler.

use crate::{gas_refill::GasRefillArgs, kind, WorkerContainer};
use alloy_primitives::{hex, Address};
use anyhow::{Context, Result};
use async_trait::async_trait;
use custodia_primitives::{parse_amount, OtxType};
use custodia_queue::{InsertOpts, Job, JobHandler, JobOutcome, JobSpec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Payload of a [kind::GENERIC_SIGN] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericSignArgs {
    /// Intent correlation token.
    pub tracking_id: Uuid,
    /// Signing custodial account; the user, not the master.
    pub from: Address,
    /// Call target.
    pub to: Address,
    /// Decimal gas-token value to attach.
    pub value: String,
    /// Pre-encoded calldata, hex.
    pub data: String,
}

/// Signs an arbitrary call with the user's own key and stages it together
/// with a best-effort gas refill.
#[derive(Debug)]
pub struct GenericSignWorker {
    wc: Arc<WorkerContainer>,
}

impl GenericSignWorker {
    /// Creates the handler.
    pub const fn new(wc: Arc<WorkerContainer>) -> Self {
        Self { wc }
    }
}

#[async_trait]
impl JobHandler for GenericSignWorker {
    fn kind(&self) -> &'static str {
        kind::GENERIC_SIGN
    }

    async fn run(&self, job: Job) -> Result<JobOutcome> {
        let args: GenericSignArgs = job.decode_args()?;
        let value = parse_amount(&args.value)?;
        let data = hex::decode(&args.data).context("malformed calldata")?;
        let gas = self.wc.gas_oracle.get();

        let mut tx = self.wc.store.begin().await?;

        let keypair = self.wc.store.load_keypair(&mut tx, args.from).await?;
        let signer = keypair.signer()?;

        let staged = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::GenericSign,
                &signer,
                args.from,
                args.to,
                data.into(),
                value,
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
