//! Raw transaction submission.

use crate::{kind, retrier::RetrierArgs, WorkerContainer};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use custodia_chain::{classify_dispatch_error, decode_raw_tx};
use custodia_primitives::DispatchStatus;
use custodia_queue::{InsertOpts, Job, JobHandler, JobOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Payload of a [kind::DISPATCH] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchArgs {
    /// Intent correlation token.
    pub tracking_id: Uuid,
    /// Ledger id of the origin transaction being submitted.
    pub otx_id: u64,
    /// EIP-2718 encoded signed transaction, `0x`-prefixed hex.
    pub raw_tx: String,
}

/// Submits a staged raw transaction to the RPC node and records the outcome.
///
/// A node acceptance moves the origin transaction to `IN_NETWORK`. A
/// structured node error is classified into a chain-error status, a retrier
/// is enqueued, and the job is cancelled because the classification already
/// decided the follow-up. A transport failure records `NETWORK_ERROR` and
/// returns a retryable error so the queue re-attempts with backoff.
#[derive(Debug)]
pub struct DispatchWorker {
    wc: Arc<WorkerContainer>,
}

impl DispatchWorker {
    /// Creates the handler.
    pub const fn new(wc: Arc<WorkerContainer>) -> Self {
        Self { wc }
    }

    async fn record_status(
        &self,
        args: &DispatchArgs,
        status: DispatchStatus,
    ) -> Result<()> {
        let mut tx = self.wc.store.begin().await?;
        self.wc.store.update_dispatch(&mut tx, args.otx_id, status).await?;
        self.wc.emit(args.tracking_id, status).await;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl JobHandler for DispatchWorker {
    fn kind(&self) -> &'static str {
        kind::DISPATCH
    }

    async fn run(&self, job: Job) -> Result<JobOutcome> {
        let args: DispatchArgs = job.decode_args()?;

        // Refuse to hand the node something the ledger cannot account for.
        decode_raw_tx(&args.raw_tx)?;

        match self.wc.chain.send_raw_transaction(&args.raw_tx).await {
            Ok(tx_hash) => {
                debug!(target: "worker", %tx_hash, otx_id = args.otx_id, "transaction in network");
                self.record_status(&args, DispatchStatus::InNetwork).await?;
                Ok(JobOutcome::Complete)
            }
            Err(err) => {
                let status = classify_dispatch_error(&err);
                if status == DispatchStatus::NetworkError {
                    self.record_status(&args, status).await?;
                    return Err(anyhow!(err).context("rpc endpoint unreachable"));
                }

                warn!(
                    target: "worker",
                    otx_id = args.otx_id,
                    %status,
                    "chain rejected transaction: {err}"
                );
                let mut tx = self.wc.store.begin().await?;
                self.wc.store.update_dispatch(&mut tx, args.otx_id, status).await?;
                self.wc.emit(args.tracking_id, status).await;
                self.wc
                    .queue
                    .insert_tx(
                        &mut tx,
                        kind::RETRIER,
                        &RetrierArgs { tracking_id: args.tracking_id },
                        InsertOpts::default().max_attempts(1),
                    )
                    .await?;
                tx.commit().await?;

                // Classification already decided the follow-up; the queue
                // must not replay this job.
                Ok(JobOutcome::Cancel(format!("chain error classified as {status}")))
            }
        }
    }
}
