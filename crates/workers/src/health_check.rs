//! Periodic receipt sweep.

use crate::{dispatch::DispatchArgs, kind, WorkerContainer};
use anyhow::Result;
use async_trait::async_trait;
use custodia_primitives::DispatchStatus;
use custodia_queue::{InsertOpts, Job, JobHandler, JobOutcome};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Cadence of the periodic sweep.
pub(crate) const SWEEP_INTERVAL: Duration = Duration::from_secs(120);

/// `IN_NETWORK` transactions untouched for this long get a receipt lookup.
const UNCONFIRMED_AFTER_SECS: f64 = 60.0;

/// Non-terminal transactions untouched for this long are surfaced for the
/// operator.
const FAILED_AFTER_SECS: f64 = 300.0;

/// Safety net behind the tracker: sweeps receipts for stale `IN_NETWORK`
/// transactions and finalizes the confirmed ones, then surfaces anything
/// non-terminal that has stopped moving.
///
/// Every write is per-transaction idempotent, so cancelling the sweep midway
/// leaves no partial-state hazard.
#[derive(Debug)]
pub struct HealthCheckWorker {
    wc: Arc<WorkerContainer>,
}

impl HealthCheckWorker {
    /// Creates the handler.
    pub const fn new(wc: Arc<WorkerContainer>) -> Self {
        Self { wc }
    }
}

#[async_trait]
impl JobHandler for HealthCheckWorker {
    fn kind(&self) -> &'static str {
        kind::HEALTH_CHECK
    }

    async fn run(&self, _job: Job) -> Result<JobOutcome> {
        // Snapshot the stale set first; receipts are fetched with no open
        // transaction so no lock outlives an RPC call.
        let unconfirmed = {
            let mut tx = self.wc.store.begin().await?;
            let v = self.wc.store.get_unconfirmed_otx(&mut tx, UNCONFIRMED_AFTER_SECS).await?;
            tx.commit().await?;
            v
        };

        if unconfirmed.is_empty() {
            debug!(target: "worker", "receipt sweep found nothing stale");
        }

        for otx in unconfirmed {
            let receipt = match self.wc.chain.transaction_receipt(otx.tx_hash).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    warn!(target: "worker", tx_hash = %otx.tx_hash, "receipt lookup failed: {e}");
                    continue;
                }
            };
            let Some(receipt) = receipt else { continue };
            if !receipt.status() {
                continue;
            }

            let mut tx = self.wc.store.begin().await?;
            let transitioned =
                self.wc.store.update_dispatch(&mut tx, otx.id, DispatchStatus::Success).await?;
            tx.commit().await?;
            if transitioned {
                debug!(
                    target: "worker",
                    otx_id = otx.id,
                    tx_hash = %otx.tx_hash,
                    "receipt sweep confirmed transaction"
                );
                self.wc.emit(otx.tracking_id, DispatchStatus::Success).await;
            }
        }

        let failed = {
            let mut tx = self.wc.store.begin().await?;
            let v = self.wc.store.get_failed_otx(&mut tx, FAILED_AFTER_SECS).await?;
            tx.commit().await?;
            v
        };
        for otx in failed {
            warn!(
                target: "worker",
                otx_id = otx.id,
                tracking_id = %otx.tracking_id,
                account = %otx.signer_account,
                status = %otx.status,
                "stalled origin transaction"
            );
            // A PENDING row this old has lost its dispatch job (crash between
            // commit and drain, or a discarded job); hand it back to the
            // dispatcher. Re-sending an already-accepted payload classifies
            // as LOW_NONCE and terminates there.
            if otx.status == DispatchStatus::Pending {
                self.wc
                    .queue
                    .insert(
                        kind::DISPATCH,
                        &DispatchArgs {
                            tracking_id: otx.tracking_id,
                            otx_id: otx.id,
                            raw_tx: otx.raw_tx.clone(),
                        },
                        InsertOpts::default(),
                    )
                    .await?;
            }
        }

        Ok(JobOutcome::Complete)
    }
}
