//! Chain-error recovery.

use crate::{gas_refill::GasRefillArgs, kind, WorkerContainer};
use anyhow::Result;
use async_trait::async_trait;
use custodia_chain::{replacement_for, sign_execution_tx};
use custodia_primitives::{DispatchStatus, Otx};
use custodia_queue::{InsertOpts, Job, JobHandler, JobOutcome};
use custodia_store::NewOtx;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Payload of a [kind::RETRIER] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrierArgs {
    /// The intent whose sequence hit a chain error.
    pub tracking_id: Uuid,
}

/// Walks an intent's origin transactions in ascending nonce order and
/// recovers the chain-error statuses at the head of the sequence.
///
/// `NO_GAS` requests a master-signed top-up and leaves the transaction for a
/// later pass; the underpriced statuses re-sign a 15% fee-bumped replacement
/// under the same nonce; `LOW_NONCE` is fatal and only surfaced. The walk
/// stops at the first status that is not a chain error.
#[derive(Debug)]
pub struct RetrierWorker {
    wc: Arc<WorkerContainer>,
}

impl RetrierWorker {
    /// Creates the handler.
    pub const fn new(wc: Arc<WorkerContainer>) -> Self {
        Self { wc }
    }

    async fn reissue_bumped(
        &self,
        tx: &mut custodia_store::PgTx,
        tracking_id: Uuid,
        otx: &Otx,
    ) -> Result<()> {
        let replacement = replacement_for(&otx.raw_tx)?;
        let keypair = self.wc.store.load_keypair(&mut *tx, otx.signer_account).await?;
        let signer = keypair.signer()?;
        let signed = sign_execution_tx(
            &signer,
            self.wc.chain.chain_id(),
            replacement.to,
            replacement.input.clone(),
            replacement.value,
            &replacement.gas(),
            replacement.nonce,
        )?;

        // History is preserved: the stuck transaction stays on the ledger
        // flagged replaced, the bumped one gets a fresh row.
        self.wc.store.mark_replaced(&mut *tx, otx.id).await?;
        let otx_id = self
            .wc
            .store
            .insert_otx(
                &mut *tx,
                &NewOtx {
                    tracking_id,
                    otx_type: otx.otx_type,
                    signer_account: otx.signer_account,
                    raw_tx: signed.raw_hex.clone(),
                    tx_hash: signed.tx_hash,
                    nonce: signed.nonce,
                },
            )
            .await?;
        self.wc.store.insert_dispatch(&mut *tx, otx_id, DispatchStatus::Pending).await?;
        self.wc.emit(tracking_id, DispatchStatus::Pending).await;

        self.wc
            .queue
            .insert_tx(
                &mut *tx,
                kind::DISPATCH,
                &crate::DispatchArgs { tracking_id, otx_id, raw_tx: signed.raw_hex },
                InsertOpts::priority(1),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl JobHandler for RetrierWorker {
    fn kind(&self) -> &'static str {
        kind::RETRIER
    }

    async fn run(&self, job: Job) -> Result<JobOutcome> {
        let args: RetrierArgs = job.decode_args()?;

        let mut tx = self.wc.store.begin().await?;
        let sequence =
            self.wc.store.get_otx_by_tracking_id(&mut tx, args.tracking_id).await?;
        if sequence.is_empty() {
            return Ok(JobOutcome::Cancel(format!(
                "no otx found for tracking id {}",
                args.tracking_id
            )));
        }

        for otx in sequence.iter().filter(|otx| !otx.replaced) {
            if !otx.status.is_chain_error() {
                debug!(
                    target: "worker",
                    otx_id = otx.id,
                    status = %otx.status,
                    "retrier stopping at non-chain-error status"
                );
                break;
            }

            match otx.status {
                DispatchStatus::NoGas => {
                    warn!(
                        target: "worker",
                        account = %otx.signer_account,
                        "dispatch ran out of gas, requesting top-up"
                    );
                    self.wc
                        .queue
                        .insert_tx(
                            &mut tx,
                            kind::GAS_REFILL,
                            &GasRefillArgs {
                                tracking_id: args.tracking_id,
                                address: otx.signer_account,
                            },
                            InsertOpts::default(),
                        )
                        .await?;
                }
                DispatchStatus::LowGasPrice | DispatchStatus::ReplacementUnderpriced => {
                    warn!(
                        target: "worker",
                        account = %otx.signer_account,
                        reason = %otx.status,
                        "dispatch underpriced, re-issuing with bumped fee cap"
                    );
                    self.reissue_bumped(&mut tx, args.tracking_id, otx).await?;
                }
                DispatchStatus::LowNonce => {
                    error!(
                        target: "worker",
                        account = %otx.signer_account,
                        otx_id = otx.id,
                        "nonce already consumed on chain; not replaying"
                    );
                }
                // is_chain_error admits exactly the arms above.
                _ => {}
            }
        }

        tx.commit().await?;
        Ok(JobOutcome::Complete)
    }
}
