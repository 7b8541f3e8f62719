//! Account creation intent handler.

use crate::{kind, WorkerContainer};
use alloy_sol_types::SolCall;
use anyhow::Result;
use async_trait::async_trait;
use custodia_chain::abi;
use custodia_primitives::{KeyPair, OtxType};
use custodia_queue::{Job, JobHandler, JobOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Payload of a [kind::ACCOUNT_CREATE] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreateArgs {
    /// Intent correlation token.
    pub tracking_id: Uuid,
    /// The freshly generated keypair, still inactive.
    pub keypair: KeyPair,
}

/// Persists the inactive keypair and stages its master-signed on-chain
/// registration. The event source flips the key active once the tracker
/// confirms the registration.
#[derive(Debug)]
pub struct AccountCreateWorker {
    wc: Arc<WorkerContainer>,
}

impl AccountCreateWorker {
    /// Creates the handler.
    pub const fn new(wc: Arc<WorkerContainer>) -> Self {
        Self { wc }
    }
}

#[async_trait]
impl JobHandler for AccountCreateWorker {
    fn kind(&self) -> &'static str {
        kind::ACCOUNT_CREATE
    }

    async fn run(&self, job: Job) -> Result<JobOutcome> {
        let args: AccountCreateArgs = job.decode_args()?;
        let gas = self.wc.gas_oracle.get();

        let mut tx = self.wc.store.begin().await?;

        self.wc.store.insert_keypair(&mut tx, &args.keypair).await?;

        let master = self.wc.store.load_master_keypair(&mut tx).await?;
        let signer = master.signer()?;

        let input = abi::registerCall { subject: args.keypair.public_address }.abi_encode();
        let staged = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::AccountRegister,
                &signer,
                master.public_address,
                self.wc.registry.registration_proxy,
                input.into(),
                alloy_primitives::U256::ZERO,
                &gas,
            )
            .await?;

        let spec = self.wc.dispatch_spec(args.tracking_id, &staged, 1)?;
        self.wc.queue.insert_many(&mut tx, vec![spec]).await?;

        tx.commit().await?;
        Ok(JobOutcome::Complete)
    }
}
