//! Standard ERC20 deployment intent handler.

use crate::{contracts, kind, WorkerContainer};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use anyhow::Result;
use async_trait::async_trait;
use custodia_chain::{abi, GasSettings};
use custodia_primitives::{parse_amount, OtxType};
use custodia_queue::{Job, JobHandler, JobOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Payload of a [kind::TOKEN_DEPLOY] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDeployArgs {
    /// Intent correlation token.
    pub tracking_id: Uuid,
    /// Token name.
    pub name: String,
    /// Token symbol.
    pub symbol: String,
    /// Token decimals.
    pub decimals: u8,
    /// Decimal amount minted to the initial mintee.
    pub initial_supply: String,
    /// Receiver of the initial supply.
    pub initial_mintee: Address,
    /// Final owner the contract is handed to.
    pub owner: Address,
}

/// Deploys an ERC20 and wires it up in one master-signed sequence:
/// deploy, add to the token index, mint the initial supply, hand over
/// ownership. The deployment address is precomputed from the master's nonce
/// so the follow-ups can be signed before the deploy confirms.
#[derive(Debug)]
pub struct TokenDeployWorker {
    wc: Arc<WorkerContainer>,
}

impl TokenDeployWorker {
    /// Creates the handler.
    pub const fn new(wc: Arc<WorkerContainer>) -> Self {
        Self { wc }
    }
}

#[async_trait]
impl JobHandler for TokenDeployWorker {
    fn kind(&self) -> &'static str {
        kind::TOKEN_DEPLOY
    }

    async fn run(&self, job: Job) -> Result<JobOutcome> {
        let args: TokenDeployArgs = job.decode_args()?;
        let initial_supply = parse_amount(&args.initial_supply)?;
        let gas = self.wc.gas_oracle.get();
        let deploy_gas = GasSettings { gas_limit: contracts::DEPLOY_GAS_LIMIT, ..gas };

        let init_code = contracts::erc20_init_code(&args.name, &args.symbol, args.decimals)?;

        let mut tx = self.wc.store.begin().await?;

        let master = self.wc.store.load_master_keypair(&mut tx).await?;
        let signer = master.signer()?;

        let deploy = self
            .wc
            .stage_deploy(
                &mut tx,
                args.tracking_id,
                OtxType::StandardTokenDeploy,
                &signer,
                master.public_address,
                init_code,
                &deploy_gas,
            )
            .await?;
        let token_address = master.public_address.create(deploy.nonce);

        let index_add = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::IndexAdd,
                &signer,
                master.public_address,
                self.wc.registry.token_index,
                abi::addCall { subject: token_address }.abi_encode().into(),
                U256::ZERO,
                &gas,
            )
            .await?;

        let mint = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::TokenTransfer,
                &signer,
                master.public_address,
                token_address,
                abi::mintToCall { to: args.initial_mintee, value: initial_supply }
                    .abi_encode()
                    .into(),
                U256::ZERO,
                &gas,
            )
            .await?;

        let handover = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::TransferOwnership,
                &signer,
                master.public_address,
                token_address,
                abi::transferOwnershipCall { newOwner: args.owner }.abi_encode().into(),
                U256::ZERO,
                &gas,
            )
            .await?;

        self.wc
            .queue
            .insert_many(
                &mut tx,
                vec![
                    self.wc.dispatch_spec(args.tracking_id, &deploy, 1)?,
                    self.wc.dispatch_spec(args.tracking_id, &index_add, 2)?,
                    self.wc.dispatch_spec(args.tracking_id, &mint, 3)?,
                    self.wc.dispatch_spec(args.tracking_id, &handover, 4)?,
                ],
            )
            .await?;

        tx.commit().await?;
        Ok(JobOutcome::Complete)
    }
}
