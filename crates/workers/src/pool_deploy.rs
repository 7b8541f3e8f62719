//! Liquidity pool suite deployment intent handler.

use crate::{contracts, ens, kind, WorkerContainer};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use anyhow::Result;
use async_trait::async_trait;
use custodia_chain::{abi, GasSettings};
use custodia_primitives::OtxType;
use custodia_queue::{Job, JobHandler, JobOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Payload of a [kind::POOL_DEPLOY] job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDeployArgs {
    /// Intent correlation token.
    pub tracking_id: Uuid,
    /// Pool name; also the ENS hint.
    pub name: String,
    /// Pool symbol.
    pub symbol: String,
    /// Token decimals the pool accounts in.
    pub decimals: u8,
    /// Final owner the contract suite is handed to.
    pub owner: Address,
}

/// Deploys a full pool suite under the master key.
///
/// Four contract creations go out at priority 1 (the pool's own token index,
/// a transfer limiter, the swap pool and a price index quoter, every address
/// precomputed from the master's nonces), the pool joins the global pool
/// index at priority 2, the quoter is attached at priority 3 and all four
/// ownerships are handed over at priority 4. ENS registration of the pool
/// name is fired after commit and never joins the accepting transaction.
#[derive(Debug)]
pub struct PoolDeployWorker {
    wc: Arc<WorkerContainer>,
}

impl PoolDeployWorker {
    /// Creates the handler.
    pub const fn new(wc: Arc<WorkerContainer>) -> Self {
        Self { wc }
    }
}

#[async_trait]
impl JobHandler for PoolDeployWorker {
    fn kind(&self) -> &'static str {
        kind::POOL_DEPLOY
    }

    async fn run(&self, job: Job) -> Result<JobOutcome> {
        let args: PoolDeployArgs = job.decode_args()?;
        let gas = self.wc.gas_oracle.get();
        let deploy_gas = GasSettings { gas_limit: contracts::DEPLOY_GAS_LIMIT, ..gas };

        let mut tx = self.wc.store.begin().await?;

        let master = self.wc.store.load_master_keypair(&mut tx).await?;
        let signer = master.signer()?;
        let deployer = master.public_address;

        // The pool's private token registry and limiter go first; their
        // addresses feed the pool constructor.
        let token_index = self
            .wc
            .stage_deploy(
                &mut tx,
                args.tracking_id,
                OtxType::PoolDeploy,
                &signer,
                deployer,
                contracts::token_index_init_code()?,
                &deploy_gas,
            )
            .await?;
        let token_index_address = deployer.create(token_index.nonce);

        let limiter = self
            .wc
            .stage_deploy(
                &mut tx,
                args.tracking_id,
                OtxType::PoolDeploy,
                &signer,
                deployer,
                contracts::limiter_init_code()?,
                &deploy_gas,
            )
            .await?;
        let limiter_address = deployer.create(limiter.nonce);

        let pool = self
            .wc
            .stage_deploy(
                &mut tx,
                args.tracking_id,
                OtxType::PoolDeploy,
                &signer,
                deployer,
                contracts::swap_pool_init_code(
                    &args.name,
                    &args.symbol,
                    args.decimals,
                    token_index_address,
                    limiter_address,
                )?,
                &deploy_gas,
            )
            .await?;
        let pool_address = deployer.create(pool.nonce);

        let quoter = self
            .wc
            .stage_deploy(
                &mut tx,
                args.tracking_id,
                OtxType::PoolDeploy,
                &signer,
                deployer,
                contracts::quoter_init_code(token_index_address)?,
                &deploy_gas,
            )
            .await?;
        let quoter_address = deployer.create(quoter.nonce);

        let index_add = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::IndexAdd,
                &signer,
                deployer,
                self.wc.registry.pool_index,
                abi::addCall { subject: pool_address }.abi_encode().into(),
                U256::ZERO,
                &gas,
            )
            .await?;

        let set_quoter = self
            .wc
            .stage_execution(
                &mut tx,
                args.tracking_id,
                OtxType::SetQuoter,
                &signer,
                deployer,
                pool_address,
                abi::setQuoterCall { quoter: quoter_address }.abi_encode().into(),
                U256::ZERO,
                &gas,
            )
            .await?;

        let mut handovers = Vec::with_capacity(4);
        for owned in [token_index_address, limiter_address, pool_address, quoter_address] {
            handovers.push(
                self.wc
                    .stage_execution(
                        &mut tx,
                        args.tracking_id,
                        OtxType::TransferOwnership,
                        &signer,
                        deployer,
                        owned,
                        abi::transferOwnershipCall { newOwner: args.owner }
                            .abi_encode()
                            .into(),
                        U256::ZERO,
                        &gas,
                    )
                    .await?,
            );
        }

        let mut specs = vec![
            self.wc.dispatch_spec(args.tracking_id, &token_index, 1)?,
            self.wc.dispatch_spec(args.tracking_id, &limiter, 1)?,
            self.wc.dispatch_spec(args.tracking_id, &pool, 1)?,
            self.wc.dispatch_spec(args.tracking_id, &quoter, 1)?,
            self.wc.dispatch_spec(args.tracking_id, &index_add, 2)?,
            self.wc.dispatch_spec(args.tracking_id, &set_quoter, 3)?,
        ];
        for handover in &handovers {
            specs.push(self.wc.dispatch_spec(args.tracking_id, handover, 4)?);
        }
        self.wc.queue.insert_many(&mut tx, specs).await?;

        tx.commit().await?;

        // Best-effort naming, outside the accepting transaction.
        if let Some(ens) = self.wc.ens.clone() {
            let hint = args.name.clone();
            tokio::spawn(async move {
                match ens.register(pool_address, &hint).await {
                    Ok(result) => info!(
                        target: "worker",
                        pool = %pool_address,
                        name = %format!("{}{}", result.name, ens::ENS_NAME_SUFFIX),
                        "registered pool name"
                    ),
                    Err(e) => warn!(
                        target: "worker",
                        pool = %pool_address,
                        "ens registration failed: {e}"
                    ),
                }
            });
        }

        Ok(JobOutcome::Complete)
    }
}
