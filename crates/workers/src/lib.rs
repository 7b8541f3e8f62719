//! The transaction pipeline's workers.
//!
//! One typed handler per intent kind composes signed transaction sequences
//! inside a single database transaction: load the signer key, acquire
//! nonces, encode calldata, sign dynamic-fee transactions, persist the
//! origin-transaction rows and enqueue the dispatch jobs, all of which
//! commit or roll back together. The dispatcher, retrier and health check
//! drive those transactions to a terminal status.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod kind;

mod container;
pub use container::{ContractRegistry, WorkerContainer};

pub mod contracts;

mod ens;
pub use ens::{EnsClient, EnsRegisterResult};

mod account_create;
pub use account_create::{AccountCreateArgs, AccountCreateWorker};

mod token_transfer;
pub use token_transfer::{TokenTransferArgs, TokenTransferWorker};

mod token_sweep;
pub use token_sweep::{TokenSweepArgs, TokenSweepWorker};

mod pool_swap;
pub use pool_swap::{PoolSwapArgs, PoolSwapWorker};

mod pool_deposit;
pub use pool_deposit::{PoolDepositArgs, PoolDepositWorker};

mod token_deploy;
pub use token_deploy::{TokenDeployArgs, TokenDeployWorker};

mod demurrage_token_deploy;
pub use demurrage_token_deploy::{DemurrageTokenDeployArgs, DemurrageTokenDeployWorker};

mod pool_deploy;
pub use pool_deploy::{PoolDeployArgs, PoolDeployWorker};

mod generic_sign;
pub use generic_sign::{GenericSignArgs, GenericSignWorker};

mod gas_refill;
pub use gas_refill::{GasRefillArgs, GasRefillWorker};

mod dispatch;
pub use dispatch::{DispatchArgs, DispatchWorker};

mod retrier;
pub use retrier::{RetrierArgs, RetrierWorker};

mod health_check;
pub use health_check::HealthCheckWorker;

use custodia_queue::{PeriodicJob, Runner};
use std::sync::Arc;

/// Registers every pipeline handler and periodic job on the runner.
pub fn register_workers(runner: &mut Runner, wc: Arc<WorkerContainer>) {
    runner.register(Arc::new(AccountCreateWorker::new(wc.clone())));
    runner.register(Arc::new(TokenTransferWorker::new(wc.clone())));
    runner.register(Arc::new(TokenSweepWorker::new(wc.clone())));
    runner.register(Arc::new(PoolSwapWorker::new(wc.clone())));
    runner.register(Arc::new(PoolDepositWorker::new(wc.clone())));
    runner.register(Arc::new(TokenDeployWorker::new(wc.clone())));
    runner.register(Arc::new(DemurrageTokenDeployWorker::new(wc.clone())));
    runner.register(Arc::new(PoolDeployWorker::new(wc.clone())));
    runner.register(Arc::new(GenericSignWorker::new(wc.clone())));
    runner.register(Arc::new(GasRefillWorker::new(wc.clone())));
    runner.register(Arc::new(DispatchWorker::new(wc.clone())));
    runner.register(Arc::new(RetrierWorker::new(wc.clone())));
    runner.register(Arc::new(HealthCheckWorker::new(wc)));

    runner.register_periodic(PeriodicJob {
        kind: kind::HEALTH_CHECK,
        args: serde_json::json!({}),
        interval: health_check::SWEEP_INTERVAL,
        run_on_start: false,
    });
}
