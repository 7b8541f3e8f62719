//! EVM plumbing shared by the workers, the dispatcher and the API: a thin
//! JSON-RPC client over an alloy provider, dynamic-fee transaction signing,
//! the contract ABI registry and structured dispatch-error classification.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod abi;

mod classify;
pub use classify::{classify_dispatch_error, classify_error_message};

mod error;
pub use error::ChainError;

mod provider;
pub use provider::ChainClient;

mod tx;
pub use tx::{decode_raw_tx, replacement_for, sign_deploy_tx, sign_execution_tx, GasSettings, SignedTx, TxReplacement};
