//! Chain error type.

use alloy_transport::{RpcError, TransportErrorKind};
use thiserror::Error;

/// An error from the chain layer.
#[derive(Error, Debug)]
pub enum ChainError {
    /// The RPC endpoint returned an error or was unreachable.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// Signing failed.
    #[error(transparent)]
    Signer(#[from] alloy_signer::Error),
    /// A raw transaction payload could not be decoded.
    #[error("failed to decode raw transaction: {0}")]
    TxDecode(String),
    /// A replacement was requested for a non-dynamic-fee transaction.
    #[error("transaction is not a dynamic fee transaction")]
    NotDynamicFee,
    /// A replacement was requested for a contract-creation transaction.
    #[error("transaction has no recipient")]
    NoRecipient,
    /// A contract call returned data that does not match its ABI.
    #[error("malformed call return data: {0}")]
    AbiDecode(String),
}
