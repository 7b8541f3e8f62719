//! Dispatch status of an origin transaction.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The latest dispatch attempt/result status for an [Otx](crate::Otx).
///
/// `Success`, `Reverted` and `LowNonce` are terminal; everything else is
/// transient and owned by the dispatcher, the retrier or the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchStatus {
    /// Signed and persisted, not yet handed to the RPC node.
    Pending,
    /// Accepted by the RPC node's mempool.
    InNetwork,
    /// Confirmed on chain with a successful receipt.
    Success,
    /// Confirmed on chain but the execution reverted.
    Reverted,
    /// The node rejected the nonce as already consumed.
    LowNonce,
    /// The signer cannot cover the gas cost.
    NoGas,
    /// The fee cap is below what the node will accept.
    LowGasPrice,
    /// A same-nonce replacement did not outbid the original.
    ReplacementUnderpriced,
    /// The RPC endpoint was unreachable.
    NetworkError,
    /// A structured RPC error we do not recognize.
    UnknownRpcError,
}

impl DispatchStatus {
    /// Canonical uppercase wire/database representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InNetwork => "IN_NETWORK",
            Self::Success => "SUCCESS",
            Self::Reverted => "REVERTED",
            Self::LowNonce => "LOW_NONCE",
            Self::NoGas => "NO_GAS",
            Self::LowGasPrice => "LOW_GAS_PRICE",
            Self::ReplacementUnderpriced => "REPLACEMENT_UNDERPRICED",
            Self::NetworkError => "NETWORK_ERROR",
            Self::UnknownRpcError => "UNKNOWN_RPC_ERROR",
        }
    }

    /// Parses the canonical representation produced by [Self::as_str].
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "PENDING" => Self::Pending,
            "IN_NETWORK" => Self::InNetwork,
            "SUCCESS" => Self::Success,
            "REVERTED" => Self::Reverted,
            "LOW_NONCE" => Self::LowNonce,
            "NO_GAS" => Self::NoGas,
            "LOW_GAS_PRICE" => Self::LowGasPrice,
            "REPLACEMENT_UNDERPRICED" => Self::ReplacementUnderpriced,
            "NETWORK_ERROR" => Self::NetworkError,
            "UNKNOWN_RPC_ERROR" => Self::UnknownRpcError,
            _ => return None,
        })
    }

    /// Whether this status may never be overwritten by a later transition.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Reverted | Self::LowNonce)
    }

    /// Whether this status was classified from a structured chain error and
    /// is therefore actionable by the retrier.
    pub const fn is_chain_error(&self) -> bool {
        matches!(
            self,
            Self::NoGas | Self::LowGasPrice | Self::ReplacementUnderpriced | Self::LowNonce
        )
    }
}

impl Display for DispatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DispatchStatus; 10] = [
        DispatchStatus::Pending,
        DispatchStatus::InNetwork,
        DispatchStatus::Success,
        DispatchStatus::Reverted,
        DispatchStatus::LowNonce,
        DispatchStatus::NoGas,
        DispatchStatus::LowGasPrice,
        DispatchStatus::ReplacementUnderpriced,
        DispatchStatus::NetworkError,
        DispatchStatus::UnknownRpcError,
    ];

    #[test]
    fn wire_representation_roundtrips() {
        for status in ALL {
            assert_eq!(DispatchStatus::parse(status.as_str()), Some(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn terminal_states() {
        for status in ALL {
            let expected = matches!(
                status,
                DispatchStatus::Success | DispatchStatus::Reverted | DispatchStatus::LowNonce
            );
            assert_eq!(status.is_terminal(), expected, "{status}");
        }
    }

    #[test]
    fn network_error_is_not_a_chain_error() {
        assert!(!DispatchStatus::NetworkError.is_chain_error());
        assert!(!DispatchStatus::UnknownRpcError.is_chain_error());
        assert!(DispatchStatus::ReplacementUnderpriced.is_chain_error());
    }
}
