//! Structured classification of `eth_sendRawTransaction` failures.

use alloy_transport::{RpcError, TransportErrorKind};
use custodia_primitives::DispatchStatus;

/// Maps a raw-transaction submission error onto a dispatch status.
///
/// Structured node errors are matched by message substring. Anything that
/// never reached the node is a network error and stays retryable.
pub fn classify_dispatch_error(err: &RpcError<TransportErrorKind>) -> DispatchStatus {
    match err {
        RpcError::ErrorResp(payload) => classify_error_message(&payload.message),
        RpcError::Transport(_) => DispatchStatus::NetworkError,
        _ => DispatchStatus::UnknownRpcError,
    }
}

/// Classifies a structured node error message.
///
/// The replacement variant is tested before the generic underpriced one
/// because its message contains the shorter pattern as a substring.
pub fn classify_error_message(msg: &str) -> DispatchStatus {
    if msg.contains("insufficient funds for gas") {
        DispatchStatus::NoGas
    } else if msg.contains("replacement transaction underpriced") {
        DispatchStatus::ReplacementUnderpriced
    } else if msg.contains("nonce too low") {
        DispatchStatus::LowNonce
    } else if msg.contains("transaction underpriced") {
        DispatchStatus::LowGasPrice
    } else {
        DispatchStatus::UnknownRpcError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_node_errors_by_substring() {
        for (message, expected) in [
            ("insufficient funds for gas * price + value", DispatchStatus::NoGas),
            ("transaction underpriced", DispatchStatus::LowGasPrice),
            ("nonce too low: next nonce 4, tx nonce 1", DispatchStatus::LowNonce),
            ("replacement transaction underpriced", DispatchStatus::ReplacementUnderpriced),
            ("execution aborted (timeout = 5s)", DispatchStatus::UnknownRpcError),
        ] {
            assert_eq!(classify_error_message(message), expected, "{message}");
        }
    }

    #[test]
    fn replacement_wins_over_generic_underpriced() {
        // Both substrings are present; the replacement classification must win.
        assert_eq!(
            classify_error_message("err: replacement transaction underpriced"),
            DispatchStatus::ReplacementUnderpriced
        );
    }

    #[test]
    fn transport_failures_are_network_errors() {
        let err: RpcError<TransportErrorKind> =
            RpcError::Transport(TransportErrorKind::BackendGone);
        assert_eq!(classify_dispatch_error(&err), DispatchStatus::NetworkError);
    }
}
