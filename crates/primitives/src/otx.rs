//! Origin transactions: signed transactions the system intends to publish
//! on behalf of a custodied account.

use crate::DispatchStatus;
use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// The intent category an origin transaction was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtxType {
    /// Master-signed registration of a freshly generated account.
    AccountRegister,
    /// Master-signed faucet top-up of a custodial account.
    GasRefill,
    /// ERC20 `transfer`.
    TokenTransfer,
    /// ERC20 full-balance `sweep`.
    TokenSweep,
    /// ERC20 `approve` (reset or set).
    TokenApprove,
    /// Liquidity pool `withdraw` leg of a swap.
    PoolSwap,
    /// Liquidity pool `deposit`.
    PoolDeposit,
    /// Standard ERC20 contract deployment.
    StandardTokenDeploy,
    /// Demurrage ERC20 contract deployment.
    DemurrageTokenDeploy,
    /// Liquidity pool contract-suite deployment step.
    PoolDeploy,
    /// `add` on a token or pool index contract.
    IndexAdd,
    /// `setQuoter` on a freshly deployed pool.
    SetQuoter,
    /// `transferOwnership` handover after a deploy.
    TransferOwnership,
    /// Arbitrary user-signed contract call.
    GenericSign,
}

impl OtxType {
    /// Canonical uppercase wire/database representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccountRegister => "ACCOUNT_REGISTER",
            Self::GasRefill => "GAS_REFILL",
            Self::TokenTransfer => "TOKEN_TRANSFER",
            Self::TokenSweep => "TOKEN_SWEEP",
            Self::TokenApprove => "TOKEN_APPROVE",
            Self::PoolSwap => "POOL_SWAP",
            Self::PoolDeposit => "POOL_DEPOSIT",
            Self::StandardTokenDeploy => "STANDARD_TOKEN_DEPLOY",
            Self::DemurrageTokenDeploy => "DEMURRAGE_TOKEN_DEPLOY",
            Self::PoolDeploy => "POOL_DEPLOY",
            Self::IndexAdd => "INDEX_ADD",
            Self::SetQuoter => "SET_QUOTER",
            Self::TransferOwnership => "TRANSFER_OWNERSHIP",
            Self::GenericSign => "GENERIC_SIGN",
        }
    }

    /// Parses the canonical representation produced by [Self::as_str].
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "ACCOUNT_REGISTER" => Self::AccountRegister,
            "GAS_REFILL" => Self::GasRefill,
            "TOKEN_TRANSFER" => Self::TokenTransfer,
            "TOKEN_SWEEP" => Self::TokenSweep,
            "TOKEN_APPROVE" => Self::TokenApprove,
            "POOL_SWAP" => Self::PoolSwap,
            "POOL_DEPOSIT" => Self::PoolDeposit,
            "STANDARD_TOKEN_DEPLOY" => Self::StandardTokenDeploy,
            "DEMURRAGE_TOKEN_DEPLOY" => Self::DemurrageTokenDeploy,
            "POOL_DEPLOY" => Self::PoolDeploy,
            "INDEX_ADD" => Self::IndexAdd,
            "SET_QUOTER" => Self::SetQuoter,
            "TRANSFER_OWNERSHIP" => Self::TransferOwnership,
            "GENERIC_SIGN" => Self::GenericSign,
            _ => return None,
        })
    }
}

impl Display for OtxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An origin transaction together with its current dispatch status.
///
/// Multiple origin transactions may share a `tracking_id` when one intent
/// expands into a sequence (approval dances, deploy suites). An origin
/// transaction is never deleted; a superseded one is flagged `replaced`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Otx {
    /// Ledger row id, also the pagination cursor.
    pub id: u64,
    /// Caller-supplied correlation token.
    pub tracking_id: Uuid,
    /// Intent category.
    pub otx_type: OtxType,
    /// The account whose key signed the raw transaction.
    pub signer_account: Address,
    /// EIP-2718 encoded signed transaction, `0x`-prefixed hex.
    pub raw_tx: String,
    /// Transaction hash of the signed payload.
    pub tx_hash: B256,
    /// Nonce consumed from the signer's allocation sequence.
    pub nonce: u64,
    /// Whether a retrier re-issued this transaction under a new row.
    pub replaced: bool,
    /// Current dispatch status.
    pub status: DispatchStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status transition timestamp.
    pub updated_at: DateTime<Utc>,
}
