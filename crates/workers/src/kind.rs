//! Job kind discriminators.
//!
//! Workers identify by these strings in the durable queue; the payload schema
//! of each kind is the matching `*Args` struct.

/// Account creation and registration intent.
pub const ACCOUNT_CREATE: &str = "ACCOUNT_CREATE";
/// ERC20 transfer intent.
pub const TOKEN_TRANSFER: &str = "TOKEN_TRANSFER";
/// ERC20 full-balance sweep intent.
pub const TOKEN_SWEEP: &str = "TOKEN_SWEEP";
/// Pool swap intent.
pub const POOL_SWAP: &str = "POOL_SWAP";
/// Pool deposit intent.
pub const POOL_DEPOSIT: &str = "POOL_DEPOSIT";
/// Standard ERC20 deploy intent.
pub const TOKEN_DEPLOY: &str = "TOKEN_DEPLOY";
/// Demurrage ERC20 deploy intent.
pub const DEMURRAGE_TOKEN_DEPLOY: &str = "DEMURRAGE_TOKEN_DEPLOY";
/// Pool contract-suite deploy intent.
pub const POOL_DEPLOY: &str = "POOL_DEPLOY";
/// Arbitrary user-signed call intent.
pub const GENERIC_SIGN: &str = "GENERIC_SIGN";
/// Master-signed faucet top-up follow-up.
pub const GAS_REFILL: &str = "GAS_REFILL";
/// Raw transaction submission.
pub const DISPATCH: &str = "DISPATCH";
/// Chain-error recovery walk.
pub const RETRIER: &str = "RETRIER";
/// Periodic receipt sweep.
pub const HEALTH_CHECK: &str = "HEALTH_CHECK";
