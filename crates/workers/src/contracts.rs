//! Deployable contract artifacts and constructor encoding.
//!
//! The creation bytecode is vendored from the published contract build
//! artifacts; constructor arguments are ABI-encoded and appended to form the
//! init code of a deployment transaction.

use alloy_primitives::{hex, Address, Bytes, U256};
use alloy_sol_types::SolValue;
use anyhow::{bail, Context, Result};

const ERC20_BIN: &str = include_str!("../bytecode/erc20.hex");
const ERC20_DEMURRAGE_BIN: &str = include_str!("../bytecode/erc20_demurrage.hex");
const SWAP_POOL_BIN: &str = include_str!("../bytecode/swap_pool.hex");
const TOKEN_INDEX_BIN: &str = include_str!("../bytecode/token_index.hex");
const LIMITER_BIN: &str = include_str!("../bytecode/limiter.hex");
const QUOTER_BIN: &str = include_str!("../bytecode/quoter.hex");

/// Gas limit applied to contract-creation transactions.
pub const DEPLOY_GAS_LIMIT: u64 = 6_000_000;

fn init_code(bin: &str, constructor_args: Vec<u8>) -> Result<Bytes> {
    let mut code = hex::decode(bin.trim()).context("malformed contract artifact")?;
    code.extend_from_slice(&constructor_args);
    Ok(code.into())
}

/// Init code of the standard ERC20: `(name, symbol, decimals, expiry)`.
pub fn erc20_init_code(name: &str, symbol: &str, decimals: u8) -> Result<Bytes> {
    let args =
        (name.to_string(), symbol.to_string(), decimals as u16, U256::ZERO).abi_encode_params();
    init_code(ERC20_BIN, args)
}

/// Init code of the demurrage ERC20:
/// `(name, symbol, decimals, decayLevel, periodMinutes, sinkAddress)`.
pub fn erc20_demurrage_init_code(
    name: &str,
    symbol: &str,
    decimals: u8,
    decay_level: U256,
    period_minutes: u64,
    sink_address: Address,
) -> Result<Bytes> {
    let args = (
        name.to_string(),
        symbol.to_string(),
        decimals as u16,
        decay_level,
        U256::from(period_minutes),
        sink_address,
    )
        .abi_encode_params();
    init_code(ERC20_DEMURRAGE_BIN, args)
}

/// Init code of the swap pool:
/// `(name, symbol, decimals, tokenRegistry, tokenLimiter)`.
pub fn swap_pool_init_code(
    name: &str,
    symbol: &str,
    decimals: u8,
    token_registry: Address,
    token_limiter: Address,
) -> Result<Bytes> {
    let args =
        (name.to_string(), symbol.to_string(), decimals as u16, token_registry, token_limiter)
            .abi_encode_params();
    init_code(SWAP_POOL_BIN, args)
}

/// Init code of a token index; the constructor takes no arguments.
pub fn token_index_init_code() -> Result<Bytes> {
    init_code(TOKEN_INDEX_BIN, Vec::new())
}

/// Init code of a transfer limiter; the constructor takes no arguments.
pub fn limiter_init_code() -> Result<Bytes> {
    init_code(LIMITER_BIN, Vec::new())
}

/// Init code of the price index quoter: `(tokenRegistry)`.
pub fn quoter_init_code(token_registry: Address) -> Result<Bytes> {
    init_code(QUOTER_BIN, (token_registry,).abi_encode_params())
}

/// Converts a demurrage rate (percent per redistribution period) and period
/// length into the per-minute 64.64 fixed-point decay level the demurrage
/// token constructor takes.
pub fn demurrage_decay_level(rate_pct: f64, period_minutes: u64) -> Result<U256> {
    if period_minutes == 0 {
        bail!("demurrage period must be at least one minute");
    }
    if !(0.0..100.0).contains(&rate_pct) {
        bail!("demurrage rate must be within [0, 100): {rate_pct}");
    }
    let retained = 1.0 - rate_pct / 100.0;
    let per_minute = retained.powf(1.0 / period_minutes as f64);
    let scaled = (per_minute * (u64::MAX as f64 + 1.0)) as u128;
    Ok(U256::from(scaled.min(1u128 << 64)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_code_appends_constructor_args() {
        let plain = token_index_init_code().unwrap();
        let erc20 = erc20_init_code("Sarafu", "SRF", 6).unwrap();
        assert!(erc20.len() > plain.len());
        // Head of the init code is the raw creation bytecode.
        let bin = hex::decode(ERC20_BIN.trim()).unwrap();
        assert_eq!(&erc20[..bin.len()], bin.as_slice());
    }

    #[test]
    fn decay_level_is_monotonic_in_rate() {
        let low = demurrage_decay_level(2.0, 43200).unwrap();
        let high = demurrage_decay_level(10.0, 43200).unwrap();
        assert!(high < low, "a higher rate decays faster, so retains less");
        assert!(low < U256::from(1u128 << 64));
    }

    #[test]
    fn zero_rate_retains_everything() {
        assert_eq!(demurrage_decay_level(0.0, 43200).unwrap(), U256::from(1u128 << 64));
    }

    #[test]
    fn invalid_decay_inputs_are_rejected() {
        assert!(demurrage_decay_level(2.0, 0).is_err());
        assert!(demurrage_decay_level(100.0, 10).is_err());
        assert!(demurrage_decay_level(-1.0, 10).is_err());
    }
}
