//! Arbitrary-precision token amount parsing and approval bumping.

use alloy_primitives::U256;
use thiserror::Error;

/// An invalid token amount string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmountError {
    /// The string is not a plain base-10 unsigned integer.
    #[error("invalid number string: {0:?}")]
    InvalidNumber(String),
    /// The value does not fit 256 bits.
    #[error("amount overflows 256 bits: {0:?}")]
    Overflow(String),
}

/// Parses a decimal string into a 256-bit unsigned amount.
///
/// Rejects empty strings, signs, separators and anything non-decimal.
pub fn parse_amount(s: &str) -> Result<U256, AmountError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::InvalidNumber(s.to_string()));
    }
    U256::from_str_radix(s, 10).map_err(|_| AmountError::Overflow(s.to_string()))
}

/// Bumps an approval amount by 5%, integer-truncated: `(n · 105) / 100`.
///
/// Approvals are set above the requested amount so that demurrage decay
/// between signing and execution cannot leave the allowance short.
pub fn bump_approval(amount: U256) -> Result<U256, AmountError> {
    amount
        .checked_mul(U256::from(105u64))
        .map(|wide| wide / U256::from(100u64))
        .ok_or_else(|| AmountError::Overflow(amount.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_plain_decimals() {
        assert_eq!(parse_amount("0").unwrap(), U256::ZERO);
        assert_eq!(parse_amount("1000000").unwrap(), U256::from(1_000_000u64));
    }

    #[test]
    fn rejects_signs_and_garbage() {
        for bad in ["", "-1", "+1", "1.5", "0x10", "1_000", " 1", "1e6"] {
            assert!(parse_amount(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn bump_is_integer_truncated() {
        assert_eq!(bump_approval(U256::from(100u64)).unwrap(), U256::from(105u64));
        // 101 * 105 / 100 = 106.05 -> 106
        assert_eq!(bump_approval(U256::from(101u64)).unwrap(), U256::from(106u64));
        assert_eq!(bump_approval(U256::ZERO).unwrap(), U256::ZERO);
    }

    #[test]
    fn bump_overflow_surfaces() {
        assert_eq!(
            bump_approval(U256::MAX),
            Err(AmountError::Overflow(U256::MAX.to_string()))
        );
    }

    proptest! {
        #[test]
        fn bump_never_shrinks(n in 0u128..u128::MAX) {
            let amount = U256::from(n);
            let bumped = bump_approval(amount).unwrap();
            prop_assert!(bumped >= amount);
            prop_assert_eq!(bumped, amount * U256::from(105u64) / U256::from(100u64));
        }
    }
}
