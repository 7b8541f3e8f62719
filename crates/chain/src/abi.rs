//! Contract ABI registry.
//!
//! Every contract function the orchestrator encodes or decodes is declared
//! here once; an operation missing from this table is a compile error at the
//! call site, never a runtime condition.

use alloy_sol_types::sol;

sol! {
    // ERC20 (standard + demurrage variants)
    function approve(address spender, uint256 value) returns (bool);
    function transfer(address to, uint256 value) returns (bool);
    function mintTo(address to, uint256 value) returns (bool);
    function sweep(address to) returns (uint256);
    function transferOwnership(address newOwner) returns (bool);

    // Gas faucet
    function check(address subject) returns (bool);
    function nextTime(address subject) returns (uint256);
    function giveTo(address subject) returns (uint256);

    // Custodial registration proxy
    function register(address subject);

    // Token / pool index
    function add(address subject) returns (bool);
    function addressOf(bytes32 symbol) returns (address);

    // Swap pool
    function withdraw(address outToken, address inToken, uint256 value);
    function deposit(address inToken, uint256 value);
    function setQuoter(address quoter);
    function quoter() returns (address);

    // Price index quoter
    function valueFor(address outToken, address inToken, uint256 value) returns (uint256);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{keccak256, Address, U256};
    use alloy_sol_types::SolCall;

    #[test]
    fn selectors_match_canonical_signatures() {
        for (selector, signature) in [
            (approveCall::SELECTOR, "approve(address,uint256)"),
            (transferCall::SELECTOR, "transfer(address,uint256)"),
            (giveToCall::SELECTOR, "giveTo(address)"),
            (registerCall::SELECTOR, "register(address)"),
            (withdrawCall::SELECTOR, "withdraw(address,address,uint256)"),
        ] {
            assert_eq!(selector.as_slice(), &keccak256(signature.as_bytes())[..4], "{signature}");
        }
    }

    #[test]
    fn approve_encodes_spender_then_value() {
        let spender = Address::repeat_byte(0xAA);
        let encoded = approveCall { spender, value: U256::from(105u64) }.abi_encode();
        assert_eq!(encoded.len(), 4 + 32 + 32);
        assert_eq!(&encoded[..4], &approveCall::SELECTOR);
        assert_eq!(&encoded[16..36], spender.as_slice());
        assert_eq!(encoded[4 + 32 + 31], 105);
    }
}
