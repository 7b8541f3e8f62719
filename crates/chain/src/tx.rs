//! Dynamic-fee transaction construction, signing and replacement.

use crate::ChainError;
use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_eips::eip2718::{Decodable2718, Encodable2718};
use alloy_network::TxSignerSync;
use alloy_primitives::{hex, Address, Bytes, TxKind, B256, U256};
use alloy_signer_local::PrivateKeySigner;

/// Gas settings applied to every signed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSettings {
    /// EIP-1559 max fee per gas, in wei.
    pub fee_cap: u128,
    /// EIP-1559 max priority fee per gas, in wei.
    pub tip_cap: u128,
    /// Gas limit.
    pub gas_limit: u64,
}

/// A signed transaction ready for the ledger and the dispatcher.
#[derive(Debug, Clone)]
pub struct SignedTx {
    /// EIP-2718 encoded payload, `0x`-prefixed hex.
    pub raw_hex: String,
    /// Transaction hash.
    pub tx_hash: B256,
    /// The nonce the transaction was signed with.
    pub nonce: u64,
}

/// The parameters a bumped-fee replacement must be re-signed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReplacement {
    /// Call target of the original transaction.
    pub to: Address,
    /// Original calldata.
    pub input: Bytes,
    /// Original value.
    pub value: U256,
    /// Fee cap after the bump.
    pub fee_cap: u128,
    /// Original tip cap.
    pub tip_cap: u128,
    /// Original gas limit.
    pub gas_limit: u64,
    /// Original nonce; a replacement must reuse it.
    pub nonce: u64,
}

impl TxReplacement {
    /// The gas settings to re-sign with.
    pub const fn gas(&self) -> GasSettings {
        GasSettings { fee_cap: self.fee_cap, tip_cap: self.tip_cap, gas_limit: self.gas_limit }
    }
}

fn sign(signer: &PrivateKeySigner, mut tx: TxEip1559) -> Result<SignedTx, ChainError> {
    let nonce = tx.nonce;
    let signature = signer.sign_transaction_sync(&mut tx)?;
    let envelope = TxEnvelope::from(tx.into_signed(signature));
    let mut raw = Vec::new();
    envelope.encode_2718(&mut raw);
    Ok(SignedTx {
        raw_hex: hex::encode_prefixed(&raw),
        tx_hash: *envelope.tx_hash(),
        nonce,
    })
}

/// Signs a dynamic-fee contract-execution transaction.
pub fn sign_execution_tx(
    signer: &PrivateKeySigner,
    chain_id: u64,
    to: Address,
    input: Bytes,
    value: U256,
    gas: &GasSettings,
    nonce: u64,
) -> Result<SignedTx, ChainError> {
    sign(
        signer,
        TxEip1559 {
            chain_id,
            nonce,
            gas_limit: gas.gas_limit,
            max_fee_per_gas: gas.fee_cap,
            max_priority_fee_per_gas: gas.tip_cap,
            to: TxKind::Call(to),
            value,
            access_list: Default::default(),
            input,
        },
    )
}

/// Signs a dynamic-fee contract-creation transaction.
pub fn sign_deploy_tx(
    signer: &PrivateKeySigner,
    chain_id: u64,
    init_code: Bytes,
    gas: &GasSettings,
    nonce: u64,
) -> Result<SignedTx, ChainError> {
    sign(
        signer,
        TxEip1559 {
            chain_id,
            nonce,
            gas_limit: gas.gas_limit,
            max_fee_per_gas: gas.fee_cap,
            max_priority_fee_per_gas: gas.tip_cap,
            to: TxKind::Create,
            value: U256::ZERO,
            access_list: Default::default(),
            input: init_code,
        },
    )
}

/// Decodes a `0x`-prefixed EIP-2718 raw transaction.
pub fn decode_raw_tx(raw_hex: &str) -> Result<TxEnvelope, ChainError> {
    let raw = hex::decode(raw_hex).map_err(|e| ChainError::TxDecode(e.to_string()))?;
    TxEnvelope::decode_2718(&mut raw.as_slice()).map_err(|e| ChainError::TxDecode(e.to_string()))
}

/// Derives the re-sign parameters for a fee-bumped replacement of a raw
/// transaction, raising the fee cap by 15 % and keeping everything else,
/// including the nonce.
///
/// Only dynamic-fee call transactions can be replaced this way.
pub fn replacement_for(raw_hex: &str) -> Result<TxReplacement, ChainError> {
    let envelope = decode_raw_tx(raw_hex)?;
    let TxEnvelope::Eip1559(signed) = envelope else {
        return Err(ChainError::NotDynamicFee);
    };
    let tx = signed.tx();
    let TxKind::Call(to) = tx.to else {
        return Err(ChainError::NoRecipient);
    };
    Ok(TxReplacement {
        to,
        input: tx.input.clone(),
        value: tx.value,
        fee_cap: tx.max_fee_per_gas * 115 / 100,
        tip_cap: tx.max_priority_fee_per_gas,
        gas_limit: tx.gas_limit,
        nonce: tx.nonce,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAIN_ID: u64 = 44787;

    fn gas() -> GasSettings {
        GasSettings { fee_cap: 15_000_000_000, tip_cap: 1_000_000_000, gas_limit: 250_000 }
    }

    #[test]
    fn signed_execution_tx_roundtrips() {
        let signer = PrivateKeySigner::random();
        let to = Address::repeat_byte(0x42);
        let input = Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]);
        let signed =
            sign_execution_tx(&signer, CHAIN_ID, to, input.clone(), U256::ZERO, &gas(), 7)
                .unwrap();

        let envelope = decode_raw_tx(&signed.raw_hex).unwrap();
        assert_eq!(*envelope.tx_hash(), signed.tx_hash);
        let TxEnvelope::Eip1559(inner) = envelope else { panic!("expected dynamic fee tx") };
        assert_eq!(inner.tx().nonce, 7);
        assert_eq!(inner.tx().to, TxKind::Call(to));
        assert_eq!(inner.tx().input, input);
        assert_eq!(inner.recover_signer().unwrap(), signer.address());
    }

    #[test]
    fn replacement_bumps_fee_cap_and_keeps_nonce() {
        let signer = PrivateKeySigner::random();
        let signed = sign_execution_tx(
            &signer,
            CHAIN_ID,
            Address::repeat_byte(0x42),
            Bytes::new(),
            U256::ZERO,
            &gas(),
            3,
        )
        .unwrap();

        let replacement = replacement_for(&signed.raw_hex).unwrap();
        assert_eq!(replacement.fee_cap, 15_000_000_000 * 115 / 100);
        assert!(replacement.fee_cap > gas().fee_cap);
        assert_eq!(replacement.nonce, 3);
        assert_eq!(replacement.tip_cap, gas().tip_cap);

        // Bumping a bump keeps the nonce stable and keeps raising the cap.
        let resigned = sign_execution_tx(
            &signer,
            CHAIN_ID,
            replacement.to,
            replacement.input.clone(),
            replacement.value,
            &replacement.gas(),
            replacement.nonce,
        )
        .unwrap();
        let twice = replacement_for(&resigned.raw_hex).unwrap();
        assert_eq!(twice.nonce, 3);
        assert!(twice.fee_cap > replacement.fee_cap);
    }

    #[test]
    fn deploy_tx_has_no_recipient() {
        let signer = PrivateKeySigner::random();
        let signed =
            sign_deploy_tx(&signer, CHAIN_ID, Bytes::from_static(&[0x60, 0x80]), &gas(), 0)
                .unwrap();
        let envelope = decode_raw_tx(&signed.raw_hex).unwrap();
        let TxEnvelope::Eip1559(inner) = envelope else { panic!("expected dynamic fee tx") };
        assert!(inner.tx().to.is_create());
        assert!(matches!(replacement_for(&signed.raw_hex), Err(ChainError::NoRecipient)));
    }

    #[test]
    fn garbage_raw_tx_is_rejected() {
        assert!(matches!(decode_raw_tx("0xzz"), Err(ChainError::TxDecode(_))));
        assert!(matches!(decode_raw_tx("0x00"), Err(ChainError::TxDecode(_))));
    }
}
