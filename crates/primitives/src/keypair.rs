//! Custodied key material.

use alloy_primitives::{hex, Address};
use alloy_signer_local::PrivateKeySigner;
use serde::{Deserialize, Serialize};

/// A custodied secp256k1 keypair.
///
/// The private key is held as raw hex without passphrase encryption;
/// at-rest protection is delegated to the database layer. A keypair is
/// created inactive and flipped active only once its on-chain registration
/// has been confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    /// EVM address derived from the uncompressed public key.
    pub public_address: Address,
    /// Raw hex-encoded private key, without a `0x` prefix.
    pub private_key: String,
    /// Whether the on-chain registration for this key has been confirmed.
    #[serde(default)]
    pub active: bool,
}

impl KeyPair {
    /// Generates a fresh keypair.
    pub fn generate() -> Self {
        let signer = PrivateKeySigner::random();
        Self {
            public_address: signer.address(),
            private_key: hex::encode(signer.to_bytes()),
            active: false,
        }
    }

    /// Parses the stored private material back into a signer.
    pub fn signer(&self) -> Result<PrivateKeySigner, alloy_signer_local::LocalSignerError> {
        self.private_key.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_roundtrips_through_hex() {
        let kp = KeyPair::generate();
        let signer = kp.signer().unwrap();
        assert_eq!(signer.address(), kp.public_address);
    }

    #[test]
    fn generated_keys_are_inactive() {
        assert!(!KeyPair::generate().active);
    }

    #[test]
    fn generated_keys_are_distinct() {
        assert_ne!(KeyPair::generate().public_address, KeyPair::generate().public_address);
    }
}
