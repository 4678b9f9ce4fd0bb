use alloy_primitives::Address;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::{Result, VaultError};

const ADDRESS_TAG: &[u8] = b"vb/account";

/// An externally-controlled identity: an ed25519 keypair plus the 20-byte
/// address the chain knows it by.
///
/// The chain itself never checks signatures (call authorization is the
/// runtime's concern, not modeled here); keys exist so genesis files and the
/// CLI can mint distinct, reproducible identities.
#[derive(Clone)]
pub struct AccountKey {
    signing: SigningKey,
}

impl AccountKey {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a key from 32 raw secret bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&bytes),
        }
    }

    /// Parse a key from its hex-encoded secret (64 hex chars).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| VaultError::InvalidKey(e.to_string()))?;
        let raw: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| VaultError::InvalidKey("secret key must be 32 bytes".into()))?;
        Ok(Self::from_bytes(raw))
    }

    /// Hex-encoded secret key.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing.to_bytes())
    }

    /// Hex-encoded verifying (public) key.
    pub fn public_hex(&self) -> String {
        hex::encode(self.signing.verifying_key().as_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    /// The chain address derived from this key.
    pub fn address(&self) -> Address {
        address_for(&self.signing.verifying_key())
    }
}

/// Derive the chain address for a verifying key: the first 20 bytes of a
/// domain-tagged SHA-256 of the key material.
pub fn address_for(key: &VerifyingKey) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(ADDRESS_TAG);
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    Address::from_slice(&digest[..20])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_stable_across_hex_round_trip() {
        let key = AccountKey::generate();
        let restored = AccountKey::from_hex(&key.secret_hex()).unwrap();
        assert_eq!(key.address(), restored.address());
        assert_eq!(key.public_hex(), restored.public_hex());
    }

    #[test]
    fn distinct_keys_get_distinct_addresses() {
        let a = AccountKey::generate();
        let b = AccountKey::generate();
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn malformed_secret_hex_is_rejected() {
        assert!(AccountKey::from_hex("zz").is_err());
        assert!(AccountKey::from_hex("abcd").is_err());
    }
}
