//! Key material loading.
//!
//! Wallet files are the ledger's standard JSON format: a 64-byte array of
//! the ed25519 seed followed by the public key. The pairing is
//! consistency-checked on load.

use ed25519_dalek::{Signer as _, SigningKey};
use flip_core::{FlipError, Pubkey, Result};
use std::path::Path;

pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlipError::config(format!("cannot read wallet {}: {e}", path.display()))
        })?;
        let bytes: Vec<u8> = serde_json::from_str(&content)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 64] = bytes
            .try_into()
            .map_err(|_| FlipError::config("wallet file must hold exactly 64 bytes"))?;
        let signing = SigningKey::from_keypair_bytes(&bytes)
            .map_err(|e| FlipError::config(format!("inconsistent wallet key material: {e}")))?;
        Ok(Self { signing })
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new(self.signing.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }
}
