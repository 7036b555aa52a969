//! Hiding/binding commitments for a coin-side pick.
//!
//! commit = SHA-256(choice_byte || secret). Binding rests on collision
//! resistance; hiding on the 32 bytes of secret entropy. The secret must be
//! kept until reveal: without it the commitment can never be opened and the
//! round is forfeit for that player.

use crate::types::Choice;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const SECRET_LEN: usize = 32;

pub type Secret = [u8; SECRET_LEN];
pub type Digest32 = [u8; 32];

/// Rnd secret for commitment
pub fn generate_secret() -> Secret {
    let mut secret = [0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}

pub fn commit(choice: Choice, secret: &Secret) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update([choice.as_byte()]);
    hasher.update(secret);
    hasher.finalize().into()
}

pub fn verify(choice: Choice, secret: &Secret, digest: &Digest32) -> bool {
    commit(choice, secret) == *digest
}

/// A player's locally retained (choice, secret) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitMaterial {
    pub choice: Choice,
    pub secret: Secret,
}

impl CommitMaterial {
    pub fn new(choice: Choice) -> Self {
        Self {
            choice,
            secret: generate_secret(),
        }
    }

    pub fn commitment(&self) -> Digest32 {
        commit(self.choice, &self.secret)
    }
}
