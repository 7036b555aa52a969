//! Deterministic program-derived addresses.
//!
//! An address is the SHA-256 of the seed tags, a bump byte, the owning
//! program's identity and a fixed domain marker, accepted only when the
//! digest is not a valid ed25519 curve point. The search walks the bump down
//! from 255 and is a pure function of its inputs.

use crate::error::{FlipError, Result};
use crate::types::Pubkey;
use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};

pub const MAX_SEEDS: usize = 16;
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

pub const GAME_SEED: &[u8] = b"game";
pub const VAULT_SEED: &[u8] = b"vault";
pub const ORACLE_REQUEST_SEED: &[u8] = b"tool-oracle-request";
pub const ORACLE_OUTPUT_SEED: &[u8] = b"tool-oracle-output";

fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY::from_slice(bytes)
        .map(|p| p.decompress().is_some())
        .unwrap_or(false)
}

/// Derive the address for `seeds` extended with one explicit bump byte.
/// Fails if the candidate lands on the ed25519 curve.
pub fn create_program_address(seeds: &[&[u8]], bump: u8, program_id: &Pubkey) -> Result<Pubkey> {
    if seeds.len() + 1 > MAX_SEEDS {
        return Err(FlipError::encoding("too many address seeds"));
    }
    for seed in seeds {
        if seed.len() > MAX_SEED_LEN {
            return Err(FlipError::encoding(format!(
                "address seed exceeds {MAX_SEED_LEN} bytes"
            )));
        }
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id.as_ref());
    hasher.update(PDA_MARKER);
    let candidate: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&candidate) {
        return Err(FlipError::BumpNotFound);
    }
    Ok(Pubkey::new(candidate))
}

/// Find the first off-curve address for `seeds`, walking the bump down from
/// 255. Identical inputs always yield the identical `(address, bump)` pair.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    for bump in (0..=u8::MAX).rev() {
        match create_program_address(seeds, bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(FlipError::BumpNotFound) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(FlipError::BumpNotFound)
}

pub fn game_address(program_id: &Pubkey, creator: &Pubkey, seed: &Pubkey) -> Result<(Pubkey, u8)> {
    find_program_address(&[GAME_SEED, creator.as_ref(), seed.as_ref()], program_id)
}

pub fn vault_address(program_id: &Pubkey, game: &Pubkey) -> Result<(Pubkey, u8)> {
    find_program_address(&[VAULT_SEED, game.as_ref()], program_id)
}

pub fn oracle_request_address(program_id: &Pubkey, payer: &Pubkey) -> Result<(Pubkey, u8)> {
    find_program_address(&[ORACLE_REQUEST_SEED, payer.as_ref()], program_id)
}

pub fn oracle_output_address(program_id: &Pubkey, payer: &Pubkey) -> Result<(Pubkey, u8)> {
    find_program_address(&[ORACLE_OUTPUT_SEED, payer.as_ref()], program_id)
}
