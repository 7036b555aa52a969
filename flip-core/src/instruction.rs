//! Manual instruction encoding.
//!
//! Instruction data is `discriminator || arguments`, where the discriminator
//! is the first 8 bytes of SHA-256("global:" + entry point name). Arguments
//! are encoded positionally: integers little-endian, fixed byte arrays
//! verbatim, strings with a 4-byte little-endian length prefix, options as a
//! presence byte followed by the value. This table is the canonical ABI
//! contract with the deployed programs; the framework's generated client is
//! known to produce wrong account sizes for these layouts, so the encoding is
//! hand-rolled and pinned here instead.

use crate::types::Pubkey;
use sha2::{Digest, Sha256};

/// First 8 bytes of SHA-256("global:<name>"), matching the program's
/// dispatch table. `name` is the snake_case entry point name.
pub fn discriminator(name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(b"global:");
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// One account reference carried by an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn signer(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            is_signer: true,
            is_writable: true,
        }
    }

    pub fn readonly_signer(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            is_signer: true,
            is_writable: false,
        }
    }

    pub fn writable(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            is_signer: false,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            is_signer: false,
            is_writable: false,
        }
    }
}

/// A fully encoded call into an on-chain program.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Positional argument encoder for one instruction's data.
#[derive(Debug, Clone)]
pub struct InstructionData {
    buf: Vec<u8>,
}

impl InstructionData {
    pub fn new(name: &str) -> Self {
        Self {
            buf: discriminator(name).to_vec(),
        }
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.buf.push(value);
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Fixed-length byte array, emitted verbatim with no length prefix.
    pub fn fixed_bytes(mut self, value: &[u8]) -> Self {
        self.buf.extend_from_slice(value);
        self
    }

    /// Variable-length bytes: 4-byte little-endian length, then the bytes.
    pub fn bytes(mut self, value: &[u8]) -> Self {
        self.buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(value);
        self
    }

    pub fn string(self, value: &str) -> Self {
        self.bytes(value.as_bytes())
    }

    /// Optional string: presence byte, then the string encoding if present.
    pub fn opt_string(mut self, value: Option<&str>) -> Self {
        match value {
            Some(s) => {
                self.buf.push(1);
                self.string(s)
            }
            None => {
                self.buf.push(0);
                self
            }
        }
    }

    pub fn opt_u64(mut self, value: Option<u64>) -> Self {
        match value {
            Some(v) => {
                self.buf.push(1);
                self.u64(v)
            }
            None => {
                self.buf.push(0);
                self
            }
        }
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}
