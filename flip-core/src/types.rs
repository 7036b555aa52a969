use crate::error::FlipError;
use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Smallest currency unit per whole coin, as the ledger defines it.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Transaction signature as returned by the ledger.
pub type TxId = String;

/// 32-byte account identity, rendered as base58 text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pubkey([u8; 32]);

impl Pubkey {
    /// The system program's well-known all-zero identity.
    pub const SYSTEM_PROGRAM: Pubkey = Pubkey([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Fresh random identity, used as a per-game uniqueness seed.
    pub fn new_rand() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    pub fn as_ref(&self) -> &[u8] {
        &self.0
    }

    /// True for the zeroed sentinel the on-chain program uses for "unset".
    pub fn is_default(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self)
    }
}

impl FromStr for Pubkey {
    type Err = FlipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| FlipError::InvalidAddress(format!("{s}: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| FlipError::InvalidAddress(format!("{s}: not 32 bytes")))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A player's coin-side pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    Heads,
    Tails,
}

impl Choice {
    pub fn as_byte(self) -> u8 {
        match self {
            Choice::Heads => 0,
            Choice::Tails => 1,
        }
    }
}

impl TryFrom<u8> for Choice {
    type Error = FlipError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Choice::Heads),
            1 => Ok(Choice::Tails),
            other => Err(FlipError::InvalidChoice(other)),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_byte())
    }
}
