//! flip-core - Trustless two-party coinflip client for the Ambient ledger
//!
//! This library mirrors the on-chain coinflip program's state machine on the
//! client side: commitment construction, program-derived addresses, manual
//! instruction encoding, round orchestration, and the arbitration-oracle
//! referee flow. The ledger transport and key material live behind the
//! [`LedgerTransport`] seam.

pub mod commitment;
pub mod error;
pub mod evidence;
pub mod funding;
pub mod game;
pub mod instruction;
pub mod oracle;
pub mod pda;
pub mod transport;
pub mod types;

pub use commitment::{commit, generate_secret, verify, CommitMaterial, Digest32, Secret};
pub use error::{FlipError, Result};
pub use evidence::{RefereeRecord, RoundEvidence, StepSignatures};
pub use game::{Game, GameAccount, Phase, Role, Round};
pub use instruction::{AccountMeta, Instruction, InstructionData};
pub use oracle::{OracleClient, PollConfig, Verdict, VerificationRequest};
pub use transport::LedgerTransport;
pub use types::{Choice, Pubkey, TxId, LAMPORTS_PER_SOL};

#[cfg(test)]
pub(crate) mod test_util;
