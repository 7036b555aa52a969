//! Immutable round records.
//!
//! A `RoundEvidence` is written once when a round finalizes and is the typed
//! hand-off between the orchestrator and the oracle referee; files are only a
//! persistence boundary for it. Incomplete rounds never produce evidence.

use crate::error::Result;
use crate::types::Pubkey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-step transaction signatures of a completed round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSignatures {
    pub create: String,
    pub join: String,
    pub reveal_creator: String,
    pub reveal_joiner: String,
    pub finalize: String,
}

impl StepSignatures {
    pub fn all(&self) -> [&str; 5] {
        [
            &self.create,
            &self.join,
            &self.reveal_creator,
            &self.reveal_joiner,
            &self.finalize,
        ]
    }
}

/// Everything a downstream auditor or referee needs about one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundEvidence {
    pub rpc: String,
    pub program_id: Pubkey,
    pub creator: Pubkey,
    pub joiner: Pubkey,
    pub game: Pubkey,
    pub vault: Pubkey,
    pub stake_lamports: u64,
    pub reveal_deadline_slots: u64,
    pub commit_creator: String,
    pub commit_joiner: String,
    pub choice_creator: u8,
    pub choice_joiner: u8,
    pub secret_creator: String,
    pub secret_joiner: String,
    pub coin: u8,
    pub winner: Pubkey,
    pub txs: StepSignatures,
    pub timestamp: DateTime<Utc>,
}

impl RoundEvidence {
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path, self)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path)
    }
}

/// The referee run's outcome: the oracle request transaction, the resolved
/// verdict token, and the round it judged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefereeRecord {
    pub tx: String,
    pub verdict: String,
    pub round: RoundEvidence,
}

impl RefereeRecord {
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path, self)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        read_json(path)
    }
}

fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RoundEvidence {
        RoundEvidence {
            rpc: "https://rpc.ambient.xyz".to_string(),
            program_id: Pubkey::new_rand(),
            creator: Pubkey::new_rand(),
            joiner: Pubkey::new_rand(),
            game: Pubkey::new_rand(),
            vault: Pubkey::new_rand(),
            stake_lamports: 50_000_000,
            reveal_deadline_slots: 500,
            commit_creator: "aa".repeat(32),
            commit_joiner: "bb".repeat(32),
            choice_creator: 0,
            choice_joiner: 1,
            secret_creator: "cc".repeat(32),
            secret_joiner: "dd".repeat(32),
            coin: 1,
            winner: Pubkey::new_rand(),
            txs: StepSignatures {
                create: "sig-1".into(),
                join: "sig-2".into(),
                reveal_creator: "sig-3".into(),
                reveal_joiner: "sig-4".into(),
                finalize: "sig-5".into(),
            },
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_json_round_trip() {
        let evidence = sample();
        let json = serde_json::to_string(&evidence).unwrap();
        let back: RoundEvidence = serde_json::from_str(&json).unwrap();
        assert_eq!(back.game, evidence.game);
        assert_eq!(back.txs.all(), evidence.txs.all());
        assert_eq!(back.timestamp, evidence.timestamp);
    }

    #[test]
    fn test_timestamp_serializes_iso8601() {
        let evidence = sample();
        let json = serde_json::to_value(&evidence).unwrap();
        let ts = json["timestamp"].as_str().unwrap();
        // RFC 3339 / ISO 8601 with a date-time separator
        assert!(ts.contains('T'));
        DateTime::parse_from_rfc3339(ts).unwrap();
    }

    #[test]
    fn test_file_persistence() {
        let dir = std::env::temp_dir().join(format!("flip-evidence-{}", std::process::id()));
        let path = dir.join("round.json");
        let evidence = sample();
        evidence.save_json(&path).unwrap();
        let back = RoundEvidence::load_json(&path).unwrap();
        assert_eq!(back.winner, evidence.winner);
        std::fs::remove_dir_all(&dir).ok();
    }
}
