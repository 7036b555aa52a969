//! Round orchestration: the client-side mirror of the on-chain game.
//!
//! A `Round` owns one game for its whole lifetime and walks it through
//! create -> join -> reveal x2 -> finalize, building each step's instruction
//! locally and submitting it over the transport. Ordering is enforced here
//! as well as on chain: a rejected out-of-order step costs no round trip and
//! leaves the local state untouched. The coin and winner are computed by the
//! program; this side only reads them back.

use crate::commitment::CommitMaterial;
use crate::error::{FlipError, Result};
use crate::evidence::{RoundEvidence, StepSignatures};
use crate::instruction::{AccountMeta, Instruction, InstructionData};
use crate::pda;
use crate::transport::LedgerTransport;
use crate::types::{Choice, Pubkey, TxId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Which of the two players performed a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Creator,
    Joiner,
}

/// Client-side lifecycle of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Created,
    Joined,
    RevealedOne(Role),
    RevealedBoth,
    Finalized,
    /// The ledger clock passed the reveal deadline before the round could
    /// complete. Observed, never entered by a local action.
    Expired,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Created => "Created",
            Phase::Joined => "Joined",
            Phase::RevealedOne(Role::Creator) => "RevealedOne(creator)",
            Phase::RevealedOne(Role::Joiner) => "RevealedOne(joiner)",
            Phase::RevealedBoth => "RevealedBoth",
            Phase::Finalized => "Finalized",
            Phase::Expired => "Expired",
        }
    }
}

/// Local mirror of the on-chain game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// Random public identifier, chosen once per round and never reused;
    /// guarantees address uniqueness across concurrent rounds.
    pub seed: Pubkey,
    pub creator: Pubkey,
    pub joiner: Option<Pubkey>,
    pub stake_lamports: u64,
    pub reveal_deadline_slots: u64,
    pub commit_creator: Option<[u8; 32]>,
    pub commit_joiner: Option<[u8; 32]>,
    pub address: Pubkey,
    pub vault: Pubkey,
    pub coin: Option<Choice>,
    pub winner: Option<Pubkey>,
    pub phase: Phase,
}

#[derive(Debug, Default, Clone)]
struct PendingSignatures {
    create: Option<TxId>,
    join: Option<TxId>,
    reveal_creator: Option<TxId>,
    reveal_joiner: Option<TxId>,
    finalize: Option<TxId>,
}

/// Single-writer orchestrator for one round.
pub struct Round {
    transport: Arc<dyn LedgerTransport>,
    program_id: Pubkey,
    game: Game,
    creator_material: CommitMaterial,
    joiner_material: Option<CommitMaterial>,
    sigs: PendingSignatures,
}

impl Round {
    /// Set up a fresh round in `Idle`. Derives the game and vault addresses
    /// from a newly drawn seed; nothing touches the ledger yet.
    pub fn new(
        transport: Arc<dyn LedgerTransport>,
        program_id: Pubkey,
        creator: Pubkey,
        creator_choice: Choice,
        stake_lamports: u64,
        reveal_deadline_slots: u64,
    ) -> Result<Self> {
        if stake_lamports == 0 {
            return Err(FlipError::config("stake must be greater than zero"));
        }

        let seed = Pubkey::new_rand();
        let (address, _) = pda::game_address(&program_id, &creator, &seed)?;
        let (vault, _) = pda::vault_address(&program_id, &address)?;

        Ok(Self {
            transport,
            program_id,
            game: Game {
                seed,
                creator,
                joiner: None,
                stake_lamports,
                reveal_deadline_slots,
                commit_creator: None,
                commit_joiner: None,
                address,
                vault,
                coin: None,
                winner: None,
                phase: Phase::Idle,
            },
            creator_material: CommitMaterial::new(creator_choice),
            joiner_material: None,
            sigs: PendingSignatures::default(),
        })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn phase(&self) -> Phase {
        self.game.phase
    }

    fn require_phase(&self, expected: Phase, step: &str) -> Result<()> {
        if self.game.phase != expected {
            return Err(FlipError::phase(format!(
                "{step} requires {}, round is {}",
                expected.name(),
                self.game.phase.name()
            )));
        }
        Ok(())
    }

    /// Stake the creator's lamports and put their commitment on chain.
    pub async fn create(&mut self) -> Result<TxId> {
        self.require_phase(Phase::Idle, "create")?;

        let commitment = self.creator_material.commitment();
        let ix = Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::signer(self.game.creator),
                AccountMeta::readonly(self.game.seed),
                AccountMeta::writable(self.game.address),
                AccountMeta::writable(self.game.vault),
                AccountMeta::readonly(Pubkey::SYSTEM_PROGRAM),
            ],
            data: InstructionData::new("create_game")
                .u64(self.game.stake_lamports)
                .fixed_bytes(&commitment)
                .u64(self.game.reveal_deadline_slots)
                .build(),
        };

        let sig = self
            .transport
            .send_instruction(&ix, &[self.game.creator])
            .await?;
        self.game.commit_creator = Some(commitment);
        self.game.phase = Phase::Created;
        self.sigs.create = Some(sig.clone());
        tracing::info!(game = %self.game.address, %sig, "game created");
        Ok(sig)
    }

    /// Second player matches the stake with their own commitment.
    pub async fn join(&mut self, joiner: Pubkey, choice: Choice) -> Result<TxId> {
        self.require_phase(Phase::Created, "join")?;

        let material = CommitMaterial::new(choice);
        let commitment = material.commitment();
        let ix = Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::signer(joiner),
                AccountMeta::writable(self.game.address),
                AccountMeta::writable(self.game.vault),
                AccountMeta::readonly(Pubkey::SYSTEM_PROGRAM),
            ],
            data: InstructionData::new("join_game")
                .fixed_bytes(&commitment)
                .build(),
        };

        let sig = self.transport.send_instruction(&ix, &[joiner]).await?;
        self.game.joiner = Some(joiner);
        self.game.commit_joiner = Some(commitment);
        self.joiner_material = Some(material);
        self.game.phase = Phase::Joined;
        self.sigs.join = Some(sig.clone());
        tracing::info!(game = %self.game.address, %joiner, %sig, "game joined");
        Ok(sig)
    }

    fn reveal_allowed(&self, role: Role, step: &str) -> Result<()> {
        match (self.game.phase, role) {
            (Phase::Joined, _) => Ok(()),
            (Phase::RevealedOne(done), _) if done != role => Ok(()),
            _ => Err(FlipError::phase(format!(
                "{step} not allowed in {}",
                self.game.phase.name()
            ))),
        }
    }

    /// Open the creator's commitment on chain.
    pub async fn reveal_creator(&mut self) -> Result<TxId> {
        self.reveal_allowed(Role::Creator, "reveal_creator")?;
        if self.game.commit_creator.is_none() {
            return Err(FlipError::phase("creator commitment was never submitted"));
        }

        let material = self.creator_material.clone();
        let sig = self
            .reveal(
                "reveal_creator",
                self.game.creator,
                material.choice,
                &material.secret,
            )
            .await?;
        self.sigs.reveal_creator = Some(sig.clone());
        self.advance_after_reveal(Role::Creator);
        Ok(sig)
    }

    /// Open the joiner's commitment on chain.
    pub async fn reveal_joiner(&mut self) -> Result<TxId> {
        self.reveal_allowed(Role::Joiner, "reveal_joiner")?;
        let material = self
            .joiner_material
            .clone()
            .ok_or_else(|| FlipError::phase("joiner commitment was never submitted"))?;
        let joiner = self
            .game
            .joiner
            .ok_or_else(|| FlipError::phase("no joiner on record"))?;

        let sig = self
            .reveal("reveal_joiner", joiner, material.choice, &material.secret)
            .await?;
        self.sigs.reveal_joiner = Some(sig.clone());
        self.advance_after_reveal(Role::Joiner);
        Ok(sig)
    }

    async fn reveal(
        &self,
        name: &str,
        signer: Pubkey,
        choice: Choice,
        secret: &[u8; 32],
    ) -> Result<TxId> {
        let ix = Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::readonly_signer(signer),
                AccountMeta::writable(self.game.address),
            ],
            data: InstructionData::new(name)
                .u8(choice.as_byte())
                .fixed_bytes(secret)
                .build(),
        };
        let sig = self.transport.send_instruction(&ix, &[signer]).await?;
        tracing::info!(game = %self.game.address, step = name, %sig, "commitment revealed");
        Ok(sig)
    }

    fn advance_after_reveal(&mut self, role: Role) {
        self.game.phase = match self.game.phase {
            Phase::Joined => Phase::RevealedOne(role),
            Phase::RevealedOne(_) => Phase::RevealedBoth,
            other => other,
        };
    }

    /// Fetch the program-computed coin and winner for the evidence record.
    /// Finalize does not depend on this read.
    pub async fn read_outcome(&mut self) -> Result<(Choice, Pubkey)> {
        self.require_phase(Phase::RevealedBoth, "read_outcome")?;

        let data = self
            .transport
            .account_data(&self.game.address)
            .await?
            .ok_or_else(|| FlipError::AccountNotFound(self.game.address.to_string()))?;
        let account = GameAccount::parse(&data)?;

        if account.status != OnChainStatus::ReadyToFinalize {
            return Err(FlipError::phase(format!(
                "program has not posted an outcome yet (status {:?})",
                account.status
            )));
        }

        let coin = Choice::try_from(account.coin)?;
        self.game.coin = Some(coin);
        self.game.winner = Some(account.winner);
        tracing::info!(game = %self.game.address, coin = %coin, winner = %account.winner, "outcome read back");
        Ok((coin, account.winner))
    }

    /// Pay the escrowed stakes out to the winner. Permissionless on chain;
    /// this client submits it with the creator as fee payer.
    pub async fn finalize(&mut self) -> Result<TxId> {
        self.require_phase(Phase::RevealedBoth, "finalize")?;
        let joiner = self
            .game
            .joiner
            .ok_or_else(|| FlipError::phase("no joiner on record"))?;

        let ix = self.payout_instruction("finalize", joiner);
        let sig = self
            .transport
            .send_instruction(&ix, &[self.game.creator])
            .await?;
        self.game.phase = Phase::Finalized;
        self.sigs.finalize = Some(sig.clone());
        tracing::info!(game = %self.game.address, %sig, "game finalized");
        Ok(sig)
    }

    /// Re-check the ledger clock against the on-chain deadline and flip the
    /// local mirror to `Expired` when it has passed. Returns whether the
    /// round is now expired.
    pub async fn refresh_expiry(&mut self) -> Result<bool> {
        match self.game.phase {
            Phase::Created | Phase::Joined | Phase::RevealedOne(_) => {}
            _ => return Ok(self.game.phase == Phase::Expired),
        }

        let data = match self.transport.account_data(&self.game.address).await? {
            Some(data) => data,
            None => return Ok(false),
        };
        let account = GameAccount::parse(&data)?;
        let slot = self.transport.slot_height().await?;
        if slot >= account.reveal_deadline_slot {
            tracing::warn!(
                game = %self.game.address,
                slot,
                deadline = account.reveal_deadline_slot,
                "reveal deadline passed"
            );
            self.game.phase = Phase::Expired;
        }
        Ok(self.game.phase == Phase::Expired)
    }

    /// Reclaim stakes from an expired round. The program pays the revealed
    /// side (or refunds both when nobody revealed).
    pub async fn forfeit(&mut self) -> Result<TxId> {
        self.require_phase(Phase::Expired, "forfeit")?;
        let joiner = self
            .game
            .joiner
            .ok_or_else(|| FlipError::phase("no joiner on record"))?;

        let ix = self.payout_instruction("forfeit_if_timeout", joiner);
        let sig = self
            .transport
            .send_instruction(&ix, &[self.game.creator])
            .await?;
        self.game.phase = Phase::Finalized;
        tracing::info!(game = %self.game.address, %sig, "expired game forfeited");
        Ok(sig)
    }

    fn payout_instruction(&self, name: &str, joiner: Pubkey) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::writable(self.game.address),
                AccountMeta::writable(self.game.vault),
                AccountMeta::writable(self.game.creator),
                AccountMeta::writable(joiner),
            ],
            data: InstructionData::new(name).build(),
        }
    }

    /// Consume the round into its immutable evidence record. Only a
    /// finalized round with a read-back outcome qualifies.
    pub fn into_evidence(self) -> Result<RoundEvidence> {
        if self.game.phase != Phase::Finalized {
            return Err(FlipError::phase(format!(
                "evidence requires Finalized, round is {}",
                self.game.phase.name()
            )));
        }

        let missing = || FlipError::internal("finalized round is missing step data");
        let joiner_material = self.joiner_material.ok_or_else(missing)?;
        let coin = self.game.coin.ok_or_else(missing)?;
        let winner = self.game.winner.ok_or_else(missing)?;

        Ok(RoundEvidence {
            rpc: self.transport.endpoint(),
            program_id: self.program_id,
            creator: self.game.creator,
            joiner: self.game.joiner.ok_or_else(missing)?,
            game: self.game.address,
            vault: self.game.vault,
            stake_lamports: self.game.stake_lamports,
            reveal_deadline_slots: self.game.reveal_deadline_slots,
            commit_creator: hex::encode(self.game.commit_creator.ok_or_else(missing)?),
            commit_joiner: hex::encode(self.game.commit_joiner.ok_or_else(missing)?),
            choice_creator: self.creator_material.choice.as_byte(),
            choice_joiner: joiner_material.choice.as_byte(),
            secret_creator: hex::encode(self.creator_material.secret),
            secret_joiner: hex::encode(joiner_material.secret),
            coin: coin.as_byte(),
            winner,
            txs: StepSignatures {
                create: self.sigs.create.ok_or_else(missing)?,
                join: self.sigs.join.ok_or_else(missing)?,
                reveal_creator: self.sigs.reveal_creator.ok_or_else(missing)?,
                reveal_joiner: self.sigs.reveal_joiner.ok_or_else(missing)?,
                finalize: self.sigs.finalize.ok_or_else(missing)?,
            },
            timestamp: Utc::now(),
        })
    }
}

/// Status byte as the program stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnChainStatus {
    Created,
    Joined,
    Revealing,
    ReadyToFinalize,
    Finalized,
}

impl TryFrom<u8> for OnChainStatus {
    type Error = FlipError;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::Created,
            1 => Self::Joined,
            2 => Self::Revealing,
            3 => Self::ReadyToFinalize,
            4 => Self::Finalized,
            other => {
                return Err(FlipError::MalformedAccount(format!(
                    "unknown game status {other}"
                )))
            }
        })
    }
}

/// Raw on-chain game account, field offsets pinned to the deployed layout.
#[derive(Debug, Clone)]
pub struct GameAccount {
    pub creator: Pubkey,
    pub joiner: Pubkey,
    pub stake_lamports: u64,
    pub commit_creator: [u8; 32],
    pub commit_joiner: [u8; 32],
    pub revealed_creator: bool,
    pub revealed_joiner: bool,
    pub choice_creator: u8,
    pub choice_joiner: u8,
    pub created_slot: u64,
    pub reveal_deadline_slot: u64,
    pub coin: u8,
    pub winner: Pubkey,
    pub status: OnChainStatus,
}

/// 8 + 2x32 + 8 + 2x32 + 2 + 2 + 2x32 + 2x8 + 1 + 32 + 1
pub const GAME_ACCOUNT_LEN: usize = 262;

/// First 8 bytes of SHA-256("account:Game"), the layout tag the program
/// writes ahead of the fields.
pub fn game_account_discriminator() -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(b"account:Game");
    let digest = hasher.finalize();
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

impl GameAccount {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < GAME_ACCOUNT_LEN {
            return Err(FlipError::MalformedAccount(format!(
                "game account is {} bytes, expected at least {GAME_ACCOUNT_LEN}",
                data.len()
            )));
        }
        if data[..8] != game_account_discriminator() {
            return Err(FlipError::MalformedAccount(
                "account discriminator does not match a game account".to_string(),
            ));
        }

        let pubkey = |off: usize| Pubkey::new(data[off..off + 32].try_into().unwrap());
        let digest = |off: usize| -> [u8; 32] { data[off..off + 32].try_into().unwrap() };
        let u64_at =
            |off: usize| u64::from_le_bytes(data[off..off + 8].try_into().unwrap());

        Ok(Self {
            creator: pubkey(8),
            joiner: pubkey(40),
            stake_lamports: u64_at(72),
            commit_creator: digest(80),
            commit_joiner: digest(112),
            revealed_creator: data[144] != 0,
            revealed_joiner: data[145] != 0,
            choice_creator: data[146],
            choice_joiner: data[147],
            created_slot: u64_at(212),
            reveal_deadline_slot: u64_at(220),
            coin: data[228],
            winner: pubkey(229),
            status: OnChainStatus::try_from(data[261])?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::discriminator;
    use crate::test_util::FakeLedger;
    use crate::types::LAMPORTS_PER_SOL;

    fn round(transport: Arc<FakeLedger>) -> Round {
        Round::new(
            transport,
            Pubkey::new_rand(),
            Pubkey::new_rand(),
            Choice::Heads,
            LAMPORTS_PER_SOL / 20, // 0.05
            500,
        )
        .unwrap()
    }

    /// Craft the account bytes the program would hold after both reveals.
    fn ready_account_bytes(
        creator: Pubkey,
        joiner: Pubkey,
        deadline_slot: u64,
        coin: u8,
        winner: Pubkey,
        status: u8,
    ) -> Vec<u8> {
        let mut data = vec![0u8; GAME_ACCOUNT_LEN];
        data[..8].copy_from_slice(&game_account_discriminator());
        data[8..40].copy_from_slice(creator.as_ref());
        data[40..72].copy_from_slice(joiner.as_ref());
        data[72..80].copy_from_slice(&(LAMPORTS_PER_SOL / 20).to_le_bytes());
        data[144] = 1;
        data[145] = 1;
        data[220..228].copy_from_slice(&deadline_slot.to_le_bytes());
        data[228] = coin;
        data[229..261].copy_from_slice(winner.as_ref());
        data[261] = status;
        data
    }

    #[test]
    fn test_zero_stake_rejected() {
        let transport = Arc::new(FakeLedger::new());
        let result = Round::new(
            transport,
            Pubkey::new_rand(),
            Pubkey::new_rand(),
            Choice::Heads,
            0,
            500,
        );
        assert!(matches!(result, Err(FlipError::Config(_))));
    }

    #[tokio::test]
    async fn test_creator_reveal_rejected_in_idle() {
        let transport = Arc::new(FakeLedger::new());
        let mut round = round(transport.clone());
        let err = round.reveal_creator().await.unwrap_err();
        assert!(matches!(err, FlipError::Phase(_)));
        assert_eq!(round.phase(), Phase::Idle);
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_joiner_reveal_rejected_in_created() {
        let transport = Arc::new(FakeLedger::new());
        let mut round = round(transport.clone());
        round.create().await.unwrap();
        let err = round.reveal_joiner().await.unwrap_err();
        assert!(matches!(err, FlipError::Phase(_)));
        assert_eq!(round.phase(), Phase::Created);
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_finalize_rejected_before_both_reveals() {
        let transport = Arc::new(FakeLedger::new());
        let mut round = round(transport.clone());
        round.create().await.unwrap();
        round.join(Pubkey::new_rand(), Choice::Tails).await.unwrap();
        round.reveal_creator().await.unwrap();
        let err = round.finalize().await.unwrap_err();
        assert!(matches!(err, FlipError::Phase(_)));
        assert_eq!(round.phase(), Phase::RevealedOne(Role::Creator));
    }

    #[tokio::test]
    async fn test_join_rejected_twice() {
        let transport = Arc::new(FakeLedger::new());
        let mut round = round(transport);
        round.create().await.unwrap();
        round.join(Pubkey::new_rand(), Choice::Tails).await.unwrap();
        let err = round.join(Pubkey::new_rand(), Choice::Tails).await.unwrap_err();
        assert!(matches!(err, FlipError::Phase(_)));
    }

    #[tokio::test]
    async fn test_reveals_are_order_independent() {
        let transport = Arc::new(FakeLedger::new());
        let mut round = round(transport);
        round.create().await.unwrap();
        round.join(Pubkey::new_rand(), Choice::Tails).await.unwrap();
        round.reveal_joiner().await.unwrap();
        assert_eq!(round.phase(), Phase::RevealedOne(Role::Joiner));
        round.reveal_creator().await.unwrap();
        assert_eq!(round.phase(), Phase::RevealedBoth);
    }

    #[tokio::test]
    async fn test_create_instruction_layout() {
        let transport = Arc::new(FakeLedger::new());
        let mut round = round(transport.clone());
        round.create().await.unwrap();

        let sent = transport.sent.lock();
        let (ix, signers) = &sent[0];
        assert_eq!(&ix.data[..8], discriminator("create_game"));
        // stake u64 || commitment [32] || deadline u64
        assert_eq!(ix.data.len(), 8 + 8 + 32 + 8);
        assert_eq!(
            u64::from_le_bytes(ix.data[8..16].try_into().unwrap()),
            LAMPORTS_PER_SOL / 20
        );
        assert_eq!(
            u64::from_le_bytes(ix.data[48..56].try_into().unwrap()),
            500
        );
        assert_eq!(ix.accounts.len(), 5);
        assert!(ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[4].pubkey, Pubkey::SYSTEM_PROGRAM);
        assert_eq!(signers, &vec![round.game().creator]);
    }

    #[tokio::test]
    async fn test_full_round_produces_evidence() {
        let transport = Arc::new(FakeLedger::new());
        let mut round = round(transport.clone());
        let joiner = Pubkey::new_rand();

        round.create().await.unwrap();
        round.join(joiner, Choice::Tails).await.unwrap();
        round.reveal_creator().await.unwrap();
        round.reveal_joiner().await.unwrap();

        // the opaque program decides the outcome; serve its account state
        let creator = round.game().creator;
        transport.set_account(
            round.game().address,
            ready_account_bytes(creator, joiner, 5000, 1, joiner, 3),
        );

        let (coin, winner) = round.read_outcome().await.unwrap();
        assert_eq!(coin, Choice::Tails);
        assert_eq!(winner, joiner);

        round.finalize().await.unwrap();
        let evidence = round.into_evidence().unwrap();

        assert_eq!(evidence.stake_lamports, LAMPORTS_PER_SOL / 20);
        assert!(evidence.coin <= 1);
        assert!(evidence.winner == creator || evidence.winner == joiner);
        assert_eq!(evidence.choice_creator, 0);
        assert_eq!(evidence.choice_joiner, 1);
        assert!(evidence.txs.all().iter().all(|sig| !sig.is_empty()));
        assert_eq!(transport.sent_count(), 5);
        // commitments in evidence verify against the revealed secrets
        let secret: [u8; 32] = hex::decode(&evidence.secret_creator)
            .unwrap()
            .try_into()
            .unwrap();
        let digest: [u8; 32] = hex::decode(&evidence.commit_creator)
            .unwrap()
            .try_into()
            .unwrap();
        assert!(crate::commitment::verify(Choice::Heads, &secret, &digest));
    }

    #[tokio::test]
    async fn test_read_outcome_before_program_posts_it() {
        let transport = Arc::new(FakeLedger::new());
        let mut round = round(transport.clone());
        let joiner = Pubkey::new_rand();
        round.create().await.unwrap();
        round.join(joiner, Choice::Tails).await.unwrap();
        round.reveal_creator().await.unwrap();
        round.reveal_joiner().await.unwrap();

        let creator = round.game().creator;
        transport.set_account(
            round.game().address,
            ready_account_bytes(creator, joiner, 5000, 0, Pubkey::default(), 2),
        );
        let err = round.read_outcome().await.unwrap_err();
        assert!(matches!(err, FlipError::Phase(_)));
    }

    #[tokio::test]
    async fn test_evidence_refused_for_incomplete_round() {
        let transport = Arc::new(FakeLedger::new());
        let mut round = round(transport);
        round.create().await.unwrap();
        assert!(matches!(
            round.into_evidence(),
            Err(FlipError::Phase(_))
        ));
    }

    #[tokio::test]
    async fn test_expiry_observed_and_forfeit() {
        let transport = Arc::new(FakeLedger::new());
        let mut round = round(transport.clone());
        let joiner = Pubkey::new_rand();
        round.create().await.unwrap();
        round.join(joiner, Choice::Tails).await.unwrap();
        round.reveal_creator().await.unwrap();

        let creator = round.game().creator;
        transport.set_account(
            round.game().address,
            ready_account_bytes(creator, joiner, 100, 0, Pubkey::default(), 2),
        );

        transport.set_slot(50);
        assert!(!round.refresh_expiry().await.unwrap());
        assert_eq!(round.phase(), Phase::RevealedOne(Role::Creator));

        transport.set_slot(100);
        assert!(round.refresh_expiry().await.unwrap());
        assert_eq!(round.phase(), Phase::Expired);

        round.forfeit().await.unwrap();
        assert_eq!(round.phase(), Phase::Finalized);
        let sent = transport.sent.lock();
        let (ix, _) = sent.last().unwrap();
        assert_eq!(&ix.data[..8], discriminator("forfeit_if_timeout"));
    }

    #[test]
    fn test_game_account_parse_rejects_garbage() {
        assert!(matches!(
            GameAccount::parse(&[0u8; 16]),
            Err(FlipError::MalformedAccount(_))
        ));
        let mut data = vec![0u8; GAME_ACCOUNT_LEN];
        data[..8].copy_from_slice(&[9u8; 8]);
        assert!(matches!(
            GameAccount::parse(&data),
            Err(FlipError::MalformedAccount(_))
        ));
    }
}
