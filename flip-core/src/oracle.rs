//! Arbitration oracle referee flow.
//!
//! A finished round's evidence is turned into a natural-language request for
//! the on-chain tool oracle, then the oracle's output account is polled until
//! a terminal verdict token shows up. The poll is bounded: every call carries
//! a max-attempt count and/or wall-clock budget, and the future itself is
//! cancel-safe.

use crate::error::{FlipError, Result};
use crate::evidence::RoundEvidence;
use crate::instruction::{AccountMeta, Instruction, InstructionData};
use crate::pda;
use crate::transport::LedgerTransport;
use crate::types::{Pubkey, TxId};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Strict pattern declared to the oracle. The poller matches by containment
/// instead: the oracle wraps its answer in JSON framing, so an exact match
/// against the raw account bytes never fires.
pub const VERDICT_PATTERN: &str = "^(VALID|CHEAT)$";

/// Terminal tokens a verdict must contain.
pub const TERMINAL_TOKENS: [&str; 2] = ["VALID", "CHEAT"];

const REQUEST_VERSION: u8 = 0;
const DEFAULT_BUDGET: u64 = 1_000_000;

/// Handle to a submitted verification request.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub tx: TxId,
    pub request_address: Pubkey,
    pub output_address: Pubkey,
    pub prompt: String,
}

/// A resolved verdict plus the observability counters of the poll that found
/// it.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub token: String,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Bounds for the verdict poll. At least one of `max_attempts` / `timeout`
/// should be set; the defaults keep the loop finite.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(4),
            max_attempts: None,
            timeout: Some(Duration::from_secs(900)),
        }
    }
}

pub struct OracleClient {
    transport: Arc<dyn LedgerTransport>,
    program_id: Pubkey,
    payer: Pubkey,
}

impl OracleClient {
    pub fn new(transport: Arc<dyn LedgerTransport>, program_id: Pubkey, payer: Pubkey) -> Self {
        Self {
            transport,
            program_id,
            payer,
        }
    }

    /// Request and output addresses are per-payer; a payer has at most one
    /// outstanding request and must reclaim it before the next one.
    pub fn request_address(&self) -> Result<Pubkey> {
        Ok(pda::oracle_request_address(&self.program_id, &self.payer)?.0)
    }

    pub fn output_address(&self) -> Result<Pubkey> {
        Ok(pda::oracle_output_address(&self.program_id, &self.payer)?.0)
    }

    pub fn build_prompt(evidence: &RoundEvidence) -> String {
        format!(
            "Verify coinflip game {}: coin {}, winner {}. Respond VALID or CHEAT.",
            evidence.game, evidence.coin, evidence.winner
        )
    }

    /// Submit one `create_request` instruction referencing the round.
    pub async fn submit_verification(
        &self,
        evidence: &RoundEvidence,
    ) -> Result<VerificationRequest> {
        let request_address = self.request_address()?;
        let output_address = self.output_address()?;
        let prompt = Self::build_prompt(evidence);

        let ix = Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::writable(request_address),
                AccountMeta::writable(output_address),
                AccountMeta::signer(self.payer),
                AccountMeta::readonly(Pubkey::SYSTEM_PROGRAM),
            ],
            data: InstructionData::new("create_request")
                .u8(REQUEST_VERSION)
                .opt_string(Some(&prompt))
                .opt_string(Some(VERDICT_PATTERN))
                .u64(DEFAULT_BUDGET)
                .build(),
        };

        let tx = self.transport.send_instruction(&ix, &[self.payer]).await?;
        tracing::info!(%tx, request = %request_address, "oracle request submitted");

        Ok(VerificationRequest {
            tx,
            request_address,
            output_address,
            prompt,
        })
    }

    /// Poll the output account until one of `tokens` appears in its
    /// contents. Returns the matched token, never a partial match, together
    /// with the attempt count and elapsed time.
    pub async fn poll_verdict(
        &self,
        output_address: &Pubkey,
        config: &PollConfig,
        tokens: &[&str],
    ) -> Result<Verdict> {
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            if let Some(data) = self.transport.account_data(output_address).await? {
                let text = String::from_utf8_lossy(&data);
                if let Some(token) = tokens.iter().find(|t| text.contains(**t)) {
                    let elapsed = start.elapsed();
                    tracing::info!(token, attempts, ?elapsed, "oracle verdict resolved");
                    return Ok(Verdict {
                        token: (*token).to_string(),
                        attempts,
                        elapsed,
                    });
                }
            }

            let elapsed = start.elapsed();
            tracing::debug!(attempts, ?elapsed, "no verdict yet");

            let out_of_attempts = config.max_attempts.is_some_and(|max| attempts >= max);
            let out_of_time = config.timeout.is_some_and(|t| elapsed >= t);
            if out_of_attempts || out_of_time {
                return Err(FlipError::OracleTimeout {
                    attempts,
                    elapsed_secs: elapsed.as_secs(),
                });
            }

            tokio::time::sleep(config.interval).await;
        }
    }

    /// Free the request/output accounts so the payer can submit again.
    /// Returns `None` when there is nothing to reclaim.
    pub async fn reclaim(&self, destination: &Pubkey) -> Result<Option<TxId>> {
        let request_address = self.request_address()?;
        if self
            .transport
            .account_data(&request_address)
            .await?
            .is_none()
        {
            tracing::info!(request = %request_address, "no outstanding oracle request");
            return Ok(None);
        }

        let ix = Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::writable(request_address),
                AccountMeta::writable(*destination),
                AccountMeta::signer(self.payer),
                AccountMeta::readonly(Pubkey::SYSTEM_PROGRAM),
            ],
            data: InstructionData::new("reclaim_accounts").build(),
        };

        let tx = self.transport.send_instruction(&ix, &[self.payer]).await?;
        tracing::info!(%tx, "oracle accounts reclaimed");
        Ok(Some(tx))
    }
}
