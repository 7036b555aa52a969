use crate::error::Result;
use crate::instruction::Instruction;
use crate::types::{Pubkey, TxId};
use async_trait::async_trait;

/// Seam to the external ledger.
///
/// Implementations own the RPC connection and the key material for the
/// identities they can sign for; the orchestration layer only names which
/// identities must sign. `send_instruction` submits and waits for
/// confirmation, so a returned `TxId` means the step landed on chain.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// RPC endpoint label, recorded in evidence bundles.
    fn endpoint(&self) -> String;

    /// Submit one instruction signed by `signers` (fee payer first) and wait
    /// for confirmation.
    async fn send_instruction(&self, instruction: &Instruction, signers: &[Pubkey])
        -> Result<TxId>;

    /// Raw account data, or `None` if the account does not exist yet.
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    async fn balance(&self, address: &Pubkey) -> Result<u64>;

    /// Current ledger clock height.
    async fn slot_height(&self) -> Result<u64>;

    /// Best-effort funding request. Many deployments reject this; callers
    /// must treat failure as non-fatal and fall back to manual funding.
    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<TxId>;
}
