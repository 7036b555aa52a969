//! In-process stand-in for the ledger and its opaque programs.

use crate::error::{FlipError, Result};
use crate::instruction::Instruction;
use crate::transport::LedgerTransport;
use crate::types::{Pubkey, TxId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Records every submitted instruction and serves canned account state. The
/// winner-determination logic stays opaque: tests craft the account bytes a
/// round would read back, never recompute the program's formula.
pub struct FakeLedger {
    pub sent: Mutex<Vec<(Instruction, Vec<Pubkey>)>>,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    scripted_reads: Mutex<HashMap<Pubkey, VecDeque<Option<Vec<u8>>>>>,
    balances: Mutex<HashMap<Pubkey, u64>>,
    slot: Mutex<u64>,
    pub airdrops_enabled: bool,
    counter: Mutex<u64>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            accounts: Mutex::new(HashMap::new()),
            scripted_reads: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            slot: Mutex::new(1),
            airdrops_enabled: true,
            counter: Mutex::new(0),
        }
    }

    pub fn without_airdrops() -> Self {
        Self {
            airdrops_enabled: false,
            ..Self::new()
        }
    }

    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts.lock().insert(address, data);
    }

    /// Queue per-address responses consumed before the stored account state,
    /// for exercising not-yet-posted reads.
    pub fn push_read(&self, address: Pubkey, data: Option<Vec<u8>>) {
        self.scripted_reads
            .lock()
            .entry(address)
            .or_default()
            .push_back(data);
    }

    pub fn set_balance(&self, address: Pubkey, lamports: u64) {
        self.balances.lock().insert(address, lamports);
    }

    pub fn set_slot(&self, slot: u64) {
        *self.slot.lock() = slot;
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    fn next_sig(&self) -> TxId {
        let mut counter = self.counter.lock();
        *counter += 1;
        format!("fake-sig-{counter}")
    }
}

#[async_trait]
impl LedgerTransport for FakeLedger {
    fn endpoint(&self) -> String {
        "fake://ledger".to_string()
    }

    async fn send_instruction(
        &self,
        instruction: &Instruction,
        signers: &[Pubkey],
    ) -> Result<TxId> {
        self.sent
            .lock()
            .push((instruction.clone(), signers.to_vec()));
        Ok(self.next_sig())
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        if let Some(queue) = self.scripted_reads.lock().get_mut(address) {
            if let Some(front) = queue.pop_front() {
                return Ok(front);
            }
        }
        Ok(self.accounts.lock().get(address).cloned())
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64> {
        Ok(self.balances.lock().get(address).copied().unwrap_or(0))
    }

    async fn slot_height(&self) -> Result<u64> {
        Ok(*self.slot.lock())
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<TxId> {
        if !self.airdrops_enabled {
            return Err(FlipError::transport("airdrop not supported by this RPC"));
        }
        *self.balances.lock().entry(*address).or_insert(0) += lamports;
        Ok(self.next_sig())
    }
}
