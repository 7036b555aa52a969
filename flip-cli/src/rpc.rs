//! JSON-RPC 2.0 ledger transport.
//!
//! Implements the [`LedgerTransport`] seam over HTTP. Program rejections
//! (including ABI mismatches) come back in the RPC error object and are
//! surfaced verbatim with no retry: resubmitting a malformed instruction
//! cannot succeed.

use crate::tx;
use crate::wallet::Keypair;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use flip_core::{FlipError, Instruction, LedgerTransport, Pubkey, Result, TxId};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const COMMITMENT: &str = "confirmed";
const CONFIRM_POLL: Duration = Duration::from_millis(500);
const CONFIRM_ATTEMPTS: u32 = 60;

pub struct RpcTransport {
    url: String,
    client: reqwest::Client,
    keys: HashMap<Pubkey, Keypair>,
}

impl RpcTransport {
    pub fn new(url: impl Into<String>, keypairs: Vec<Keypair>) -> Self {
        let keys = keypairs.into_iter().map(|kp| (kp.pubkey(), kp)).collect();
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            keys,
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FlipError::transport(format!("{method}: {e}")))?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| FlipError::transport(format!("{method}: invalid response: {e}")))?;

        if let Some(error) = value.get("error") {
            return Err(FlipError::transport(format!("{method} rejected: {error}")));
        }
        Ok(value.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn latest_blockhash(&self) -> Result<[u8; 32]> {
        let result = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": COMMITMENT }]),
            )
            .await?;
        let encoded = result["value"]["blockhash"]
            .as_str()
            .ok_or_else(|| FlipError::transport("getLatestBlockhash: missing blockhash"))?;
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| FlipError::transport(format!("bad blockhash encoding: {e}")))?;
        bytes
            .try_into()
            .map_err(|_| FlipError::transport("blockhash is not 32 bytes"))
    }

    async fn await_confirmation(&self, signature: &str) -> Result<()> {
        for _ in 0..CONFIRM_ATTEMPTS {
            let result = self
                .call("getSignatureStatuses", json!([[signature]]))
                .await?;
            let status = &result["value"][0];
            if !status.is_null() {
                if let Some(err) = status.get("err").filter(|e| !e.is_null()) {
                    return Err(FlipError::transport(format!(
                        "transaction {signature} failed on chain: {err}"
                    )));
                }
                if matches!(
                    status["confirmationStatus"].as_str(),
                    Some("confirmed") | Some("finalized")
                ) {
                    return Ok(());
                }
            }
            tokio::time::sleep(CONFIRM_POLL).await;
        }
        Err(FlipError::transport(format!(
            "transaction {signature} not confirmed in time"
        )))
    }
}

#[async_trait]
impl LedgerTransport for RpcTransport {
    fn endpoint(&self) -> String {
        self.url.clone()
    }

    async fn send_instruction(
        &self,
        instruction: &Instruction,
        signers: &[Pubkey],
    ) -> Result<TxId> {
        let payer = signers
            .first()
            .ok_or_else(|| FlipError::internal("send_instruction needs at least one signer"))?;

        let blockhash = self.latest_blockhash().await?;
        let message = tx::compile_message(&[instruction], payer, &blockhash)?;
        let keypairs: Vec<&Keypair> = message
            .signer_order
            .iter()
            .map(|pk| {
                self.keys
                    .get(pk)
                    .ok_or_else(|| FlipError::config(format!("no key material for signer {pk}")))
            })
            .collect::<Result<_>>()?;
        let wire = tx::sign_transaction(&message, &keypairs)?;

        let signature = self
            .call(
                "sendTransaction",
                json!([
                    BASE64.encode(&wire),
                    { "encoding": "base64", "preflightCommitment": COMMITMENT },
                ]),
            )
            .await?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| FlipError::transport("sendTransaction: missing signature"))?;

        tracing::debug!(%signature, "transaction submitted, awaiting confirmation");
        self.await_confirmation(&signature).await?;
        Ok(signature)
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let result = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": COMMITMENT },
                ]),
            )
            .await?;
        let value = &result["value"];
        if value.is_null() {
            return Ok(None);
        }
        let encoded = value["data"][0]
            .as_str()
            .ok_or_else(|| FlipError::transport("getAccountInfo: missing data field"))?;
        let data = BASE64
            .decode(encoded)
            .map_err(|e| FlipError::transport(format!("bad account data encoding: {e}")))?;
        Ok(Some(data))
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64> {
        let result = self
            .call(
                "getBalance",
                json!([address.to_string(), { "commitment": COMMITMENT }]),
            )
            .await?;
        result["value"]
            .as_u64()
            .ok_or_else(|| FlipError::transport("getBalance: missing value"))
    }

    async fn slot_height(&self) -> Result<u64> {
        let result = self
            .call("getSlot", json!([{ "commitment": COMMITMENT }]))
            .await?;
        result
            .as_u64()
            .ok_or_else(|| FlipError::transport("getSlot: missing value"))
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<TxId> {
        let signature = self
            .call("requestAirdrop", json!([address.to_string(), lamports]))
            .await?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| FlipError::transport("requestAirdrop: missing signature"))?;
        self.await_confirmation(&signature).await?;
        Ok(signature)
    }
}
