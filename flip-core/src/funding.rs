//! Best-effort balance top-up.
//!
//! One airdrop attempt, no retry loop. When the RPC rejects it (common on
//! production deployments) the error carries a concrete manual transfer
//! command for the operator instead of hanging.

use crate::error::{FlipError, Result};
use crate::transport::LedgerTransport;
use crate::types::{Pubkey, LAMPORTS_PER_SOL};

fn as_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

fn manual_hint(transport: &dyn LedgerTransport, address: &Pubkey, lamports: u64) -> String {
    format!(
        "fund it manually: solana transfer {address} {} --allow-unfunded-recipient --url {}",
        as_sol(lamports),
        transport.endpoint()
    )
}

/// Make sure `address` holds at least `min_lamports`, airdropping
/// `topup_lamports` once if not. Returns whether an airdrop was performed.
pub async fn ensure_funded(
    transport: &dyn LedgerTransport,
    address: &Pubkey,
    min_lamports: u64,
    topup_lamports: u64,
) -> Result<bool> {
    let balance = transport.balance(address).await?;
    if balance >= min_lamports {
        return Ok(false);
    }

    tracing::info!(
        %address,
        have = balance,
        need = min_lamports,
        "balance too low, requesting airdrop"
    );

    match transport.request_airdrop(address, topup_lamports).await {
        Ok(sig) => {
            tracing::info!(%sig, "airdrop confirmed");
        }
        Err(e) => {
            return Err(FlipError::Funding {
                address: address.to_string(),
                hint: format!(
                    "airdrop unavailable ({e}); {}",
                    manual_hint(transport, address, topup_lamports)
                ),
            });
        }
    }

    let after = transport.balance(address).await?;
    if after < min_lamports {
        return Err(FlipError::Funding {
            address: address.to_string(),
            hint: format!(
                "airdrop landed but balance is still {} of {} needed; {}",
                as_sol(after),
                as_sol(min_lamports),
                manual_hint(transport, address, min_lamports - after)
            ),
        });
    }

    Ok(true)
}
