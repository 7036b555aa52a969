use crate::config::Config;
use crate::rpc::RpcTransport;
use crate::wallet::Keypair;
use anyhow::{bail, Context};
use comfy_table::{presets::UTF8_FULL, Table};
use flip_core::{
    funding, Choice, GameAccount, LedgerTransport, OracleClient, PollConfig, Pubkey,
    RefereeRecord, Round, RoundEvidence, LAMPORTS_PER_SOL,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const JOINER_MIN_LAMPORTS: u64 = LAMPORTS_PER_SOL / 10; // 0.1
const JOINER_TOPUP_LAMPORTS: u64 = LAMPORTS_PER_SOL / 5; // 0.2

fn as_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Run one full round: create, join, both reveals, outcome read-back,
/// finalize. Writes the evidence bundle on success only.
pub async fn play(
    config: &Config,
    stake_sol: f64,
    deadline_slots: u64,
    creator_choice: u8,
    joiner_choice: u8,
) -> anyhow::Result<()> {
    let creator_choice = Choice::try_from(creator_choice)?;
    let joiner_choice = Choice::try_from(joiner_choice)?;
    let stake_lamports = (stake_sol * LAMPORTS_PER_SOL as f64).floor() as u64;
    if stake_lamports == 0 {
        bail!("stake of {stake_sol} is below one lamport");
    }

    let creator_keypair = Keypair::load(&config.wallet_path)?;
    let joiner_keypair = Keypair::load(&config.joiner_wallet_path).with_context(|| {
        format!(
            "joiner wallet {} (set FLIP_JOINER_WALLET to use another file)",
            config.joiner_wallet_path.display()
        )
    })?;
    let creator = creator_keypair.pubkey();
    let joiner = joiner_keypair.pubkey();

    let transport: Arc<dyn LedgerTransport> = Arc::new(RpcTransport::new(
        config.rpc_url.clone(),
        vec![creator_keypair, joiner_keypair],
    ));

    let mut round = Round::new(
        transport.clone(),
        config.program_id,
        creator,
        creator_choice,
        stake_lamports,
        deadline_slots,
    )?;

    println!("=== COINFLIP (AMBIENT) ===");
    println!("rpc     : {}", config.rpc_url);
    println!("program : {}", config.program_id);
    println!("creator : {creator}");
    println!("joiner  : {joiner}");
    println!("game    : {}", round.game().address);
    println!("vault   : {}", round.game().vault);
    println!("stake   : {stake_sol} SOL");
    println!();

    let creator_start = transport.balance(&creator).await?;
    let joiner_start = transport.balance(&joiner).await?;
    println!("creator balance (start): {}", as_sol(creator_start));
    println!("joiner  balance (start): {}", as_sol(joiner_start));

    if funding::ensure_funded(
        transport.as_ref(),
        &joiner,
        JOINER_MIN_LAMPORTS,
        JOINER_TOPUP_LAMPORTS,
    )
    .await?
    {
        println!(
            "joiner  balance (funded): {}",
            as_sol(transport.balance(&joiner).await?)
        );
    }
    println!();

    println!("1) create_game...");
    println!("   tx: {}", round.create().await?);

    println!("2) join_game...");
    println!("   tx: {}", round.join(joiner, joiner_choice).await?);

    println!("3) reveal_creator...");
    println!("   tx: {}", round.reveal_creator().await?);

    println!("4) reveal_joiner...");
    println!("   tx: {}", round.reveal_joiner().await?);

    let (coin, winner) = round.read_outcome().await?;
    println!();
    println!("=== RESULT (pre-finalize) ===");
    println!("coin   : {coin}");
    println!("winner : {winner}");
    println!();

    println!("5) finalize...");
    println!("   tx: {}", round.finalize().await?);

    let creator_end = transport.balance(&creator).await?;
    let joiner_end = transport.balance(&joiner).await?;

    let evidence = round.into_evidence()?;
    let path = config.round_path();
    evidence.save_json(&path)?;

    println!();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Step", "Transaction"]);
    table.add_row(vec!["create_game", &evidence.txs.create]);
    table.add_row(vec!["join_game", &evidence.txs.join]);
    table.add_row(vec!["reveal_creator", &evidence.txs.reveal_creator]);
    table.add_row(vec!["reveal_joiner", &evidence.txs.reveal_joiner]);
    table.add_row(vec!["finalize", &evidence.txs.finalize]);
    println!("{table}");

    println!();
    println!("=== BALANCES (end) ===");
    println!(
        "creator: {} (delta {:+.9})",
        as_sol(creator_end),
        as_sol(creator_end) - as_sol(creator_start)
    );
    println!(
        "joiner : {} (delta {:+.9})",
        as_sol(joiner_end),
        as_sol(joiner_end) - as_sol(joiner_start)
    );
    println!();
    println!("wrote {}", path.display());

    Ok(())
}

/// Submit a finished round to the arbitration oracle and wait for its
/// verdict.
pub async fn referee(
    config: &Config,
    round_path: Option<PathBuf>,
    interval_secs: u64,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    let round_path = round_path.unwrap_or_else(|| config.round_path());
    let evidence = RoundEvidence::load_json(&round_path)
        .with_context(|| format!("round record {}", round_path.display()))?;

    let payer_keypair = Keypair::load(&config.wallet_path)?;
    let payer = payer_keypair.pubkey();
    let transport: Arc<dyn LedgerTransport> = Arc::new(RpcTransport::new(
        config.rpc_url.clone(),
        vec![payer_keypair],
    ));
    let oracle = OracleClient::new(transport, config.oracle_program_id, payer);

    println!("=== TOOL ORACLE REFEREE ===");
    println!("payer   : {payer}");
    println!("game    : {}", evidence.game);
    println!("request : {}", oracle.request_address()?);
    println!("output  : {}", oracle.output_address()?);

    let request = oracle.submit_verification(&evidence).await?;
    println!("request tx: {}", request.tx);
    println!("prompt    : {}", request.prompt);
    println!();
    println!("waiting for verdict (every {interval_secs}s, up to {timeout_secs}s)...");

    let poll = PollConfig {
        interval: Duration::from_secs(interval_secs),
        max_attempts: None,
        timeout: Some(Duration::from_secs(timeout_secs)),
    };
    let verdict = oracle
        .poll_verdict(
            &request.output_address,
            &poll,
            &flip_core::oracle::TERMINAL_TOKENS,
        )
        .await?;

    println!();
    println!(
        "[VERDICT] {} (after {} attempts, {}s)",
        verdict.token,
        verdict.attempts,
        verdict.elapsed.as_secs()
    );

    let record = RefereeRecord {
        tx: request.tx,
        verdict: verdict.token,
        round: evidence,
    };
    let path = config.referee_path();
    record.save_json(&path)?;
    println!("wrote {}", path.display());

    Ok(())
}

/// Free a stale oracle request so the payer can submit again.
pub async fn reclaim(config: &Config) -> anyhow::Result<()> {
    let payer_keypair = Keypair::load(&config.wallet_path)?;
    let payer = payer_keypair.pubkey();
    let transport: Arc<dyn LedgerTransport> = Arc::new(RpcTransport::new(
        config.rpc_url.clone(),
        vec![payer_keypair],
    ));
    let oracle = OracleClient::new(transport, config.oracle_program_id, payer);

    match oracle.reclaim(&payer).await? {
        Some(tx) => println!("reclaimed oracle accounts: {tx}"),
        None => println!("nothing to reclaim"),
    }
    Ok(())
}

/// Fetch and display a live game account.
pub async fn status(config: &Config, game_address: &str) -> anyhow::Result<()> {
    let address: Pubkey = game_address.parse()?;
    let transport = RpcTransport::new(config.rpc_url.clone(), vec![]);

    let data = transport
        .account_data(&address)
        .await?
        .with_context(|| format!("game account {address} does not exist"))?;
    let game = GameAccount::parse(&data)?;

    println!("Game {address}");
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec!["status".to_string(), format!("{:?}", game.status)]);
    table.add_row(vec!["creator".to_string(), game.creator.to_string()]);
    table.add_row(vec!["joiner".to_string(), game.joiner.to_string()]);
    table.add_row(vec![
        "stake".to_string(),
        format!("{} SOL", as_sol(game.stake_lamports)),
    ]);
    table.add_row(vec![
        "revealed".to_string(),
        format!(
            "creator: {}, joiner: {}",
            game.revealed_creator, game.revealed_joiner
        ),
    ]);
    table.add_row(vec![
        "deadline slot".to_string(),
        game.reveal_deadline_slot.to_string(),
    ]);
    table.add_row(vec!["coin".to_string(), game.coin.to_string()]);
    table.add_row(vec!["winner".to_string(), game.winner.to_string()]);
    println!("{table}");

    Ok(())
}
