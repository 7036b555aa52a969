mod commands;
mod config;
mod rpc;
mod tx;
mod wallet;

use clap::{Parser, Subcommand};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "flip")]
#[command(about = "Commit-reveal coinflip client and oracle referee for Ambient")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full round and write the evidence bundle
    Play {
        /// Stake per player, in SOL
        #[arg(long, default_value_t = 0.05)]
        stake: f64,
        /// Slots until an unrevealed game becomes reclaimable
        #[arg(long, default_value_t = 500)]
        deadline_slots: u64,
        /// Creator's pick (0 = heads, 1 = tails)
        #[arg(long, default_value_t = 0)]
        creator_choice: u8,
        /// Joiner's pick (0 = heads, 1 = tails)
        #[arg(long, default_value_t = 1)]
        joiner_choice: u8,
    },
    /// Submit a finished round to the arbitration oracle and poll the verdict
    Referee {
        /// Round record to verify (defaults to artifacts/round.json)
        #[arg(long)]
        round: Option<PathBuf>,
        /// Seconds between verdict polls
        #[arg(long, default_value_t = 4)]
        interval: u64,
        /// Give up after this many seconds without a verdict
        #[arg(long, default_value_t = 900)]
        timeout: u64,
    },
    /// Free a stale oracle request
    Reclaim,
    /// Show a live game account
    Status {
        /// Game account address
        game: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "flip={},flip_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let result = match cli.command {
        Commands::Play {
            stake,
            deadline_slots,
            creator_choice,
            joiner_choice,
        } => commands::play(&config, stake, deadline_slots, creator_choice, joiner_choice).await,
        Commands::Referee {
            round,
            interval,
            timeout,
        } => commands::referee(&config, round, interval, timeout).await,
        Commands::Reclaim => commands::reclaim(&config).await,
        Commands::Status { game } => commands::status(&config, &game).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
