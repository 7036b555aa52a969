use flip_core::{FlipError, Pubkey, Result};
use std::path::PathBuf;

/// Deployed program identities; override with the FLIP_PROGRAM_ID and
/// FLIP_ORACLE_PROGRAM_ID variables when targeting another deployment.
const DEFAULT_PROGRAM_ID: &str = "61LZE86MZSN8vKj9fXStz3LXnFkhkBXy6LNUBaPSAJdi";
const DEFAULT_ORACLE_PROGRAM_ID: &str = "721QWDeUzVL77UCzCFHsVGCMBVup8GsAMPaD2YvWvw97";

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub wallet_path: PathBuf,
    pub joiner_wallet_path: PathBuf,
    pub program_id: Pubkey,
    pub oracle_program_id: Pubkey,
    pub artifacts_dir: PathBuf,
}

impl Config {
    /// Resolve the environment once, before any orchestration begins.
    /// `FLIP_RPC_URL` and `FLIP_WALLET` are required.
    pub fn from_env() -> Result<Self> {
        let rpc_url = required("FLIP_RPC_URL")?;
        let wallet_path = PathBuf::from(required("FLIP_WALLET")?);

        let joiner_wallet_path = std::env::var("FLIP_JOINER_WALLET")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config/solana/joiner.json")
            });

        let program_id = parse_program("FLIP_PROGRAM_ID", DEFAULT_PROGRAM_ID)?;
        let oracle_program_id = parse_program("FLIP_ORACLE_PROGRAM_ID", DEFAULT_ORACLE_PROGRAM_ID)?;

        let artifacts_dir = std::env::var("FLIP_ARTIFACTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("artifacts"));

        Ok(Self {
            rpc_url,
            wallet_path,
            joiner_wallet_path,
            program_id,
            oracle_program_id,
            artifacts_dir,
        })
    }

    pub fn round_path(&self) -> PathBuf {
        self.artifacts_dir.join("round.json")
    }

    pub fn referee_path(&self) -> PathBuf {
        self.artifacts_dir.join("referee.json")
    }
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| {
        FlipError::config(format!(
            "{name} is not set; export it before running (see README)"
        ))
    })
}

fn parse_program(name: &str, default: &str) -> Result<Pubkey> {
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e| FlipError::config(format!("{name}: {e}")))
}
