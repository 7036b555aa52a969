use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlipError>;

#[derive(Error, Debug)]
pub enum FlipError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Funding failed for {address}: {hint}")]
    Funding { address: String, hint: String },

    #[error("Invalid game phase: {0}")]
    Phase(String),

    #[error("Instruction encoding error: {0}")]
    Encoding(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Choice must be 0 or 1, got {0}")]
    InvalidChoice(u8),

    #[error("No valid program-derived address for the given seeds")]
    BumpNotFound,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Malformed account data: {0}")]
    MalformedAccount(String),

    #[error("Oracle verdict not posted after {attempts} attempts ({elapsed_secs}s)")]
    OracleTimeout { attempts: u32, elapsed_secs: u64 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlipError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn phase(msg: impl Into<String>) -> Self {
        Self::Phase(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
