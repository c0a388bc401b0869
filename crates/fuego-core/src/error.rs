//! Error types for fuego-core

use thiserror::Error;

/// Failure kinds of the proof pipeline.
///
/// Every variant aborts the request; none of them is ever folded into a
/// partially populated package.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// Upstream has no such transaction or block
    #[error("Not found: {0}")]
    NotFound(String),

    /// Timeout or connection failure talking to the daemon
    #[error("Network error: {0}")]
    Network(String),

    /// Daemon answered with a structured error payload
    #[error("RPC error: {message}")]
    Rpc { code: Option<i64>, message: String },

    /// Recomputed Merkle root disagrees with the block header
    #[error("Proof construction failed: {0}")]
    ProofConstruction(String),

    /// Commitment tag missing or payload of the wrong size
    #[error("Malformed tx_extra: {0}")]
    MalformedExtra(String),

    /// Caller supplied an unusable value (bad hex, wrong hash length)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Daemon payload did not match the expected schema
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ProofError {
    /// Only transport failures are worth retrying by the caller
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProofError::Network(_))
    }

    /// Stable label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ProofError::NotFound(_) => "not_found",
            ProofError::Network(_) => "network",
            ProofError::Rpc { .. } => "rpc",
            ProofError::ProofConstruction(_) => "proof_construction",
            ProofError::MalformedExtra(_) => "malformed_extra",
            ProofError::InvalidInput(_) => "invalid_input",
            ProofError::Decode(_) => "decode",
        }
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
