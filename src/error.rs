//! Error types for the ledger

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ChainError {
    MalformedTransaction(String),
    InvalidAmount(String),
    Serialization(String),
    ProofNotFound { last_proof: u64, attempts: u64 },
    MiningCancelled,
    MiningAlreadyRunning,
    MiningNotRunning,
    MiningTask(String),
    EmptyChain,
    InvalidBlock(String),
    InvalidBlockLinkage(String),
    InvalidProofOfWork(String),
}

impl ChainError {
    /// Whether the caller may simply try the same operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChainError::ProofNotFound { .. } | ChainError::MiningCancelled
        )
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::MalformedTransaction(msg) => write!(f, "Malformed transaction: {}", msg),
            ChainError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            ChainError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ChainError::ProofNotFound {
                last_proof,
                attempts,
            } => write!(
                f,
                "No valid proof found for last proof {} after {} attempts",
                last_proof, attempts
            ),
            ChainError::MiningCancelled => write!(f, "Mining was cancelled"),
            ChainError::MiningAlreadyRunning => write!(f, "Mining is already running"),
            ChainError::MiningNotRunning => write!(f, "Mining is not running"),
            ChainError::MiningTask(msg) => write!(f, "Mining task failed: {}", msg),
            ChainError::EmptyChain => write!(f, "Chain contains no blocks"),
            ChainError::InvalidBlock(msg) => write!(f, "Invalid block: {}", msg),
            ChainError::InvalidBlockLinkage(msg) => write!(f, "Invalid block linkage: {}", msg),
            ChainError::InvalidProofOfWork(msg) => write!(f, "Invalid proof of work: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Serialization(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
