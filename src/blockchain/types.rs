//! Chain-specific types and error definitions.

use thiserror::Error;

// Re-export ChainConfig from config module to avoid duplication
pub use crate::config::schema::ChainConfig;

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Chain configuration mismatch; submitting would be meaningless.
    #[error("chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// The node refused the submission before mining it. The raw error
    /// message is kept verbatim for the rejection decoder.
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// A submitted transaction was not mined within the deadline.
    #[error("transaction not confirmed after {0} seconds")]
    ConfirmationTimeout(u64),

    /// Invalid private key format or derivation error.
    #[error("wallet error: {0}")]
    Wallet(String),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
