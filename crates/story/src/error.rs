//! Error types for the Story Protocol gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, ChainCallError>;

/// Errors that can occur while calling the Story Protocol contracts
#[derive(Debug, Error)]
pub enum ChainCallError {
    /// Configuration validation error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transaction submission was refused before inclusion
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// Transaction was confirmed but the execution reverted
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// No receipt arrived within the configured deadline
    #[error("confirmation timeout after {0} seconds")]
    ConfirmationTimeout(u64),

    /// RPC connection or network error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// An expected event was absent from the transaction logs
    #[error("expected {0} event not found in transaction logs")]
    EventMissing(&'static str),

    /// No private key configured for write operations
    #[error("no private key configured - write operations require a signer")]
    NoPrivateKey,

    /// Wallet/signer error
    #[error("wallet error: {0}")]
    Wallet(String),

    /// Provider creation or connection error
    #[error("provider error: {0}")]
    Provider(String),
}

impl ChainCallError {
    /// Check if this error is retriable
    ///
    /// Transient transport failures can be retried by the caller;
    /// reverts and configuration problems cannot.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::ConfirmationTimeout(_))
    }

    /// Check if this error indicates a configuration problem
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::NoPrivateKey | Self::Wallet(_)
        )
    }
}
