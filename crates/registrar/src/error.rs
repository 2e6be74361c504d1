use crate::config::ConfigError;
use pinata::PinningError;
use story::ChainCallError;
use thiserror::Error;
use timeline::TimelineError;

/// Result type alias used throughout the registrar
pub type Result<T> = std::result::Result<T, RegistrarError>;

/// Top-level error for registrar operations
///
/// Remote-call errors keep their own taxonomy; the workflow wraps them
/// with step context before surfacing them to the caller.
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Missing or malformed user input, detected before any remote call
    #[error("invalid submission: {0}")]
    Validation(String),

    #[error(transparent)]
    Pinning(#[from] PinningError),

    #[error(transparent)]
    Chain(#[from] ChainCallError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_their_message() {
        let err: RegistrarError = PinningError::MissingHash.into();
        assert_eq!(err.to_string(), "pinning API response contained no IpfsHash");

        let err: RegistrarError = ChainCallError::ConfirmationTimeout(30).into();
        assert_eq!(err.to_string(), "confirmation timeout after 30 seconds");

        let err = RegistrarError::Validation("no file selected".to_string());
        assert_eq!(err.to_string(), "invalid submission: no file selected");
    }
}
