use thiserror::Error;

/// Result type alias for pinning operations
pub type Result<T> = std::result::Result<T, PinningError>;

/// Errors that can occur while pinning content
#[derive(Debug, Error)]
pub enum PinningError {
    /// The pinning API responded with a non-success status
    #[error("pinning API returned {status}: {message}")]
    Upstream {
        /// HTTP status code returned by the API
        status: u16,
        /// Response body text for diagnosis
        message: String,
    },

    /// The API responded with success but no content hash
    #[error("pinning API response contained no IpfsHash")]
    MissingHash,

    /// Transport-level failure reaching the API
    #[error("pinning request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Content could not be serialized for upload
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PinningError {
    /// Check if this error came from the remote service rather than
    /// the local process
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::MissingHash)
    }
}
