//! Client error types.
//!
//! The sync protocol distinguishes two terminal failures: `Network`
//! (transport failure or non-2xx status) and `Decode` (response body that
//! does not parse). Neither is retried internally — a failed pass aborts
//! whole, and the caller decides whether to try again.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in API and sync operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("storage error: {0}")]
    Storage(#[from] blocksync_store::StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
