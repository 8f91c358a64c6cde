//! Error types for skinvault-core

use thiserror::Error;

/// Result type alias using skinvault-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in skinvault-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Rarity table cannot be used for a draw
    #[error("Invalid probability distribution: {0}")]
    InvalidDistribution(String),

    /// Chosen rarity has no skins in the case
    #[error("No skin found for rarity '{rarity}' in case {case_id}")]
    EmptyRarityPool { case_id: String, rarity: String },

    /// Remote authority could not be reached (includes timeouts)
    #[error("Remote unavailable: {0}")]
    NetworkUnavailable(String),

    /// Remote authority refused the request permanently
    #[error("Remote rejected request: {0}")]
    RemoteRejected(String),

    /// Remote authority refused the bearer token
    #[error("Remote rejected credentials")]
    Unauthorized,

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failed operation should be attempted again on the next
    /// reconciliation cycle.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable(_) | Self::Unauthorized)
    }

    /// Whether the error means the remote authority is unreachable.
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::NetworkUnavailable(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::RemoteRejected(format!("malformed response: {error}"))
        } else {
            Self::NetworkUnavailable(error.to_string())
        }
    }
}
