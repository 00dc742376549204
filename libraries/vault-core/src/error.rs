/// Core error types for Vault Player
use thiserror::Error;

/// Result type alias using `VaultError`
pub type Result<T> = std::result::Result<T, VaultError>;

/// Core error type shared by collaborator implementations
#[derive(Error, Debug)]
pub enum VaultError {
    /// Network request failed or the server could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Authentication required or rejected
    #[error("Unauthorized")]
    Unauthorized,

    /// Server answered with an unexpected status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Preference storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Audio sink errors
    #[error("Audio sink error: {0}")]
    Sink(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VaultError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a not-found error for an entity
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an audio sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }
}
