//! Error types for the Vault server client.

use thiserror::Error;
use vault_core::VaultError;

/// Errors that can occur when talking to a Vault server.
#[derive(Error, Debug)]
pub enum ServerClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Authentication required or the session expired
    #[error("Authentication required")]
    AuthRequired,

    /// Resource does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

/// Result type for server client operations.
pub type Result<T> = std::result::Result<T, ServerClientError>;

impl From<ServerClientError> for VaultError {
    fn from(err: ServerClientError) -> Self {
        match err {
            ServerClientError::AuthRequired => VaultError::Unauthorized,
            ServerClientError::NotFound { entity, id } => VaultError::not_found(entity, id),
            ServerClientError::ServerError { status, message } => {
                VaultError::Server { status, message }
            }
            ServerClientError::InvalidUrl(msg) => VaultError::InvalidInput(msg),
            ServerClientError::Request(e) => VaultError::network(e.to_string()),
            ServerClientError::ServerUnreachable(msg) | ServerClientError::ParseError(msg) => {
                VaultError::network(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_core_errors() {
        let err: VaultError = ServerClientError::AuthRequired.into();
        assert!(matches!(err, VaultError::Unauthorized));

        let err: VaultError = ServerClientError::NotFound {
            entity: "Track",
            id: "9".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Track not found: 9");

        let err: VaultError = ServerClientError::ServerError {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(matches!(err, VaultError::Server { status: 502, .. }));
    }
}
