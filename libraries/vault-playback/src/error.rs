//! Error types for playback management

use thiserror::Error;
use vault_core::VaultError;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Stream URL or metadata resolution failed
    #[error("Resolution failed: {0}")]
    Resolution(#[from] VaultError),

    /// The audio sink refused an operation
    #[error("Audio sink error: {0}")]
    Sink(String),

    /// Preference persistence failed
    #[error("Preferences error: {0}")]
    Preferences(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
