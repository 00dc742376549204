//! Types for Vault server API requests and responses.

use serde::Deserialize;
use vault_core::{ProcessingStatus, Quality, TrackId, VersionId};

/// Configuration for connecting to a Vault server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the server (e.g., "https://vault.example.com")
    pub url: String,
    /// Bearer token for authenticated endpoints (cookie sessions need none)
    pub access_token: Option<String>,
}

impl ServerConfig {
    /// Create a new server config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
        }
    }

    /// Create a config with an existing token.
    pub fn with_token(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: Some(access_token.into()),
        }
    }
}

// =============================================================================
// Media Types
// =============================================================================

/// Signed stream location, usually relative to the server base URL.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamUrlResponse {
    pub url: String,
}

// =============================================================================
// Track Types
// =============================================================================

/// Track as returned by `GET /api/tracks/{id}`.
///
/// Only the fields the player needs are decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerTrack {
    pub id: TrackId,
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub active_version_id: Option<VersionId>,
    #[serde(default)]
    pub waveform: Option<String>,
    #[serde(default)]
    pub lossy_transcoding_status: Option<ProcessingStatus>,
    #[serde(default)]
    pub project_name: Option<String>,
}

/// One entry of `GET /api/tracks/{id}/versions`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackVersion {
    pub id: VersionId,
    pub track_id: TrackId,
    pub version_name: String,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub waveform: Option<String>,
    #[serde(default)]
    pub lossy_transcoding_status: Option<ProcessingStatus>,
}

// =============================================================================
// Preference Types
// =============================================================================

/// Subset of `GET /api/preferences` the player reads.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub default_quality: Option<Quality>,
}
