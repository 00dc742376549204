/// Stream resolution request/response types
use super::{Quality, VersionId};
use serde::{Deserialize, Serialize};

/// Parameters for resolving a track's stream URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamRequest {
    /// Requested transcoding quality
    pub quality: Quality,

    /// Explicit version; `None` streams the active version
    pub version_id: Option<VersionId>,

    /// Public share token; switches resolution to the share path
    pub share_token: Option<String>,
}

impl StreamRequest {
    /// Request at the given quality for the active version
    pub fn new(quality: Quality) -> Self {
        Self {
            quality,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_version(mut self, version_id: Option<VersionId>) -> Self {
        self.version_id = version_id;
        self
    }

    #[must_use]
    pub fn with_share_token(mut self, token: Option<String>) -> Self {
        self.share_token = token;
        self
    }
}

/// A resolved, directly playable stream URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamUrl {
    pub url: String,
}

impl StreamUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for StreamUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}
