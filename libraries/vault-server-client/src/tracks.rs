//! Track and version metadata.

use crate::client::{endpoint, get, read_json};
use crate::error::Result;
use crate::types::{ServerTrack, TrackVersion};
use reqwest::Client;
use tracing::debug;
use vault_core::{TrackId, VersionId, Waveform};

/// Tracks client for the Vault server.
pub struct TracksClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    access_token: Option<&'a str>,
}

impl<'a> TracksClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, access_token: Option<&'a str>) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// Get a single track (active version metadata).
    pub async fn get_track(&self, track_id: &TrackId) -> Result<ServerTrack> {
        let url = endpoint(self.base_url, &["api", "tracks", track_id.as_str()])?;
        debug!(track_id = %track_id, "Fetching track");

        let response = get(self.http, url, self.access_token, &[]).await?;
        read_json(response, "Track", track_id.as_str()).await
    }

    /// Get all versions of a track.
    pub async fn get_versions(&self, track_id: &TrackId) -> Result<Vec<TrackVersion>> {
        let url = endpoint(self.base_url, &["api", "tracks", track_id.as_str(), "versions"])?;
        debug!(track_id = %track_id, "Fetching track versions");

        let response = get(self.http, url, self.access_token, &[]).await?;
        let versions: Vec<TrackVersion> = read_json(response, "Track", track_id.as_str()).await?;

        debug!(track_id = %track_id, count = versions.len(), "Fetched track versions");
        Ok(versions)
    }

    /// Waveform of a specific version, or of the active version.
    ///
    /// A requested version that is missing or has no waveform yields
    /// `None`; the active version's waveform never stands in for it.
    pub async fn get_waveform(
        &self,
        track_id: &TrackId,
        version_id: Option<&VersionId>,
    ) -> Result<Option<Waveform>> {
        let waveform = match version_id {
            Some(version_id) => self
                .get_versions(track_id)
                .await?
                .into_iter()
                .find(|v| &v.id == version_id)
                .and_then(|v| v.waveform),
            None => self.get_track(track_id).await?.waveform,
        };

        Ok(waveform.filter(|w| !w.is_empty()).map(Waveform::new))
    }
}
