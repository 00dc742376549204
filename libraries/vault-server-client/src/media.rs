//! Stream URL resolution.

use crate::client::{endpoint, get, read_json};
use crate::error::Result;
use crate::types::StreamUrlResponse;
use reqwest::Client;
use tracing::debug;
use vault_core::{StreamRequest, StreamUrl, TrackId};

/// Media client for the Vault server.
pub struct MediaClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    access_token: Option<&'a str>,
}

impl<'a> MediaClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, access_token: Option<&'a str>) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// Resolve a directly playable URL for `track_id`.
    ///
    /// With a share token the public share path is returned without a
    /// network call. Otherwise the signed URL is requested from
    /// `/api/media/stream/{id}` and made absolute against the base URL.
    pub async fn stream_url(&self, track_id: &TrackId, request: &StreamRequest) -> Result<StreamUrl> {
        if let Some(token) = &request.share_token {
            return share_stream_url(self.base_url, token, track_id);
        }

        let url = endpoint(self.base_url, &["api", "media", "stream", track_id.as_str()])?;
        let mut query = vec![("quality", request.quality.as_str().to_string())];
        if let Some(version) = &request.version_id {
            query.push(("version_id", version.to_string()));
        }

        debug!(track_id = %track_id, quality = %request.quality, "Requesting signed stream URL");

        let response = get(self.http, url, self.access_token, &query).await?;
        let signed: StreamUrlResponse = read_json(response, "Track", track_id.as_str()).await?;

        Ok(StreamUrl::new(absolutize(self.base_url, &signed.url)))
    }
}

/// Public stream URL for a track reached through a share link
pub fn share_stream_url(base_url: &str, token: &str, track_id: &TrackId) -> Result<StreamUrl> {
    let url = endpoint(base_url, &["api", "share", token, "stream", track_id.as_str()])?;
    Ok(StreamUrl::new(url.to_string()))
}

/// Signed URLs come back relative to the server; absolute ones pass through.
fn absolutize(base_url: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if url.starts_with('/') {
        format!("{}{}", base_url, url)
    } else {
        format!("{}/{}", base_url, url)
    }
}
