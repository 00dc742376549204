//! Collaborator trait implementations for the playback engine.

use crate::client::VaultServerClient;
use async_trait::async_trait;
use vault_core::{
    StreamRequest, StreamResolver, StreamUrl, TrackId, VersionId, Waveform, WaveformSource,
};

#[async_trait]
impl StreamResolver for VaultServerClient {
    async fn resolve_stream_url(
        &self,
        track_id: &TrackId,
        request: &StreamRequest,
    ) -> vault_core::Result<StreamUrl> {
        let media = self.media().await;
        Ok(media.client().stream_url(track_id, request).await?)
    }
}

#[async_trait]
impl WaveformSource for VaultServerClient {
    async fn fetch_waveform(
        &self,
        track_id: &TrackId,
        version_id: Option<&VersionId>,
    ) -> vault_core::Result<Option<Waveform>> {
        let tracks = self.tracks().await;
        Ok(tracks.client().get_waveform(track_id, version_id).await?)
    }
}
