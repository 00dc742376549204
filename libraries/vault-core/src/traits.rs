/// Collaborator traits for the playback engine
use crate::error::Result;
use crate::types::{StreamRequest, StreamUrl, TrackId, VersionId, Waveform};
use async_trait::async_trait;
use std::time::Duration;

/// Resolves a track into a directly playable stream URL
///
/// Implementations must be idempotent and side-effect free: the engine
/// may call this several times for the same track (play and prefetch)
/// and simply ignores results it no longer needs.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Resolve the stream URL for `track_id`
    ///
    /// When `request.share_token` is set the public share path is used
    /// instead of the authenticated one.
    ///
    /// # Errors
    /// Returns an error if the resolver cannot produce a URL
    async fn resolve_stream_url(
        &self,
        track_id: &TrackId,
        request: &StreamRequest,
    ) -> Result<StreamUrl>;
}

/// Fetches waveform payloads
#[async_trait]
pub trait WaveformSource: Send + Sync {
    /// Fetch the waveform for a track
    ///
    /// With a `version_id`, the returned waveform must belong to that
    /// version. `Ok(None)` means the server has no waveform.
    async fn fetch_waveform(
        &self,
        track_id: &TrackId,
        version_id: Option<&VersionId>,
    ) -> Result<Option<Waveform>>;
}

/// A warmed, unstarted audio resource
///
/// Produced by [`AudioSink::prepare`] for the track expected to play next.
pub trait PreparedStream: Send + Sync {
    /// URL this resource was prepared for
    fn url(&self) -> &StreamUrl;

    /// Release the underlying resource without playing it
    fn release(self: Box<Self>);
}

/// The single streaming audio output of a session
///
/// The engine drives the sink; the sink reports back through
/// `SinkEvent`s delivered to the controller by the platform layer.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Attach a new source. Must not start playback.
    fn set_source(&self, url: &StreamUrl);

    /// Attach a prepared resource instead of loading a fresh one
    ///
    /// The default implementation releases the resource and loads its URL.
    fn attach_prepared(&self, prepared: Box<dyn PreparedStream>) {
        let url = prepared.url().clone();
        prepared.release();
        self.set_source(&url);
    }

    /// Pause and drop the current source
    fn detach(&self);

    /// Create an unstarted resource for `url`
    fn prepare(&self, url: &StreamUrl) -> Box<dyn PreparedStream>;

    /// Start or resume playback
    ///
    /// # Errors
    /// Returns an error if the sink refuses to start (e.g. autoplay blocked)
    async fn play(&self) -> Result<()>;

    /// Pause playback
    fn pause(&self);

    /// Seek within the current source
    fn seek(&self, position: Duration);

    /// Current playback position
    fn position(&self) -> Duration;

    /// Duration of the current source, once known
    fn duration(&self) -> Option<Duration>;

    /// Set output volume (0.0 - 1.0)
    fn set_volume(&self, volume: f32);
}
