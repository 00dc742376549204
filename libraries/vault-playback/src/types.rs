//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vault_core::{LoopMode, Quality, StreamUrl, Track};

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Quality used until a preference is loaded, and after session loss
    pub default_quality: Quality,

    /// Delay between a successful play and the next-track prefetch
    pub prefetch_delay_ms: u64,

    /// Position past which "previous" restarts the current track
    pub restart_threshold_secs: f64,

    /// Window after a restart in which "previous" navigates back instead
    pub double_tap_window_ms: u64,

    /// Preference key for the persisted queue snapshot
    pub queue_storage_key: String,

    /// Preference key for the persisted volume
    pub volume_storage_key: String,

    /// Volume used when nothing is persisted (0.0 - 1.0)
    pub initial_volume: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_quality: Quality::Lossy,
            prefetch_delay_ms: 100,
            restart_threshold_secs: 3.0,
            double_tap_window_ms: 1500,
            queue_storage_key: "audioPlayerQueue".to_string(),
            volume_storage_key: "audioPlayerVolume".to_string(),
            initial_volume: 1.0,
        }
    }
}

impl PlayerConfig {
    pub fn prefetch_delay(&self) -> Duration {
        Duration::from_millis(self.prefetch_delay_ms)
    }

    pub fn restart_threshold(&self) -> Duration {
        Duration::from_secs_f64(self.restart_threshold_secs.max(0.0))
    }

    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }
}

/// Optional arguments to [`crate::QueueController::play`]
#[derive(Debug, Clone)]
pub struct PlayOptions {
    /// Replace the project context with these tracks
    pub project_tracks: Option<Vec<Track>>,

    /// Replace the queue with these tracks
    pub queue_tracks: Option<Vec<Track>>,

    /// Start playback once the stream is attached
    pub autoplay: bool,

    /// Ignore a prefetched stream for this track and resolve again
    pub force_reload: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            project_tracks: None,
            queue_tracks: None,
            autoplay: true,
            force_reload: false,
        }
    }
}

impl PlayOptions {
    #[must_use]
    pub fn with_project(mut self, tracks: Vec<Track>) -> Self {
        self.project_tracks = Some(tracks);
        self
    }

    #[must_use]
    pub fn with_queue(mut self, tracks: Vec<Track>) -> Self {
        self.queue_tracks = Some(tracks);
        self
    }

    #[must_use]
    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    #[must_use]
    pub fn force_reload(mut self, force: bool) -> Self {
        self.force_reload = force;
        self
    }
}

/// What happened to a `play()` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The track is now current and its stream is attached
    Applied,
    /// A newer request took over before this one completed
    Superseded,
    /// The track is not playable yet (still processing)
    Rejected,
}

/// Signals reported by the audio sink
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SinkEvent {
    Playing,
    Paused,
    /// Natural end of playback
    Ended,
    MetadataLoaded(Duration),
    TimeUpdate(Duration),
}

/// Authentication state changes delivered by the session layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    Authenticated,
    SessionLost,
}

/// Read-only view of the playback session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub current_track: Option<Track>,
    pub stream_url: Option<StreamUrl>,
    pub is_playing: bool,
    pub loop_mode: LoopMode,
    pub is_shuffled: bool,
    pub queue: Vec<Track>,
    pub project_tracks: Vec<Track>,
    /// Empty unless shuffle is active
    pub shuffled_project_tracks: Vec<Track>,
    pub duration: Option<Duration>,
    pub position: Duration,
    pub volume: f32,
    pub quality: Quality,
}
