//! Playback Events
//!
//! Event-based communication for UI synchronization. The controller queues
//! events as state changes; the UI layer drains them with
//! [`crate::QueueController::drain_events`].

use serde::{Deserialize, Serialize};
use vault_core::LoopMode;

/// Events emitted by the queue controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// Current track changed (`None` after stop or session loss)
    TrackChanged {
        track_id: Option<String>,
        previous_track_id: Option<String>,
    },

    /// A stream was attached to the sink for the current track
    StreamAttached {
        track_id: String,
        /// Whether a prefetched stream was reused
        prefetched: bool,
    },

    /// Playing flag changed
    PlayingChanged { is_playing: bool },

    /// Queue contents or order changed
    QueueChanged { length: usize },

    /// Project context replaced
    ContextChanged { length: usize },

    ShuffleChanged { enabled: bool },

    LoopModeChanged { mode: LoopMode },

    VolumeChanged { volume: f32 },

    /// Duration of the current track became known
    DurationChanged { duration_ms: u64 },

    /// Position update reported by the sink (periodic)
    PositionChanged {
        position_ms: u64,
        /// `None` until the sink reports metadata
        duration_ms: Option<u64>,
    },

    /// Session lost; current track, queue and context were cleared
    SessionCleared,

    /// Playback failed for a track; state was left unchanged
    Error { track_id: Option<String>, message: String },
}
