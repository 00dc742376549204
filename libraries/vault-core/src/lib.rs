//! Vault Player Core
//!
//! Shared domain types, collaborator traits, and error handling for Vault Player.
//!
//! The playback engine in `vault-playback` never talks to the network or an
//! audio device directly. Everything it needs from the outside world is
//! expressed here as a trait:
//!
//! - **Stream resolution**: [`StreamResolver`] turns a track into a playable URL
//! - **Waveforms**: [`WaveformSource`] fetches waveform payloads on demand
//! - **Audio output**: [`AudioSink`] and [`PreparedStream`] model the single
//!   streaming sink of a session and its pre-warmed resources
//! - **Preferences**: [`PreferenceStore`] persists volume and queue snapshots
//!
//! # Example
//!
//! ```rust
//! use vault_core::types::{ProcessingStatus, Track};
//!
//! let track = Track::new("42", "Night Drive")
//!     .with_artist("Lumen")
//!     .with_status(ProcessingStatus::Completed);
//!
//! assert!(track.is_playable());
//! assert_eq!(track.id.as_str(), "42");
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod storage;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, VaultError};
pub use storage::{MemoryPreferenceStore, PreferenceStore};
pub use traits::{AudioSink, PreparedStream, StreamResolver, WaveformSource};

pub use types::{
    LoopMode, ProcessingStatus, Quality, StreamRequest, StreamUrl, Track, TrackId, VersionId,
    Waveform,
};
