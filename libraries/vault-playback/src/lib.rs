//! Vault Player - Playback Management
//!
//! Client-side playback session for Vault Player.
//!
//! This crate provides:
//! - Artist-aware optimal shuffle
//! - "Up next" queue with shuffle/unshuffle that restores the original order
//! - Project context navigation (next, previous, loop-project wraparound)
//! - Race-free `play()`: only the most recent request is ever applied
//! - Next-track prefetching with a single warmed stream
//! - Lazy, cached waveform lookup
//! - Queue and volume persistence
//!
//! # Architecture
//!
//! `vault-playback` knows nothing about HTTP or audio devices. The
//! [`QueueController`] drives the collaborator traits from `vault-core`;
//! `vault-server-client` implements the network side and the embedding
//! application supplies the audio sink.
//!
//! # Example: Shuffle
//!
//! ```rust
//! use vault_core::Track;
//! use vault_playback::{adjacent_collisions, optimal_shuffle};
//!
//! let tracks = vec![
//!     Track::new("1", "One").with_artist("A"),
//!     Track::new("2", "Two").with_artist("A"),
//!     Track::new("3", "Three").with_artist("B"),
//!     Track::new("4", "Four").with_artist("B"),
//! ];
//!
//! let shuffled = optimal_shuffle(&tracks);
//! assert_eq!(shuffled.len(), 4);
//! assert_eq!(adjacent_collisions(&shuffled), 0);
//! ```
//!
//! # Example: Queue
//!
//! ```rust
//! use vault_core::Track;
//! use vault_playback::PlaybackQueue;
//!
//! let mut queue = PlaybackQueue::from_tracks(vec![
//!     Track::new("1", "One"),
//!     Track::new("2", "Two"),
//!     Track::new("3", "Three"),
//! ]);
//!
//! queue.set_shuffled(true);
//! queue.pop_front();
//! queue.set_shuffled(false);
//!
//! // The played track stays gone; the rest is back in its original order
//! assert_eq!(queue.len(), 2);
//! ```

#![forbid(unsafe_code)]

mod context;
mod controller;
mod epoch;
mod error;
pub mod events;
mod preferences;
mod prefetch;
mod queue;
pub mod shuffle;
pub mod types;
mod waveform;

// Public exports
pub use context::ProjectContext;
pub use controller::{Collaborators, QueueController};
pub use epoch::{RequestEpoch, Ticket};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use preferences::JsonFileStore;
pub use prefetch::{Prefetcher, WarmedStream};
pub use queue::PlaybackQueue;
pub use shuffle::{adjacent_collisions, optimal_shuffle, optimal_shuffle_with_rng};
pub use types::{
    PlayOptions, PlayOutcome, PlayerConfig, SessionSignal, SessionSnapshot, SinkEvent,
};
pub use waveform::{cache_key, WaveformLoader};
