//! "Up next" queue with an unshuffled shadow
//!
//! ```text
//! Currently Playing: Track A        (never in the queue)
//! ─────────────────────────────
//! Queue (play order):
//!   - Track D
//!   - Track B
//!   - Track C
//! ─────────────────────────────
//! Shadow (only while shuffled):
//!   - Track B
//!   - Track C
//!   - Track D
//! ```
//!
//! Every mutation keeps the shadow in step with the visible queue so that
//! turning shuffle off restores the pre-shuffle order of whatever is left.

use crate::error::{PlaybackError, Result};
use crate::shuffle::optimal_shuffle;
use vault_core::{Track, TrackId};

#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    /// Tracks in play order
    tracks: Vec<Track>,

    /// Pre-shuffle order; `Some` exactly while shuffled
    shadow: Option<Vec<Track>>,
}

impl PlaybackQueue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Unshuffled queue holding `tracks` (e.g. a restored snapshot)
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            shadow: None,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn front(&self) -> Option<&Track> {
        self.tracks.first()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shadow.is_some()
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.tracks.iter().any(|t| &t.id == id)
    }

    /// Replace the whole queue
    ///
    /// When `shuffled`, the tracks are optimally shuffled and their given
    /// order becomes the shadow.
    pub fn replace(&mut self, tracks: Vec<Track>, shuffled: bool) {
        if shuffled {
            self.tracks = optimal_shuffle(&tracks);
            self.shadow = Some(tracks);
        } else {
            self.tracks = tracks;
            self.shadow = None;
        }
    }

    /// Append one track to the end
    pub fn push(&mut self, track: Track) {
        if let Some(shadow) = &mut self.shadow {
            shadow.push(track.clone());
        }
        self.tracks.push(track);
    }

    /// Append a batch of tracks
    ///
    /// While shuffled the batch is shuffled on its own before being
    /// appended; the shadow receives it in the given order.
    pub fn extend(&mut self, tracks: Vec<Track>) {
        match &mut self.shadow {
            Some(shadow) => {
                self.tracks.extend(optimal_shuffle(&tracks));
                shadow.extend(tracks);
            }
            None => self.tracks.extend(tracks),
        }
    }

    /// Put a track back at the head (e.g. when navigating backwards)
    pub fn push_front(&mut self, track: Track) {
        if let Some(shadow) = &mut self.shadow {
            shadow.insert(0, track.clone());
        }
        self.tracks.insert(0, track);
    }

    /// Take the head of the queue
    pub fn pop_front(&mut self) -> Option<Track> {
        if self.tracks.is_empty() {
            return None;
        }
        let track = self.tracks.remove(0);
        self.forget_in_shadow(&track.id);
        Some(track)
    }

    /// Remove track at `index`
    ///
    /// Returns the removed track if successful
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }
        let track = self.tracks.remove(index);
        self.forget_in_shadow(&track.id);
        Some(track)
    }

    /// Remove every occurrence of `id`; returns whether anything was removed
    pub fn remove_track(&mut self, id: &TrackId) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| &t.id != id);
        if let Some(shadow) = &mut self.shadow {
            shadow.retain(|t| &t.id != id);
        }
        self.tracks.len() != before
    }

    /// Move the track at `from` to `to` in play order
    ///
    /// The shadow keeps its order; reordering only affects the visible queue.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.tracks.len();
        if from >= len {
            return Err(PlaybackError::IndexOutOfBounds(from));
        }
        if to >= len {
            return Err(PlaybackError::IndexOutOfBounds(to));
        }
        if from != to {
            let track = self.tracks.remove(from);
            self.tracks.insert(to, track);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        if let Some(shadow) = &mut self.shadow {
            shadow.clear();
        }
    }

    /// Turn shuffle on or off
    ///
    /// On: the current order becomes the shadow and the queue is shuffled.
    /// Off: the shadow is restored. Calling with the current state is a no-op.
    pub fn set_shuffled(&mut self, shuffled: bool) {
        match (shuffled, self.shadow.take()) {
            (true, None) => {
                let original = std::mem::take(&mut self.tracks);
                self.tracks = optimal_shuffle(&original);
                self.shadow = Some(original);
            }
            (false, Some(original)) => self.tracks = original,
            (_, shadow) => self.shadow = shadow,
        }
    }

    fn forget_in_shadow(&mut self, id: &TrackId) {
        if let Some(shadow) = &mut self.shadow {
            if let Some(pos) = shadow.iter().position(|t| &t.id == id) {
                shadow.remove(pos);
            }
        }
    }
}
