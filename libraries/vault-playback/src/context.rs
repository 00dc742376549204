//! Project context: the track list the current track was started from

use crate::shuffle::optimal_shuffle;
use vault_core::{Track, TrackId};

/// Project tracks plus, while shuffled, a shuffled projection of them
///
/// The projection is always a permutation of `tracks` and is recomputed
/// whenever the tracks or the shuffle flag change.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    tracks: Vec<Track>,
    shuffled: Option<Vec<Track>>,
}

impl ProjectContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the context, reshuffling when `shuffled`
    pub fn set_tracks(&mut self, tracks: Vec<Track>, shuffled: bool) {
        self.tracks = tracks;
        self.set_shuffled(shuffled);
    }

    /// Recompute (or drop) the shuffled projection
    pub fn set_shuffled(&mut self, shuffled: bool) {
        self.shuffled = (shuffled && !self.tracks.is_empty()).then(|| optimal_shuffle(&self.tracks));
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.shuffled = None;
    }

    /// Tracks in project order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Shuffled projection, empty unless shuffled
    pub fn shuffled_tracks(&self) -> &[Track] {
        self.shuffled.as_deref().unwrap_or_default()
    }

    /// Tracks in the order navigation follows
    pub fn active(&self) -> &[Track] {
        self.shuffled.as_deref().unwrap_or(&self.tracks)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.active().iter().position(|t| &t.id == id)
    }

    /// Track following `id` in navigation order
    pub fn next_after(&self, id: &TrackId) -> Option<&Track> {
        let pos = self.position_of(id)?;
        self.active().get(pos + 1)
    }

    /// Track preceding `id` in navigation order
    pub fn previous_before(&self, id: &TrackId) -> Option<&Track> {
        let pos = self.position_of(id)?;
        pos.checked_sub(1).and_then(|p| self.active().get(p))
    }

    /// First track in navigation order
    pub fn first(&self) -> Option<&Track> {
        self.active().first()
    }

    /// Whether `id` is the final track in navigation order
    pub fn is_last(&self, id: &TrackId) -> bool {
        self.position_of(id)
            .is_some_and(|pos| pos + 1 == self.active().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn project(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| Track::new(i.to_string(), format!("Track {}", i)).with_artist(format!("Artist {}", i % 3)))
            .collect()
    }

    #[test]
    fn navigation_follows_project_order() {
        let mut context = ProjectContext::new();
        context.set_tracks(project(3), false);

        let id = |s: &str| TrackId::new(s);
        assert_eq!(context.next_after(&id("0")).map(|t| t.id.as_str()), Some("1"));
        assert_eq!(context.previous_before(&id("1")).map(|t| t.id.as_str()), Some("0"));
        assert!(context.previous_before(&id("0")).is_none());
        assert!(context.next_after(&id("2")).is_none());
        assert!(context.is_last(&id("2")));
        assert!(!context.is_last(&id("1")));
        assert!(context.next_after(&id("missing")).is_none());
    }

    #[test]
    fn shuffled_projection_is_a_permutation() {
        let mut context = ProjectContext::new();
        context.set_tracks(project(9), true);

        let original: HashSet<&str> = context.tracks().iter().map(|t| t.id.as_str()).collect();
        let shuffled: HashSet<&str> = context.shuffled_tracks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(context.shuffled_tracks().len(), 9);
        assert_eq!(original, shuffled);
        assert_eq!(context.active().len(), 9);
    }

    #[test]
    fn turning_shuffle_off_drops_projection() {
        let mut context = ProjectContext::new();
        context.set_tracks(project(4), true);
        context.set_shuffled(false);

        assert!(context.shuffled_tracks().is_empty());
        assert_eq!(context.first().map(|t| t.id.as_str()), Some("0"));
    }

    #[test]
    fn clear_resets_everything() {
        let mut context = ProjectContext::new();
        context.set_tracks(project(4), true);
        context.clear();

        assert!(context.is_empty());
        assert!(context.active().is_empty());
        assert!(context.first().is_none());
    }
}
