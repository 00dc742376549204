//! Next-track prefetching
//!
//! Holds at most one warmed, unstarted stream: the one for the track that
//! would play next. The resolution work itself is driven by the controller,
//! which knows what "next" means; this type owns the bookkeeping around it:
//! its own request epoch, the warmed resource, and the scheduled task.

use crate::epoch::{RequestEpoch, Ticket};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::debug;
use vault_core::{PreparedStream, StreamUrl, TrackId, VersionId};

/// A stream prepared ahead of time for a specific track version
pub struct WarmedStream {
    pub track_id: TrackId,
    pub version_id: Option<VersionId>,
    pub url: StreamUrl,
    pub resource: Box<dyn PreparedStream>,
}

impl WarmedStream {
    fn matches(&self, track_id: &TrackId, version_id: Option<&VersionId>) -> bool {
        &self.track_id == track_id && self.version_id.as_ref() == version_id
    }

    fn release(self) {
        debug!(track_id = %self.track_id, "Releasing prefetched stream");
        self.resource.release();
    }
}

impl std::fmt::Debug for WarmedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarmedStream")
            .field("track_id", &self.track_id)
            .field("version_id", &self.version_id)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct Prefetcher {
    epoch: RequestEpoch,
    warmed: Mutex<Option<WarmedStream>>,
    scheduled: Mutex<Option<JoinHandle<()>>>,
}

impl Prefetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a prefetch attempt, superseding earlier ones
    pub fn begin(&self) -> Ticket {
        self.epoch.advance()
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.epoch.is_current(ticket)
    }

    /// Track the warmed stream belongs to
    pub fn warmed_track(&self) -> Option<TrackId> {
        self.warmed().as_ref().map(|w| w.track_id.clone())
    }

    /// Whether a stream for exactly this track version is warmed
    pub fn is_warmed(&self, track_id: &TrackId, version_id: Option<&VersionId>) -> bool {
        self.warmed()
            .as_ref()
            .is_some_and(|w| w.matches(track_id, version_id))
    }

    /// Store a freshly warmed stream if `ticket` is still current
    ///
    /// Any previously warmed stream is released. A stale ticket releases
    /// the new resource instead; returns whether it was kept.
    pub fn store(&self, ticket: Ticket, stream: WarmedStream) -> bool {
        let mut warmed = self.warmed();
        if !self.epoch.is_current(ticket) {
            drop(warmed);
            stream.release();
            return false;
        }
        if let Some(previous) = warmed.replace(stream) {
            previous.release();
        }
        true
    }

    /// Hand over the warmed stream if it was prepared for this track version
    pub fn take_if_match(
        &self,
        track_id: &TrackId,
        version_id: Option<&VersionId>,
    ) -> Option<WarmedStream> {
        let mut warmed = self.warmed();
        if warmed.as_ref().is_some_and(|w| w.matches(track_id, version_id)) {
            warmed.take()
        } else {
            None
        }
    }

    /// Hand over whatever is warmed
    pub fn take(&self) -> Option<WarmedStream> {
        self.warmed().take()
    }

    /// Release the warmed stream and supersede in-flight attempts
    pub fn clear(&self) {
        self.epoch.invalidate();
        let previous = self.warmed().take();
        if let Some(previous) = previous {
            previous.release();
        }
    }

    /// Remember the task that will run the next attempt, aborting any
    /// attempt that has not started yet
    pub fn schedule(&self, handle: JoinHandle<()>) {
        let mut scheduled = self.scheduled.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = scheduled.replace(handle) {
            previous.abort();
        }
    }

    pub fn cancel_scheduled(&self) {
        let handle = self
            .scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    /// Tear everything down (session loss, controller shutdown)
    pub fn shutdown(&self) {
        self.cancel_scheduled();
        self.clear();
    }

    fn warmed(&self) -> MutexGuard<'_, Option<WarmedStream>> {
        self.warmed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct TestStream {
        url: StreamUrl,
        released: Arc<AtomicUsize>,
    }

    impl PreparedStream for TestStream {
        fn url(&self) -> &StreamUrl {
            &self.url
        }

        fn release(self: Box<Self>) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn warmed(id: &str, released: &Arc<AtomicUsize>) -> WarmedStream {
        let url = StreamUrl::new(format!("https://cdn.test/{}", id));
        WarmedStream {
            track_id: TrackId::new(id),
            version_id: None,
            url: url.clone(),
            resource: Box::new(TestStream {
                url,
                released: released.clone(),
            }),
        }
    }

    #[test]
    fn store_replaces_and_releases_previous() {
        let released = Arc::new(AtomicUsize::new(0));
        let prefetcher = Prefetcher::new();

        assert!(prefetcher.store(prefetcher.begin(), warmed("a", &released)));
        assert!(prefetcher.store(prefetcher.begin(), warmed("b", &released)));

        assert_eq!(prefetcher.warmed_track(), Some(TrackId::new("b")));
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_ticket_is_rejected() {
        let released = Arc::new(AtomicUsize::new(0));
        let prefetcher = Prefetcher::new();

        let stale = prefetcher.begin();
        let _fresh = prefetcher.begin();

        assert!(!prefetcher.store(stale, warmed("a", &released)));
        assert!(prefetcher.warmed_track().is_none());
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn take_if_match_checks_track_and_version() {
        let released = Arc::new(AtomicUsize::new(0));
        let prefetcher = Prefetcher::new();
        prefetcher.store(prefetcher.begin(), warmed("a", &released));

        let version = VersionId::new("2");
        assert!(prefetcher.take_if_match(&TrackId::new("b"), None).is_none());
        assert!(prefetcher
            .take_if_match(&TrackId::new("a"), Some(&version))
            .is_none());

        let taken = prefetcher.take_if_match(&TrackId::new("a"), None).unwrap();
        assert_eq!(taken.url.as_str(), "https://cdn.test/a");
        assert!(prefetcher.warmed_track().is_none());
        assert_eq!(released.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clear_releases_and_invalidates() {
        let released = Arc::new(AtomicUsize::new(0));
        let prefetcher = Prefetcher::new();

        let ticket = prefetcher.begin();
        prefetcher.clear();
        assert!(!prefetcher.is_current(ticket));

        prefetcher.store(prefetcher.begin(), warmed("a", &released));
        prefetcher.clear();
        assert!(prefetcher.warmed_track().is_none());
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
