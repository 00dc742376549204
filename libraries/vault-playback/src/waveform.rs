//! Waveform lookup with a per-version cache

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use vault_core::{Track, Waveform, WaveformSource};

/// Cache key: `trackId:versionId`, or `trackId:active` for the active version
///
/// Keeping the version in the key means a version-specific lookup is never
/// answered with another version's waveform.
pub fn cache_key(track: &Track) -> String {
    match &track.version_id {
        Some(version) => format!("{}:{}", track.id, version),
        None => format!("{}:active", track.id),
    }
}

/// Resolves waveforms, remembering both hits and misses
pub struct WaveformLoader {
    source: Arc<dyn WaveformSource>,
    /// `None` entries record that no waveform exists (or the fetch failed)
    cache: Mutex<HashMap<String, Option<Waveform>>>,
}

impl WaveformLoader {
    pub fn new(source: Arc<dyn WaveformSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Remember waveforms that tracks already carry
    ///
    /// Inline waveforms describe the active version, so versioned tracks are skipped.
    pub fn seed(&self, tracks: &[Track]) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        for track in tracks.iter().filter(|t| t.version_id.is_none()) {
            if let Some(waveform) = &track.waveform {
                cache.insert(cache_key(track), Some(waveform.clone()));
            }
        }
    }

    /// Cached entry for `track`, if any lookup has been made
    pub fn cached(&self, track: &Track) -> Option<Option<Waveform>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&cache_key(track))
            .cloned()
    }

    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Return `track` with its waveform filled in when one is available
    ///
    /// A versioned track always carries its own version's waveform, or none.
    /// Failures are logged and cached as "no waveform"; they never fail playback.
    pub async fn ensure(&self, mut track: Track) -> Track {
        let key = cache_key(&track);
        let versioned = track.version_id.is_some();

        if let Some(entry) = self.cached(&track) {
            if versioned || entry.is_some() {
                track.waveform = entry;
            }
            return track;
        }

        // An inline waveform only describes the active version
        if !versioned && track.waveform.is_some() {
            self.store(key, track.waveform.clone());
            return track;
        }

        match self
            .source
            .fetch_waveform(&track.id, track.version_id.as_ref())
            .await
        {
            Ok(waveform) => {
                debug!(track_id = %track.id, found = waveform.is_some(), "Fetched waveform");
                self.store(key, waveform.clone());
                if versioned || waveform.is_some() {
                    track.waveform = waveform;
                }
            }
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "Failed to load waveform");
                self.store(key, None);
                if versioned {
                    track.waveform = None;
                }
            }
        }

        track
    }

    fn store(&self, key: String, waveform: Option<Waveform>) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, waveform);
    }
}

impl std::fmt::Debug for WaveformLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveformLoader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vault_core::{TrackId, VaultError, VersionId};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
        missing: bool,
    }

    #[async_trait]
    impl WaveformSource for CountingSource {
        async fn fetch_waveform(
            &self,
            track_id: &TrackId,
            version_id: Option<&VersionId>,
        ) -> vault_core::Result<Option<Waveform>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(VaultError::network("offline"));
            }
            if self.missing {
                return Ok(None);
            }
            let label = match version_id {
                Some(v) => format!("{}@{}", track_id, v),
                None => format!("{}@active", track_id),
            };
            Ok(Some(Waveform::new(label)))
        }
    }

    #[test]
    fn cache_key_includes_version() {
        let track = Track::new("9", "Nine");
        assert_eq!(cache_key(&track), "9:active");
        assert_eq!(cache_key(&track.with_version("4")), "9:4");
    }

    #[tokio::test]
    async fn fetches_once_then_serves_from_cache() {
        let source = Arc::new(CountingSource::default());
        let loader = WaveformLoader::new(source.clone());

        let track = Track::new("1", "One").with_version("2");
        let first = loader.ensure(track.clone()).await;
        let second = loader.ensure(track).await;

        assert_eq!(first.waveform, Some(Waveform::new("1@2")));
        assert_eq!(second.waveform, first.waveform);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn versions_do_not_share_cache_entries() {
        let source = Arc::new(CountingSource::default());
        let loader = WaveformLoader::new(source.clone());

        let v1 = loader.ensure(Track::new("1", "One").with_version("1")).await;
        let v2 = loader.ensure(Track::new("1", "One").with_version("2")).await;

        assert_eq!(v1.waveform, Some(Waveform::new("1@1")));
        assert_eq!(v2.waveform, Some(Waveform::new("1@2")));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn inline_waveform_is_trusted_for_active_version_only() {
        let source = Arc::new(CountingSource::default());
        let loader = WaveformLoader::new(source.clone());

        let inline = Track::new("1", "One").with_waveform(Waveform::new("inline"));
        let active = loader.ensure(inline.clone()).await;
        assert_eq!(active.waveform, Some(Waveform::new("inline")));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        let versioned = loader.ensure(inline.with_version("5")).await;
        assert_eq!(versioned.waveform, Some(Waveform::new("1@5")));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_cached_as_missing() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..CountingSource::default()
        });
        let loader = WaveformLoader::new(source.clone());

        let track = Track::new("1", "One");
        assert!(loader.ensure(track.clone()).await.waveform.is_none());
        assert!(loader.ensure(track.clone()).await.waveform.is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.cached(&track), Some(None));
    }

    #[tokio::test]
    async fn missing_version_waveform_drops_inline_active_waveform() {
        let source = Arc::new(CountingSource {
            missing: true,
            ..CountingSource::default()
        });
        let loader = WaveformLoader::new(source.clone());

        let track = Track::new("1", "One")
            .with_waveform(Waveform::new("active-peaks"))
            .with_version("5");

        assert!(loader.ensure(track.clone()).await.waveform.is_none());
        // Served from the cached miss the second time
        assert!(loader.ensure(track).await.waveform.is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_version_lookup_drops_inline_waveform() {
        let source = Arc::new(CountingSource {
            fail: true,
            ..CountingSource::default()
        });
        let loader = WaveformLoader::new(source);

        let track = Track::new("1", "One")
            .with_waveform(Waveform::new("active-peaks"))
            .with_version("5");

        assert!(loader.ensure(track).await.waveform.is_none());
    }

    #[tokio::test]
    async fn seeded_waveforms_skip_the_network() {
        let source = Arc::new(CountingSource::default());
        let loader = WaveformLoader::new(source.clone());

        let track = Track::new("3", "Three").with_waveform(Waveform::new("seeded"));
        loader.seed(std::slice::from_ref(&track));

        let resolved = loader.ensure(Track::new("3", "Three")).await;
        assert_eq!(resolved.waveform, Some(Waveform::new("seeded")));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn seeding_ignores_versioned_tracks() {
        let loader = WaveformLoader::new(Arc::new(CountingSource::default()));

        let track = Track::new("3", "Three")
            .with_version("1")
            .with_waveform(Waveform::new("active-peaks"));
        loader.seed(std::slice::from_ref(&track));

        assert_eq!(loader.cached(&track), None);
    }
}
