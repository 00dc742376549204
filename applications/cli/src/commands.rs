/// Subcommand implementations
use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use tracing::{info, warn};
use vault_core::{PreferenceStore, Quality, StreamRequest, StreamResolver, Track, TrackId, VersionId};
use vault_playback::{adjacent_collisions, optimal_shuffle_with_rng, JsonFileStore, PlaybackQueue};
use vault_server_client::VaultServerClient;

use crate::config::AppConfig;

async fn read_tracks(path: &Path) -> anyhow::Result<Vec<Track>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of tracks", path.display()))
}

fn print_tracks(tracks: &[Track]) {
    if tracks.is_empty() {
        println!("(empty)");
        return;
    }
    for (i, track) in tracks.iter().enumerate() {
        let artist = track
            .artist
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or("Unknown Artist");
        println!("{:>3}. {} - {} [{}]", i, artist, track.title, track.id);
    }
}

pub async fn shuffle(input: &Path, seed: Option<u64>) -> anyhow::Result<()> {
    let tracks = read_tracks(input).await?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let shuffled = optimal_shuffle_with_rng(&tracks, &mut rng);

    info!(
        tracks = tracks.len(),
        collisions_before = adjacent_collisions(&tracks),
        collisions_after = adjacent_collisions(&shuffled),
        "Shuffled"
    );
    print_tracks(&shuffled);
    Ok(())
}

pub async fn stream_url(
    config: &AppConfig,
    track_id: &str,
    quality: Option<Quality>,
    version: Option<String>,
    share_token: Option<String>,
) -> anyhow::Result<()> {
    let client = VaultServerClient::new(config.server_config())?;
    let authenticated = client.is_authenticated().await;

    // Share links always stream the default quality
    let quality = match (quality, &share_token) {
        (Some(quality), _) => quality,
        (None, Some(_)) => config.player.default_quality,
        (None, None) if authenticated => {
            let preferences = client.preferences().await;
            match preferences.client().default_quality().await {
                Ok(preferred) => preferred.unwrap_or(config.player.default_quality),
                Err(e) => {
                    warn!(error = %e, "Failed to load quality preference, using default");
                    config.player.default_quality
                }
            }
        }
        (None, None) => config.player.default_quality,
    };

    let request = StreamRequest::new(quality)
        .with_version(version.map(VersionId::from))
        .with_share_token(share_token);

    let url = client
        .resolve_stream_url(&TrackId::new(track_id), &request)
        .await
        .with_context(|| format!("Failed to resolve stream URL for track {}", track_id))?;

    println!("{}", url);
    Ok(())
}

/// The persisted "up next" queue in the preferences file
pub struct QueueFile {
    store: JsonFileStore,
    key: String,
}

impl QueueFile {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: JsonFileStore::new(&config.storage.preferences_path),
            key: config.player.queue_storage_key.clone(),
        }
    }

    async fn read(&self) -> anyhow::Result<PlaybackQueue> {
        let tracks = match self.store.load(&self.key).await? {
            Some(json) => serde_json::from_str(&json).context("Persisted queue is unreadable")?,
            None => Vec::new(),
        };
        Ok(PlaybackQueue::from_tracks(tracks))
    }

    async fn write(&self, queue: &PlaybackQueue) -> anyhow::Result<()> {
        let json = serde_json::to_string(queue.tracks())?;
        self.store.save(&self.key, &json).await?;
        info!(length = queue.len(), path = %self.store.path().display(), "Saved queue");
        Ok(())
    }

    pub async fn show(&self) -> anyhow::Result<()> {
        let queue = self.read().await?;
        print_tracks(queue.tracks());
        Ok(())
    }

    pub async fn load_from(&self, input: &Path, shuffle: bool) -> anyhow::Result<()> {
        let tracks = read_tracks(input).await?;
        let mut queue = PlaybackQueue::new();
        queue.replace(tracks, shuffle);

        // Persist play order; the shadow only lives for the session
        self.write(&PlaybackQueue::from_tracks(queue.tracks().to_vec()))
            .await?;
        print_tracks(queue.tracks());
        Ok(())
    }

    pub async fn remove(&self, index: usize) -> anyhow::Result<()> {
        let mut queue = self.read().await?;
        let removed = queue
            .remove(index)
            .with_context(|| format!("No track at position {} (queue has {})", index, queue.len()))?;
        self.write(&queue).await?;
        println!("Removed {} [{}]", removed.title, removed.id);
        Ok(())
    }

    pub async fn reorder(&self, from: usize, to: usize) -> anyhow::Result<()> {
        let mut queue = self.read().await?;
        queue.reorder(from, to)?;
        self.write(&queue).await?;
        print_tracks(queue.tracks());
        Ok(())
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        self.write(&PlaybackQueue::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.preferences_path = dir.join("prefs.json");
        config
    }

    async fn write_tracks(dir: &Path, tracks: &[Track]) -> std::path::PathBuf {
        let path = dir.join("tracks.json");
        tokio::fs::write(&path, serde_json::to_string(tracks).unwrap())
            .await
            .unwrap();
        path
    }

    fn sample() -> Vec<Track> {
        (0..4)
            .map(|i| Track::new(i.to_string(), format!("Song {}", i)).with_artist("A"))
            .collect()
    }

    #[tokio::test]
    async fn queue_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let input = write_tracks(dir.path(), &sample()).await;

        let queue = QueueFile::new(&config);
        queue.load_from(&input, false).await.unwrap();
        queue.reorder(0, 3).await.unwrap();
        queue.remove(0).await.unwrap();

        let stored = queue.read().await.unwrap();
        let ids: Vec<&str> = stored.tracks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "0"]);

        queue.clear().await.unwrap();
        assert!(queue.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_past_end_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let queue = QueueFile::new(&config_in(dir.path()));
        assert!(queue.remove(0).await.is_err());
    }

    #[tokio::test]
    async fn shuffle_accepts_seed() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_tracks(dir.path(), &sample()).await;
        assert!(shuffle(&input, Some(7)).await.is_ok());
    }
}
