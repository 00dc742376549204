//! Queue controller
//!
//! Owns the playback session: current track, "up next" queue, project
//! context, loop and shuffle state. Callers submit intents (play, next,
//! toggle shuffle, ...) and read snapshots; nothing else mutates the queue
//! or the context.
//!
//! Stream URL and waveform lookups are asynchronous and may overlap. Each
//! `play()` captures a ticket from the play epoch and re-checks it after
//! every await, so only the most recent request is ever applied.

use crate::context::ProjectContext;
use crate::epoch::RequestEpoch;
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::prefetch::{Prefetcher, WarmedStream};
use crate::queue::PlaybackQueue;
use crate::types::{
    PlayOptions, PlayOutcome, PlayerConfig, SessionSignal, SessionSnapshot, SinkEvent,
};
use crate::waveform::WaveformLoader;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use vault_core::{
    AudioSink, LoopMode, PreferenceStore, Quality, StreamRequest, StreamResolver, StreamUrl,
    Track, WaveformSource,
};

/// External services the controller drives
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn StreamResolver>,
    pub waveforms: Arc<dyn WaveformSource>,
    pub sink: Arc<dyn AudioSink>,
    pub preferences: Arc<dyn PreferenceStore>,
}

struct SessionState {
    current: Option<Track>,
    stream_url: Option<StreamUrl>,
    is_playing: bool,
    loop_mode: LoopMode,
    shuffled: bool,
    queue: PlaybackQueue,
    context: ProjectContext,
    duration: Option<Duration>,
    position: Duration,
    volume: f32,
    quality: Quality,
    share_token: Option<String>,
    authenticated: bool,
    last_restart: Option<Instant>,
    events: Vec<PlaybackEvent>,
}

impl SessionState {
    fn new(config: &PlayerConfig) -> Self {
        Self {
            current: None,
            stream_url: None,
            is_playing: false,
            loop_mode: LoopMode::Off,
            shuffled: false,
            queue: PlaybackQueue::new(),
            context: ProjectContext::new(),
            duration: None,
            position: Duration::ZERO,
            volume: config.initial_volume,
            quality: config.default_quality,
            share_token: None,
            authenticated: false,
            last_restart: None,
            events: Vec::new(),
        }
    }

    /// Track that `next_track()` would play, without mutating anything
    fn upcoming(&self) -> Option<&Track> {
        let current = self.current.as_ref()?;
        self.queue
            .front()
            .or_else(|| self.context.next_after(&current.id))
    }

    fn stream_request(&self, track: &Track) -> StreamRequest {
        StreamRequest::new(self.quality)
            .with_version(track.version_id.clone())
            .with_share_token(self.share_token.clone())
    }

    fn set_playing(&mut self, playing: bool) {
        if self.is_playing != playing {
            self.is_playing = playing;
            self.events
                .push(PlaybackEvent::PlayingChanged { is_playing: playing });
        }
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.events.push(event);
    }

    fn emit_queue_changed(&mut self) {
        let length = self.queue.len();
        self.events.push(PlaybackEvent::QueueChanged { length });
    }
}

enum Advance {
    Play(Track),
    /// End of context with loop=project: queue the rest, load the first
    Wrap { first: Track, rest: Vec<Track> },
    Pause,
    Nothing,
}

enum Back {
    Restart,
    Play { previous: Track, current: Track },
}

struct Inner {
    config: PlayerConfig,
    resolver: Arc<dyn StreamResolver>,
    waveforms: WaveformLoader,
    sink: Arc<dyn AudioSink>,
    preferences: Arc<dyn PreferenceStore>,
    play_epoch: RequestEpoch,
    prefetcher: Prefetcher,
    state: Mutex<SessionState>,
    /// Orders preference writes so the newest snapshot lands last
    persist_lock: tokio::sync::Mutex<()>,
}

/// Handle to the playback session
///
/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct QueueController {
    inner: Arc<Inner>,
}

impl QueueController {
    pub fn new(config: PlayerConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            resolver,
            waveforms,
            sink,
            preferences,
        } = collaborators;

        let state = SessionState::new(&config);
        Self {
            inner: Arc::new(Inner {
                config,
                resolver,
                waveforms: WaveformLoader::new(waveforms),
                sink,
                preferences,
                play_epoch: RequestEpoch::new(),
                prefetcher: Prefetcher::new(),
                state: Mutex::new(state),
                persist_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Load the persisted queue snapshot and volume
    ///
    /// Unreadable snapshots are logged and ignored.
    pub async fn restore(&self) -> Result<()> {
        let config = &self.inner.config;
        let store = &self.inner.preferences;

        let queue = store
            .load(&config.queue_storage_key)
            .await
            .map_err(|e| PlaybackError::Preferences(e.to_string()))?;
        let volume = store
            .load(&config.volume_storage_key)
            .await
            .map_err(|e| PlaybackError::Preferences(e.to_string()))?;

        let tracks = queue.and_then(|json| match serde_json::from_str::<Vec<Track>>(&json) {
            Ok(tracks) => Some(tracks),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable queue snapshot");
                None
            }
        });
        let volume = volume.and_then(|json| match serde_json::from_str::<f32>(&json) {
            Ok(v) => Some(v.clamp(0.0, 1.0)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable volume");
                None
            }
        });

        let volume = {
            let mut state = self.state();
            if let Some(tracks) = tracks {
                info!(count = tracks.len(), "Restored queue snapshot");
                self.inner.waveforms.seed(&tracks);
                state.queue = PlaybackQueue::from_tracks(tracks);
                state.emit_queue_changed();
            }
            if let Some(volume) = volume {
                state.volume = volume;
            }
            state.volume
        };
        self.inner.sink.set_volume(volume);

        Ok(())
    }

    // ===== Playback Control =====

    /// Play `track`
    ///
    /// Rejects tracks that are still processing. Otherwise replaces the
    /// context and queue when given, resolves the waveform and the stream
    /// URL, and attaches the stream if no newer `play()` has started in
    /// the meantime. A resolution failure is logged and returned; the
    /// session is left as it was.
    pub async fn play(&self, track: Track, options: PlayOptions) -> Result<PlayOutcome> {
        if !track.is_playable() {
            debug!(track_id = %track.id, status = ?track.processing_status, "Rejecting play of unprocessed track");
            return Ok(PlayOutcome::Rejected);
        }

        let ticket = self.inner.play_epoch.advance();
        debug!(track_id = %track.id, epoch = ticket.value(), "Play requested");

        let PlayOptions {
            project_tracks,
            queue_tracks,
            autoplay,
            force_reload,
        } = options;

        let queue_replaced = queue_tracks.is_some();
        {
            let mut state = self.state();
            let shuffled = state.shuffled;
            if let Some(tracks) = project_tracks {
                self.inner.waveforms.seed(&tracks);
                state.context.set_tracks(tracks, shuffled);
                let length = state.context.tracks().len();
                state.emit(PlaybackEvent::ContextChanged { length });
            }
            if let Some(tracks) = queue_tracks {
                self.inner.waveforms.seed(&tracks);
                state.queue.replace(tracks, shuffled);
                state.emit_queue_changed();
            }
        }
        if queue_replaced {
            self.persist_queue().await;
        }

        let track = self.inner.waveforms.ensure(track).await;
        if !self.inner.play_epoch.is_current(ticket) {
            debug!(track_id = %track.id, epoch = ticket.value(), "Play superseded during waveform lookup");
            return Ok(PlayOutcome::Superseded);
        }

        let warmed = if force_reload {
            None
        } else {
            self.inner
                .prefetcher
                .take_if_match(&track.id, track.version_id.as_ref())
        };

        let source = match warmed {
            Some(warmed) => StreamSource::Warmed(warmed),
            None => {
                let request = self.state().stream_request(&track);
                match self
                    .inner
                    .resolver
                    .resolve_stream_url(&track.id, &request)
                    .await
                {
                    Ok(url) => StreamSource::Fresh(url),
                    Err(e) => {
                        if !self.inner.play_epoch.is_current(ticket) {
                            return Ok(PlayOutcome::Superseded);
                        }
                        error!(track_id = %track.id, error = %e, "Failed to resolve stream URL");
                        self.state().emit(PlaybackEvent::Error {
                            track_id: Some(track.id.to_string()),
                            message: e.to_string(),
                        });
                        return Err(PlaybackError::Resolution(e));
                    }
                }
            }
        };

        let queue_changed = {
            let mut state = self.state();
            if !self.inner.play_epoch.is_current(ticket) {
                drop(state);
                source.discard();
                debug!(track_id = %track.id, epoch = ticket.value(), "Play superseded during stream resolution");
                return Ok(PlayOutcome::Superseded);
            }

            let previous = state.current.replace(track.clone());
            let queue_changed = state.queue.remove_track(&track.id);

            // Detach before attaching so two sources never overlap
            self.inner.sink.detach();
            let prefetched = matches!(source, StreamSource::Warmed(_));
            let url = match source {
                StreamSource::Warmed(warmed) => {
                    let url = warmed.url.clone();
                    self.inner.sink.attach_prepared(warmed.resource);
                    url
                }
                StreamSource::Fresh(url) => {
                    self.inner.sink.set_source(&url);
                    url
                }
            };

            state.stream_url = Some(url);
            state.duration = None;
            state.position = Duration::ZERO;
            state.emit(PlaybackEvent::TrackChanged {
                track_id: Some(track.id.to_string()),
                previous_track_id: previous.map(|t| t.id.to_string()),
            });
            state.emit(PlaybackEvent::StreamAttached {
                track_id: track.id.to_string(),
                prefetched,
            });
            state.set_playing(autoplay);
            if queue_changed {
                state.emit_queue_changed();
            }
            queue_changed
        };

        info!(track_id = %track.id, title = %track.title, autoplay, "Now playing");

        if autoplay {
            if let Err(e) = self.inner.sink.play().await {
                warn!(track_id = %track.id, error = %e, "Audio sink refused to start");
                if self.inner.play_epoch.is_current(ticket) {
                    self.state().set_playing(false);
                }
            }
        }

        if queue_changed {
            self.persist_queue().await;
        }
        self.schedule_prefetch();

        Ok(PlayOutcome::Applied)
    }

    /// Pause playback
    pub fn pause(&self) {
        self.state().set_playing(false);
        self.inner.sink.pause();
    }

    /// Resume playback of the current track
    pub async fn resume(&self) -> Result<()> {
        {
            let mut state = self.state();
            if state.current.is_none() {
                return Err(PlaybackError::NoTrackLoaded);
            }
            state.set_playing(true);
        }

        if let Err(e) = self.inner.sink.play().await {
            warn!(error = %e, "Audio sink refused to resume");
            self.state().set_playing(false);
            return Err(PlaybackError::Sink(e.to_string()));
        }
        Ok(())
    }

    /// Stop and unload the current track
    ///
    /// In-flight `play()` requests are superseded. The queue is kept.
    pub fn stop(&self) {
        self.inner.play_epoch.invalidate();
        self.inner.prefetcher.shutdown();

        {
            let mut state = self.state();
            let previous = state.current.take();
            state.stream_url = None;
            state.duration = None;
            state.position = Duration::ZERO;
            state.set_playing(false);
            if previous.is_some() {
                state.emit(PlaybackEvent::TrackChanged {
                    track_id: None,
                    previous_track_id: previous.map(|t| t.id.to_string()),
                });
            }
        }

        self.inner.sink.pause();
        self.inner.sink.seek(Duration::ZERO);
        self.inner.sink.detach();
    }

    /// Seek within the current track
    pub fn seek_to(&self, position: Duration) -> Result<()> {
        {
            let mut state = self.state();
            if state.current.is_none() {
                return Err(PlaybackError::NoTrackLoaded);
            }
            state.position = position;
        }
        self.inner.sink.seek(position);
        Ok(())
    }

    /// Play the head of the queue
    ///
    /// Returns `None` when the queue is empty.
    pub async fn play_from_queue(&self) -> Result<Option<PlayOutcome>> {
        // Left in the queue until play() applies and removes it
        let head = self.state().queue.front().cloned();

        match head {
            Some(track) => self.play(track, PlayOptions::default()).await.map(Some),
            None => Ok(None),
        }
    }

    /// Advance to the next track
    ///
    /// Queue head first, then the next context track. At the end of the
    /// context, loop=project reloads the context from its first track
    /// (paused) with the rest queued; otherwise playback pauses.
    pub async fn next_track(&self) -> Result<Option<PlayOutcome>> {
        let step = {
            let state = self.state();
            match (state.queue.front().cloned(), state.current.clone()) {
                (Some(head), _) => Advance::Play(head),
                (None, None) => Advance::Nothing,
                (None, Some(current)) => match state.context.next_after(&current.id) {
                    Some(next) => Advance::Play(next.clone()),
                    None if state.loop_mode == LoopMode::Project && !state.context.is_empty() => {
                        let tracks = state.context.active();
                        Advance::Wrap {
                            first: tracks[0].clone(),
                            rest: tracks[1..].to_vec(),
                        }
                    }
                    None => Advance::Pause,
                },
            }
        };

        match step {
            Advance::Play(track) => self.play(track, PlayOptions::default()).await.map(Some),
            Advance::Wrap { first, rest } => {
                debug!(track_id = %first.id, "End of project, wrapping around");
                self.pause();
                self.play(first, PlayOptions::default().with_queue(rest).autoplay(false))
                    .await
                    .map(Some)
            }
            Advance::Pause => {
                self.pause();
                Ok(None)
            }
            Advance::Nothing => Ok(None),
        }
    }

    /// Go back
    ///
    /// Past the restart threshold, restarts the current track, unless a
    /// restart already happened within the double-tap window. Otherwise
    /// plays the preceding context track, putting the current one back at
    /// the head of the queue, or restarts if there is none.
    pub async fn previous_track(&self) -> Result<Option<PlayOutcome>> {
        let now = Instant::now();
        let position = self.inner.sink.position();
        let threshold = self.inner.config.restart_threshold();
        let window = self.inner.config.double_tap_window();

        let step = {
            let mut state = self.state();
            let Some(current) = state.current.clone() else {
                return Ok(None);
            };

            let recently_restarted = state
                .last_restart
                .is_some_and(|at| now.duration_since(at) < window);

            if !recently_restarted && position > threshold {
                state.last_restart = Some(now);
                Back::Restart
            } else if let Some(previous) = state.context.previous_before(&current.id).cloned() {
                Back::Play { previous, current }
            } else {
                state.last_restart = Some(now);
                Back::Restart
            }
        };

        match step {
            Back::Restart => {
                debug!("Restarting current track");
                self.state().position = Duration::ZERO;
                self.inner.sink.seek(Duration::ZERO);
                Ok(None)
            }
            Back::Play { previous, current } => {
                let previous_id = previous.id.clone();
                let outcome = self.play(previous, PlayOptions::default()).await?;
                if outcome != PlayOutcome::Applied {
                    return Ok(Some(outcome));
                }

                let requeued = {
                    let mut state = self.state();
                    let still_current = state
                        .current
                        .as_ref()
                        .is_some_and(|t| t.id == previous_id);
                    if still_current && current.id != previous_id {
                        state.queue.push_front(current);
                        state.emit_queue_changed();
                        true
                    } else {
                        false
                    }
                };
                if requeued {
                    self.persist_queue().await;
                    self.refresh_prefetch();
                }
                Ok(Some(outcome))
            }
        }
    }

    /// Natural end of the current track
    pub async fn on_ended(&self) -> Result<Option<PlayOutcome>> {
        let wrap_to = {
            let state = self.state();
            match state.loop_mode {
                // The sink loops the track natively
                LoopMode::Track => return Ok(None),
                LoopMode::Project => state
                    .current
                    .as_ref()
                    .filter(|c| state.queue.is_empty() && state.context.is_last(&c.id))
                    .and_then(|_| state.context.first().cloned()),
                LoopMode::Off => None,
            }
        };

        match wrap_to {
            Some(first) => self.play(first, PlayOptions::default()).await.map(Some),
            None => self.next_track().await,
        }
    }

    // ===== Shuffle & Loop =====

    /// Flip shuffle; returns the new state
    ///
    /// Turning it on shuffles the queue (keeping its order aside) and the
    /// context projection. Turning it off restores the queue's
    /// pre-shuffle order.
    pub async fn toggle_shuffle(&self) -> bool {
        let enabled = {
            let mut state = self.state();
            let enabled = !state.shuffled;
            state.shuffled = enabled;
            state.queue.set_shuffled(enabled);
            state.context.set_shuffled(enabled);
            state.emit(PlaybackEvent::ShuffleChanged { enabled });
            state.emit_queue_changed();
            enabled
        };
        debug!(enabled, "Shuffle toggled");

        self.persist_queue().await;
        self.refresh_prefetch();
        enabled
    }

    /// Cycle `off -> track -> project -> off`; returns the new mode
    pub fn toggle_loop(&self) -> LoopMode {
        let mut state = self.state();
        let mode = state.loop_mode.cycle();
        state.loop_mode = mode;
        state.emit(PlaybackEvent::LoopModeChanged { mode });
        mode
    }

    // ===== Queue Management =====

    /// Append a track to the queue
    ///
    /// With nothing loaded, the track is loaded instead (without autoplay).
    pub async fn add_to_queue(&self, track: Track) -> Result<Option<PlayOutcome>> {
        {
            let mut state = self.state();
            let current_id = state.current.as_ref().map(|t| t.id.clone());
            match current_id {
                None => {
                    drop(state);
                    return self
                        .play(track, PlayOptions::default().autoplay(false))
                        .await
                        .map(Some);
                }
                Some(id) if id == track.id => {
                    debug!(track_id = %track.id, "Not queueing the current track");
                    return Ok(None);
                }
                Some(_) => {}
            }

            self.inner.waveforms.seed(std::slice::from_ref(&track));
            state.queue.push(track);
            state.emit_queue_changed();
        }

        self.persist_queue().await;
        self.refresh_prefetch();
        Ok(None)
    }

    /// Append a whole project to the queue
    ///
    /// With nothing loaded, its first track is loaded (without autoplay)
    /// and the rest becomes the queue.
    pub async fn add_project_to_queue(&self, tracks: Vec<Track>) -> Result<Option<PlayOutcome>> {
        let Some(first) = tracks.first().cloned() else {
            return Ok(None);
        };

        {
            let mut state = self.state();
            match state.current.clone() {
                None => {
                    drop(state);
                    let rest = tracks[1..].to_vec();
                    return self
                        .play(
                            first,
                            PlayOptions::default().with_queue(rest).autoplay(false),
                        )
                        .await
                        .map(Some);
                }
                Some(current) => {
                    self.inner.waveforms.seed(&tracks);
                    let tracks: Vec<Track> =
                        tracks.into_iter().filter(|t| t.id != current.id).collect();
                    state.queue.extend(tracks);
                    state.emit_queue_changed();
                }
            }
        }

        self.persist_queue().await;
        self.refresh_prefetch();
        Ok(None)
    }

    pub async fn remove_from_queue(&self, index: usize) -> Result<Track> {
        let removed = {
            let mut state = self.state();
            let removed = state
                .queue
                .remove(index)
                .ok_or(PlaybackError::IndexOutOfBounds(index))?;
            state.emit_queue_changed();
            removed
        };

        self.persist_queue().await;
        self.refresh_prefetch();
        Ok(removed)
    }

    pub async fn reorder_queue(&self, from: usize, to: usize) -> Result<()> {
        {
            let mut state = self.state();
            state.queue.reorder(from, to)?;
            state.emit_queue_changed();
        }

        self.persist_queue().await;
        self.refresh_prefetch();
        Ok(())
    }

    pub async fn clear_queue(&self) {
        {
            let mut state = self.state();
            state.queue.clear();
            state.emit_queue_changed();
        }

        self.persist_queue().await;
        self.refresh_prefetch();
    }

    /// Replace the project context without changing the current track
    pub fn set_project_tracks(&self, tracks: Vec<Track>) {
        self.inner.waveforms.seed(&tracks);
        {
            let mut state = self.state();
            let shuffled = state.shuffled;
            state.context.set_tracks(tracks, shuffled);
            let length = state.context.tracks().len();
            state.emit(PlaybackEvent::ContextChanged { length });
        }
        self.refresh_prefetch();
    }

    // ===== Volume & Quality =====

    /// Set and persist the output volume (clamped to 0.0 - 1.0)
    pub async fn set_volume(&self, volume: f32) {
        if !volume.is_finite() {
            warn!(volume, "Ignoring non-finite volume");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        {
            let mut state = self.state();
            state.volume = volume;
            state.emit(PlaybackEvent::VolumeChanged { volume });
        }
        self.inner.sink.set_volume(volume);

        let _guard = self.inner.persist_lock.lock().await;
        let key = &self.inner.config.volume_storage_key;
        if let Err(e) = self.inner.preferences.save(key, &volume.to_string()).await {
            warn!(error = %e, "Failed to persist volume");
        }
    }

    /// Apply the user's preferred quality
    ///
    /// Ignored while a share token is active; share links always stream
    /// the default quality. `None` resets to the default.
    pub fn apply_quality_preference(&self, quality: Option<Quality>) {
        let mut state = self.state();
        state.quality = if state.share_token.is_some() {
            self.inner.config.default_quality
        } else {
            quality.unwrap_or(self.inner.config.default_quality)
        };
    }

    /// Switch stream resolution to (or away from) a public share link
    pub fn set_share_token(&self, token: Option<String>) {
        let mut state = self.state();
        if token.is_some() {
            state.quality = self.inner.config.default_quality;
        }
        state.share_token = token;
    }

    // ===== Sink & Session Signals =====

    /// Feed an audio sink event into the session
    pub async fn handle_sink_event(&self, event: SinkEvent) -> Result<()> {
        match event {
            SinkEvent::Playing => self.state().set_playing(true),
            SinkEvent::Paused => self.state().set_playing(false),
            SinkEvent::Ended => {
                self.on_ended().await?;
            }
            SinkEvent::MetadataLoaded(duration) => {
                let mut state = self.state();
                state.duration = Some(duration);
                state.emit(PlaybackEvent::DurationChanged {
                    duration_ms: duration.as_millis() as u64,
                });
            }
            SinkEvent::TimeUpdate(position) => {
                let mut state = self.state();
                state.position = position;
                let duration_ms = state.duration.map(|d| d.as_millis() as u64);
                state.emit(PlaybackEvent::PositionChanged {
                    position_ms: position.as_millis() as u64,
                    duration_ms,
                });
            }
        }
        Ok(())
    }

    pub async fn handle_session_signal(&self, signal: SessionSignal) {
        match signal {
            SessionSignal::Authenticated => {
                info!("Session authenticated");
                self.state().authenticated = true;
                self.refresh_prefetch();
            }
            SessionSignal::SessionLost => {
                info!("Session lost, clearing playback");
                self.clear_session();
                self.persist_queue().await;
            }
        }
    }

    /// Subscribe to session signals until the sender goes away
    pub fn listen(&self, mut signals: broadcast::Receiver<SessionSignal>) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            loop {
                match signals.recv().await {
                    Ok(signal) => controller.handle_session_signal(signal).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed session signals");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    fn clear_session(&self) {
        self.inner.play_epoch.invalidate();
        self.inner.prefetcher.shutdown();
        self.inner.waveforms.clear();

        {
            let mut state = self.state();
            let previous = state.current.take();
            state.stream_url = None;
            state.duration = None;
            state.position = Duration::ZERO;
            state.queue = PlaybackQueue::new();
            state.context.clear();
            state.quality = self.inner.config.default_quality;
            state.share_token = None;
            state.authenticated = false;
            state.last_restart = None;
            state.set_playing(false);
            state.emit(PlaybackEvent::TrackChanged {
                track_id: None,
                previous_track_id: previous.map(|t| t.id.to_string()),
            });
            state.emit_queue_changed();
            state.emit(PlaybackEvent::SessionCleared);
        }

        self.inner.sink.detach();
    }

    // ===== Prefetch =====

    /// Resolve and warm the stream of the track that would play next
    ///
    /// Does nothing when that track is already warmed. The result is kept
    /// only if no newer prefetch started and the track is still next.
    pub async fn prefetch_next(&self) {
        let prefetcher = &self.inner.prefetcher;
        let ticket = prefetcher.begin();

        let (next, request, allowed) = {
            let state = self.state();
            let next = state.upcoming().cloned();
            let request = next.as_ref().map(|t| state.stream_request(t));
            (next, request, state.authenticated || state.share_token.is_some())
        };

        let (Some(next), Some(request)) = (next, request) else {
            prefetcher.clear();
            return;
        };
        if prefetcher.is_warmed(&next.id, next.version_id.as_ref()) || !allowed || !next.is_playable() {
            return;
        }

        match self.inner.resolver.resolve_stream_url(&next.id, &request).await {
            Ok(url) => {
                if !prefetcher.is_current(ticket) {
                    return;
                }
                let still_next = self
                    .state()
                    .upcoming()
                    .is_some_and(|t| t.id == next.id);
                if !still_next {
                    return;
                }

                let resource = self.inner.sink.prepare(&url);
                let stored = prefetcher.store(
                    ticket,
                    WarmedStream {
                        track_id: next.id.clone(),
                        version_id: next.version_id.clone(),
                        url,
                        resource,
                    },
                );
                if stored {
                    debug!(track_id = %next.id, "Prefetched next track");
                }
            }
            Err(e) => warn!(track_id = %next.id, error = %e, "Failed to prefetch next track"),
        }
    }

    /// Hand over the prefetched stream, if any
    pub fn take_prefetched(&self) -> Option<WarmedStream> {
        self.inner.prefetcher.take()
    }

    pub fn clear_prefetched(&self) {
        self.inner.prefetcher.clear();
    }

    fn schedule_prefetch(&self) {
        let controller = self.clone();
        let delay = self.inner.config.prefetch_delay();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.prefetch_next().await;
        });
        self.inner.prefetcher.schedule(handle);
    }

    /// Re-run the prefetch when "next" may have changed
    fn refresh_prefetch(&self) {
        if self.state().current.is_some() {
            self.schedule_prefetch();
        }
    }

    // ===== State Queries =====

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            current_track: state.current.clone(),
            stream_url: state.stream_url.clone(),
            is_playing: state.is_playing,
            loop_mode: state.loop_mode,
            is_shuffled: state.shuffled,
            queue: state.queue.tracks().to_vec(),
            project_tracks: state.context.tracks().to_vec(),
            shuffled_project_tracks: state.context.shuffled_tracks().to_vec(),
            duration: state.duration,
            position: state.position,
            volume: state.volume,
            quality: state.quality,
        }
    }

    pub fn current_track(&self) -> Option<Track> {
        self.state().current.clone()
    }

    pub fn queue(&self) -> Vec<Track> {
        self.state().queue.tracks().to_vec()
    }

    pub fn is_playing(&self) -> bool {
        self.state().is_playing
    }

    pub fn is_shuffled(&self) -> bool {
        self.state().shuffled
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.state().loop_mode
    }

    /// Track `next_track()` would play
    pub fn upcoming_track(&self) -> Option<Track> {
        self.state().upcoming().cloned()
    }

    /// Drain pending events (for UI sync)
    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.state().events)
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn persist_queue(&self) {
        let _guard = self.inner.persist_lock.lock().await;
        let snapshot = serde_json::to_string(self.state().queue.tracks());
        let key = &self.inner.config.queue_storage_key;

        match snapshot {
            Ok(json) => {
                if let Err(e) = self.inner.preferences.save(key, &json).await {
                    warn!(error = %e, "Failed to persist queue");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize queue"),
        }
    }
}

impl std::fmt::Debug for QueueController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("QueueController")
            .field("current", &state.current.as_ref().map(|t| &t.id))
            .field("queue_len", &state.queue.len())
            .field("is_playing", &state.is_playing)
            .finish_non_exhaustive()
    }
}

/// Where the stream for a `play()` comes from
enum StreamSource {
    Warmed(WarmedStream),
    Fresh(StreamUrl),
}

impl StreamSource {
    /// Drop a source that will not be attached
    fn discard(self) {
        if let Self::Warmed(warmed) = self {
            warmed.resource.release();
        }
    }
}
