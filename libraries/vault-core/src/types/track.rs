//! Track record as seen by the playback engine

use super::{TrackId, VersionId};
use serde::{Deserialize, Serialize};

/// Server-side transcoding state of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Opaque waveform payload, passed through to the UI unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Waveform(String);

impl Waveform {
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A playable track
///
/// Caller-supplied and treated as immutable by the engine. Queue and
/// context operations compare tracks by [`Track::id`] only.
///
/// The serialized shape matches the persisted queue snapshot, so field
/// names are camelCase except for the transcoding status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name; blank and missing artists are grouped together by the shuffle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,

    /// Project the track belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_cover_url: Option<String>,

    /// Waveform payload, if already known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<Waveform>,

    /// Transcoding status; `None` means the server did not report one
    #[serde(
        rename = "lossy_transcoding_status",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub processing_status: Option<ProcessingStatus>,

    /// Explicit version to play; `None` plays the active version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<VersionId>,

    /// Track reached through a public share link
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_shared_track: bool,
}

impl Track {
    /// Create a track with only the required fields set
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: None,
            project_id: None,
            project_name: None,
            cover_url: None,
            project_cover_url: None,
            waveform: None,
            processing_status: None,
            version_id: None,
            is_shared_track: false,
        }
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    #[must_use]
    pub fn with_project(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self.project_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: ProcessingStatus) -> Self {
        self.processing_status = Some(status);
        self
    }

    #[must_use]
    pub fn with_version(mut self, version_id: impl Into<VersionId>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    #[must_use]
    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = Some(waveform);
        self
    }

    /// Whether the track can be streamed right now
    ///
    /// A track with no reported status is assumed playable.
    pub fn is_playable(&self) -> bool {
        matches!(
            self.processing_status,
            None | Some(ProcessingStatus::Completed)
        )
    }
}
