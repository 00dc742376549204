//! Domain types shared across Vault Player crates

mod ids;
mod playback;
mod stream;
mod track;

pub use ids::{TrackId, VersionId};
pub use playback::{LoopMode, Quality};
pub use stream::{StreamRequest, StreamUrl};
pub use track::{ProcessingStatus, Track, Waveform};
