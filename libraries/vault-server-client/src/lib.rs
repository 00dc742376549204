//! Vault Server Client
//!
//! HTTP client library for the parts of the Vault server API the player
//! needs.
//!
//! # Features
//!
//! - **Stream URLs**: signed, quality- and version-aware stream URLs, or
//!   public share-link URLs
//! - **Waveforms**: per-version waveform lookup
//! - **Preferences**: the user's preferred streaming quality
//!
//! [`VaultServerClient`] implements `StreamResolver` and `WaveformSource`
//! from `vault-core`, so it plugs straight into the queue controller.
//!
//! # Example
//!
//! ```ignore
//! use vault_core::{Quality, StreamRequest, TrackId};
//! use vault_server_client::{ServerConfig, VaultServerClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = VaultServerClient::new(ServerConfig::with_token(
//!         "https://vault.example.com",
//!         "token",
//!     ))?;
//!
//!     let media = client.media().await;
//!     let url = media
//!         .client()
//!         .stream_url(&TrackId::new("42"), &StreamRequest::new(Quality::Lossless))
//!         .await?;
//!     println!("Streaming from {}", url);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod media;
mod preferences;
mod resolver;
mod tracks;
mod types;

// Re-export main types
pub use client::{
    MediaClientHandle, PreferencesClientHandle, TracksClientHandle, VaultServerClient,
};
pub use error::{Result, ServerClientError};
pub use types::{ServerConfig, ServerTrack, StreamUrlResponse, TrackVersion, UserPreferences};

// Re-export sub-clients for direct use if needed
pub use media::{share_stream_url, MediaClient};
pub use preferences::PreferencesClient;
pub use tracks::TracksClient;
