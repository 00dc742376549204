/// Vault Player - headless command line front end
mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vault_core::Quality;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "vault-player")]
#[command(about = "Vault Player queue and streaming tools", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./vault.toml when present)
    #[arg(short, long, global = true, env = "VAULT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shuffle a JSON list of tracks so the same artist rarely plays twice in a row
    Shuffle {
        /// JSON file holding an array of tracks
        input: PathBuf,
        /// Seed for a reproducible order
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Resolve a playable stream URL for a track
    StreamUrl {
        /// Track id
        track_id: String,
        /// Transcoding quality (source, lossless, lossy)
        #[arg(short, long, value_parser = parse_quality)]
        quality: Option<Quality>,
        /// Explicit version id (defaults to the active version)
        #[arg(long)]
        version: Option<String>,
        /// Public share token
        #[arg(long)]
        share_token: Option<String>,
    },
    /// Inspect or edit the persisted "up next" queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// Print the persisted queue
    Show,
    /// Replace the persisted queue with tracks from a JSON file
    Load {
        /// JSON file holding an array of tracks
        input: PathBuf,
        /// Store the tracks in shuffled order
        #[arg(long)]
        shuffle: bool,
    },
    /// Remove the track at a position
    Remove {
        index: usize,
    },
    /// Move a track from one position to another
    Move {
        from: usize,
        to: usize,
    },
    /// Empty the persisted queue
    Clear,
}

fn parse_quality(s: &str) -> Result<Quality, String> {
    Quality::from_str(s).ok_or_else(|| format!("unknown quality '{s}' (expected source, lossless or lossy)"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "vault_player=info,vault_playback=info,vault_server_client=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Shuffle { input, seed } => {
            commands::shuffle(&input, seed).await?;
        }
        Commands::StreamUrl {
            track_id,
            quality,
            version,
            share_token,
        } => {
            let config = AppConfig::load(cli.config.as_deref())?;
            commands::stream_url(&config, &track_id, quality, version, share_token).await?;
        }
        Commands::Queue { action } => {
            let config = AppConfig::load(cli.config.as_deref())?;
            let queue = commands::QueueFile::new(&config);
            match action {
                QueueAction::Show => queue.show().await?,
                QueueAction::Load { input, shuffle } => queue.load_from(&input, shuffle).await?,
                QueueAction::Remove { index } => queue.remove(index).await?,
                QueueAction::Move { from, to } => queue.reorder(from, to).await?,
                QueueAction::Clear => queue.clear().await?,
            }
        }
    }

    Ok(())
}
