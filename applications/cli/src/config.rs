/// Player configuration
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use vault_playback::PlayerConfig;
use vault_server_client::ServerConfig;

const DEFAULT_CONFIG_FILE: &str = "vault.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,

    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_preferences_path")]
    pub preferences_path: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            access_token: None,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            preferences_path: default_preferences_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default `vault.toml` is optional.
    /// `VAULT_`-prefixed variables override the file, with `__` between
    /// section and key (e.g. `VAULT_SERVER__URL`).
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("VAULT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.url.trim().is_empty() {
            anyhow::bail!("Server URL is required (set VAULT_SERVER__URL)");
        }
        if !(0.0..=1.0).contains(&self.player.initial_volume) {
            anyhow::bail!(
                "player.initial_volume must be between 0.0 and 1.0, got {}",
                self.player.initial_volume
            );
        }
        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            url: self.server.url.clone(),
            access_token: self.server.access_token.clone(),
        }
    }
}

// Default values
fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("./data/preferences.json")
}
