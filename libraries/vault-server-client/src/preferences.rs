//! User preferences.

use crate::client::{endpoint, get, read_json};
use crate::error::Result;
use crate::types::UserPreferences;
use reqwest::Client;
use tracing::debug;
use vault_core::Quality;

/// Preferences client for the Vault server.
pub struct PreferencesClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    access_token: Option<&'a str>,
}

impl<'a> PreferencesClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, access_token: Option<&'a str>) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// Get the signed-in user's preferences.
    pub async fn get_preferences(&self) -> Result<UserPreferences> {
        let url = endpoint(self.base_url, &["api", "preferences"])?;
        debug!("Fetching user preferences");

        let response = get(self.http, url, self.access_token, &[]).await?;
        read_json(response, "Preferences", "current user").await
    }

    /// Preferred streaming quality, if the user picked one.
    pub async fn default_quality(&self) -> Result<Option<Quality>> {
        Ok(self.get_preferences().await?.default_quality)
    }
}
