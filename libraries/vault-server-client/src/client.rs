//! Main Vault server client.

use crate::error::{Result, ServerClientError};
use crate::media::MediaClient;
use crate::preferences::PreferencesClient;
use crate::tracks::TracksClient;
use crate::types::ServerConfig;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;
use url::Url;

/// Client for the parts of the Vault server API the player uses.
///
/// Cheap to clone; clones share the HTTP connection pool and the token.
///
/// # Example
///
/// ```ignore
/// use vault_server_client::{ServerConfig, VaultServerClient};
///
/// let client = VaultServerClient::new(ServerConfig::new("https://vault.example.com"))?;
/// let media = client.media().await;
/// let url = media.client().stream_url(&"42".into(), &request).await?;
/// ```
#[derive(Clone)]
pub struct VaultServerClient {
    http: Client,
    config: Arc<RwLock<ServerConfig>>,
}

impl VaultServerClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ServerClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let url = config.url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ServerClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        Url::parse(&url).map_err(|e| ServerClientError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("VaultPlayer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(RwLock::new(ServerConfig {
                url,
                access_token: config.access_token,
            })),
        })
    }

    /// Get the normalized server URL.
    pub async fn url(&self) -> String {
        self.config.read().await.url.clone()
    }

    /// Check if the client has an access token.
    pub async fn is_authenticated(&self) -> bool {
        self.config.read().await.access_token.is_some()
    }

    /// Set the access token (e.g., after the host application logs in).
    pub async fn set_token(&self, access_token: Option<String>) {
        let mut config = self.config.write().await;
        config.access_token = access_token;
        if config.access_token.is_none() {
            info!("Cleared access token");
        }
    }

    /// Media operations (stream URLs).
    pub async fn media(&self) -> MediaClientHandle {
        let (url, access_token) = self.snapshot().await;
        MediaClientHandle {
            http: self.http.clone(),
            url,
            access_token,
        }
    }

    /// Track and version metadata.
    pub async fn tracks(&self) -> TracksClientHandle {
        let (url, access_token) = self.snapshot().await;
        TracksClientHandle {
            http: self.http.clone(),
            url,
            access_token,
        }
    }

    /// User preferences.
    pub async fn preferences(&self) -> PreferencesClientHandle {
        let (url, access_token) = self.snapshot().await;
        PreferencesClientHandle {
            http: self.http.clone(),
            url,
            access_token,
        }
    }

    async fn snapshot(&self) -> (String, Option<String>) {
        let config = self.config.read().await;
        (config.url.clone(), config.access_token.clone())
    }
}

impl std::fmt::Debug for VaultServerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultServerClient").finish_non_exhaustive()
    }
}

/// Handle for media operations.
pub struct MediaClientHandle {
    http: Client,
    url: String,
    access_token: Option<String>,
}

impl MediaClientHandle {
    /// Get the media client.
    pub fn client(&self) -> MediaClient<'_> {
        MediaClient::new(&self.http, &self.url, self.access_token.as_deref())
    }
}

/// Handle for track metadata operations.
pub struct TracksClientHandle {
    http: Client,
    url: String,
    access_token: Option<String>,
}

impl TracksClientHandle {
    /// Get the tracks client.
    pub fn client(&self) -> TracksClient<'_> {
        TracksClient::new(&self.http, &self.url, self.access_token.as_deref())
    }
}

/// Handle for preference operations.
pub struct PreferencesClientHandle {
    http: Client,
    url: String,
    access_token: Option<String>,
}

impl PreferencesClientHandle {
    /// Get the preferences client.
    pub fn client(&self) -> PreferencesClient<'_> {
        PreferencesClient::new(&self.http, &self.url, self.access_token.as_deref())
    }
}

/// `base_url` with `segments` appended as percent-encoded path segments
pub(crate) fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base_url).map_err(|e| ServerClientError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| ServerClientError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Send a GET, attaching the bearer token when there is one
pub(crate) async fn get(
    http: &Client,
    url: Url,
    access_token: Option<&str>,
    query: &[(&str, String)],
) -> Result<Response> {
    let mut request = http.get(url).query(query);
    if let Some(token) = access_token {
        request = request.bearer_auth(token);
    }

    request.send().await.map_err(|e| {
        if e.is_connect() || e.is_timeout() {
            ServerClientError::ServerUnreachable(e.to_string())
        } else {
            ServerClientError::Request(e)
        }
    })
}

/// Decode a JSON body or map the failure status.
///
/// 404 becomes `NotFound { entity, id }`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    entity: &'static str,
    id: &str,
) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        response.json().await.map_err(|e| {
            ServerClientError::ParseError(format!("Failed to parse {} response: {}", entity, e))
        })
    } else if status.as_u16() == 401 || status.as_u16() == 403 {
        Err(ServerClientError::AuthRequired)
    } else if status.as_u16() == 404 {
        Err(ServerClientError::NotFound {
            entity,
            id: id.to_string(),
        })
    } else {
        let error_text = response.text().await.unwrap_or_default();
        Err(ServerClientError::ServerError {
            status: status.as_u16(),
            message: error_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        assert!(VaultServerClient::new(ServerConfig::new("https://example.com")).is_ok());
        assert!(VaultServerClient::new(ServerConfig::new("http://localhost:8080")).is_ok());

        assert!(VaultServerClient::new(ServerConfig::new("")).is_err());
        assert!(VaultServerClient::new(ServerConfig::new("not-a-url")).is_err());
        assert!(VaultServerClient::new(ServerConfig::new("ftp://example.com")).is_err());
    }

    #[test]
    fn endpoint_encodes_segments() {
        let url = endpoint("https://example.com/vault", &["api", "share", "a b/c", "stream", "7"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/vault/api/share/a%20b%2Fc/stream/7"
        );
    }

    #[test]
    fn endpoint_on_bare_host() {
        let url = endpoint("https://example.com", &["api", "tracks", "3"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/tracks/3");
    }
}
