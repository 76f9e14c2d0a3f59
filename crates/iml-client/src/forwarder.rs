//! Request forwarding to the league API.
//!
//! [`ImlClient`] turns one local call into exactly one outbound call: it
//! resolves the target URL, attaches the cached bearer credential, sends an
//! optional JSON body, and normalizes the response into either a JSON value
//! or a [`ClientError::Upstream`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use iml_common::{ImlConfig, SessionStatus};
use log::{debug, error, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::Value;
use url::Url;

use crate::LeagueApi;
use crate::contract::{
    CONTRACT_VERSION, SAVE_SCORE_PATH, SaveScoreRequest, games_path, team_members_path,
};
use crate::error::ClientError;
use crate::session::{Session, SessionManager};

/// Resolves a path against the base URL.
///
/// Absolute `http(s)://` URLs are used as given. Anything else is treated as
/// relative to `base_url` with its leading slash stripped.
pub(crate) fn resolve_url(base_url: &str, path: &str) -> Result<Url, url::ParseError> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Url::parse(path);
    }

    Url::parse(&format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}

/// Client for the league API.
///
/// Cheaply cloneable; clones share the HTTP connection pool and the session.
///
/// # Examples
///
/// ```no_run
/// use iml_client::{ImlClient, LeagueApi};
/// use iml_common::ImlConfig;
///
/// # async fn example() -> Result<(), iml_client::ClientError> {
/// let config = ImlConfig::new()
///     .with_email("coach@example.edu")
///     .with_password("hunter2")
///     .with_network_id("1234");
///
/// let client = ImlClient::new(config)?;
/// let games = client
///     .list_games("2024-09-01T00:00:00Z", "2024-09-30T23:59:59Z")
///     .await?;
/// println!("{games}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ImlClient {
    http: Client,
    config: Arc<ImlConfig>,
    sessions: Arc<SessionManager>,
}

impl std::fmt::Debug for ImlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImlClient")
            .field("config", &self.config)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl ImlClient {
    /// Creates a client with an empty session cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: ImlConfig) -> Result<Self, ClientError> {
        Url::parse(&config.base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid base URL '{}': {e}", config.base_url))
        })?;

        // None means no timeout; a hung league API hangs the local request
        let http = match config.timeout_seconds {
            Some(timeout) => Client::builder()
                .timeout(Duration::from_secs(timeout))
                .build()?,
            None => Client::builder().build()?,
        };

        let config = Arc::new(config);
        let sessions = Arc::new(SessionManager::new(http.clone(), Arc::clone(&config))?);

        info!(
            "League API client targeting {} (contract {CONTRACT_VERSION})",
            config.base_url
        );

        Ok(Self {
            http,
            config,
            sessions,
        })
    }

    /// The session manager shared by this client.
    pub const fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ImlConfig {
        &self.config
    }

    /// Performs one outbound call with the current credential.
    ///
    /// # Arguments
    ///
    /// * `path` - Path relative to the base URL, or an absolute URL
    /// * `method` - HTTP method
    /// * `body` - Optional JSON body; `Content-Type` is only set when present
    ///
    /// # Returns
    ///
    /// The response parsed as JSON, or the raw text as a JSON string when it
    /// is not JSON. An empty body yields `null`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The target URL cannot be built ([`ClientError::InvalidRequest`])
    /// - The call fails in transport ([`ClientError::Network`])
    /// - The league API answers with a non-success status
    ///   ([`ClientError::Upstream`])
    pub async fn forward(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let url = resolve_url(&self.config.base_url, path)
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid URL for '{path}': {e}")))?;

        let mut request_builder = self
            .http
            .request(method.clone(), url.clone())
            .headers(self.sessions.current_auth_header().await);

        if let Some(body) = body {
            request_builder = request_builder
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?);
        }

        debug!("Forwarding {method} {url}");

        let response = request_builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            // keep the status even if the body can't be read
            let text = response.text().await.unwrap_or_default();
            error!(
                "League API {method} {} failed with status {}",
                url.path(),
                status.as_u16()
            );
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                body: parse_body(text),
            });
        }

        Ok(parse_body(response.text().await?))
    }

    /// Like [`forward`](Self::forward), logging in first if no session is
    /// held.
    ///
    /// # Errors
    ///
    /// Returns login errors from the session manager, then the errors of
    /// [`forward`](Self::forward).
    pub async fn forward_authenticated(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        self.sessions.ensure_session().await?;
        self.forward(path, method, body).await
    }
}

/// Parses a response body, keeping raw text when it is not JSON.
fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }

    serde_json::from_str(&text).unwrap_or_else(|e| {
        debug!("Response body is not JSON ({e}), keeping raw text");
        Value::String(text)
    })
}

#[async_trait]
impl LeagueApi for ImlClient {
    async fn login(&self) -> Result<Arc<Session>, ClientError> {
        self.sessions.login().await
    }

    async fn list_games(&self, start: &str, end: &str) -> Result<Value, ClientError> {
        let network_id = self
            .config
            .network_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ClientError::Configuration("network id is not set".to_string()))?;

        self.forward(&games_path(network_id, start, end), Method::GET, None)
            .await
    }

    async fn team_members(&self, team_id: &str) -> Result<Value, ClientError> {
        self.forward(&team_members_path(team_id), Method::GET, None)
            .await
    }

    async fn save_score(&self, request: SaveScoreRequest) -> Result<Value, ClientError> {
        let body = serde_json::to_value(&request)?;
        self.forward_authenticated(SAVE_SCORE_PATH, Method::POST, Some(&body))
            .await
    }

    async fn session_status(&self) -> SessionStatus {
        self.sessions.status().await
    }
}
