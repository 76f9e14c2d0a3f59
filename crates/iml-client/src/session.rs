//! Session cache for the league API.
//!
//! A [`SessionManager`] owns the single credential the proxy uses for
//! authorized calls. The session is either absent or fully present; it is
//! created by a successful login, replaced wholesale by the next successful
//! login, and never cleared. A failed login leaves the previous session in
//! place.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use iml_common::{ImlConfig, SessionStatus};
use log::{debug, error, info, warn};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::contract::{LOGIN_PATH, LoginReply, LoginRequest};
use crate::error::ClientError;
use crate::forwarder::resolve_url;

/// An authenticated session with the league API.
pub struct Session {
    token: SecretString,
    index_token: Option<String>,
    acquired_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session from the tokens returned by login.
    pub fn new(
        token: impl Into<String>,
        index_token: Option<String>,
        acquired_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token: SecretString::new(token.into().into()),
            index_token,
            acquired_at,
        }
    }

    /// The primary token, used as the bearer credential.
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// The secondary index token, if the league API returned one.
    pub fn index_token(&self) -> Option<&str> {
        self.index_token.as_deref()
    }

    /// When this session was acquired.
    pub const fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("index_token", &self.index_token.as_ref().map(|_| "[REDACTED]"))
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

/// Owns the process's session and performs login.
///
/// Logins are serialized: [`ensure_session`](Self::ensure_session) re-checks
/// the cache after acquiring the login lock, so concurrent callers that all
/// find the cache empty trigger a single login between them.
pub struct SessionManager {
    http: reqwest::Client,
    login_url: Url,
    config: Arc<ImlConfig>,
    session: RwLock<Option<Arc<Session>>>,
    login_lock: Mutex<()>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("login_url", &self.login_url.as_str())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a session manager with no session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the base URL cannot be
    /// joined with the login path.
    pub fn new(http: reqwest::Client, config: Arc<ImlConfig>) -> Result<Self, ClientError> {
        let login_url = resolve_url(&config.base_url, LOGIN_PATH).map_err(|e| {
            ClientError::Configuration(format!("invalid base URL '{}': {e}", config.base_url))
        })?;

        Ok(Self {
            http,
            login_url,
            config,
            session: RwLock::new(None),
            login_lock: Mutex::new(()),
        })
    }

    /// Logs in and replaces the held session.
    ///
    /// Always performs a login call, waiting for any login already in
    /// flight first.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email or password is not configured ([`ClientError::Configuration`])
    /// - The login endpoint answers with a non-success status, or without a
    ///   primary token ([`ClientError::Auth`])
    /// - The login endpoint cannot be reached ([`ClientError::Network`])
    pub async fn login(&self) -> Result<Arc<Session>, ClientError> {
        let _guard = self.login_lock.lock().await;
        self.perform_login().await
    }

    /// Returns the held session, logging in first if there is none.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`login`](Self::login) when a login is
    /// needed.
    pub async fn ensure_session(&self) -> Result<Arc<Session>, ClientError> {
        if let Some(session) = self.current().await {
            return Ok(session);
        }

        let _guard = self.login_lock.lock().await;

        // another caller may have logged in while we waited
        if let Some(session) = self.current().await {
            debug!("Session acquired by a concurrent login");
            return Ok(session);
        }

        self.perform_login().await
    }

    /// Returns the held session, if any.
    pub async fn current(&self) -> Option<Arc<Session>> {
        self.session.read().await.clone()
    }

    /// Returns the authorization headers for an outbound call.
    ///
    /// Empty when no session is held; the league API is expected to reject
    /// such a request.
    pub async fn current_auth_header(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let Some(session) = self.current().await else {
            return headers;
        };

        match HeaderValue::from_str(&format!("Bearer {}", session.token().expose_secret())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(e) => warn!("Session token is not a valid header value: {e}"),
        }

        headers
    }

    /// Snapshot of the held session without token material.
    pub async fn status(&self) -> SessionStatus {
        self.current()
            .await
            .map_or_else(
                || SessionStatus {
                    authenticated: false,
                    acquired_at: None,
                    has_index_token: false,
                },
                |session| SessionStatus {
                    authenticated: true,
                    acquired_at: Some(session.acquired_at()),
                    has_index_token: session.index_token().is_some(),
                },
            )
    }

    /// Performs the login call. Caller must hold `login_lock`.
    async fn perform_login(&self) -> Result<Arc<Session>, ClientError> {
        let email = self
            .config
            .email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ClientError::Configuration("account email is not set".to_string()))?;

        let password = self
            .config
            .password
            .as_ref()
            .filter(|p| !p.expose_secret().is_empty())
            .ok_or_else(|| {
                ClientError::Configuration("account password is not set".to_string())
            })?;

        let payload = LoginRequest::new(
            email,
            password.expose_secret(),
            self.config.school_id.as_deref(),
        );

        debug!("Logging in to {} as {email}", self.login_url);

        let response = self
            .http
            .post(self.login_url.clone())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("Login failed with status {}: {text}", status.as_u16());
            return Err(ClientError::Auth(format!(
                "login failed with status {}: {text}",
                status.as_u16()
            )));
        }

        let reply: LoginReply = serde_json::from_str(&text).map_err(|e| {
            ClientError::Auth(format!("login response is not valid JSON: {e}"))
        })?;

        let token = reply
            .jwt_token_for_spa
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                error!("Login response did not include jwtTokenForSPA");
                ClientError::Auth("login response missing jwtTokenForSPA".to_string())
            })?;

        let session = Arc::new(Session::new(
            token,
            reply.jwt_token_index_for_spa,
            Utc::now(),
        ));
        *self.session.write().await = Some(Arc::clone(&session));

        info!("Logged in to league API as {email}");

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn create_test_config(base_url: &str) -> ImlConfig {
        ImlConfig::new()
            .with_base_url(base_url)
            .with_email("coach@example.edu")
            .with_password("hunter2")
            .with_school_id("77")
    }

    fn create_manager(config: ImlConfig) -> SessionManager {
        SessionManager::new(reqwest::Client::new(), Arc::new(config)).unwrap()
    }

    async fn mount_login(server: &MockServer, token: &str, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/Members/Login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "jwtTokenForSPA": token })),
            )
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_login_stores_primary_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/Members/Login"))
            .and(body_partial_json(json!({
                "email": "coach@example.edu",
                "password": "hunter2",
                "schoolId": "77",
                "isWebClient": true,
                "isHttps": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwtTokenForSPA": "T1",
                "jwtTokenIndexForSPA": "I1"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let manager = create_manager(create_test_config(&mock_server.uri()));
        let session = manager.login().await.unwrap();

        assert_eq!(session.token().expose_secret(), "T1");
        assert_eq!(session.index_token(), Some("I1"));

        let held = manager.current().await.expect("session should be held");
        assert_eq!(held.token().expose_secret(), "T1");
    }

    #[tokio::test]
    async fn test_login_without_primary_token_is_auth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/Members/Login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "jwtTokenIndexForSPA": "I1" })),
            )
            .mount(&mock_server)
            .await;

        let manager = create_manager(create_test_config(&mock_server.uri()));
        let err = manager.login().await.unwrap_err();

        assert!(err.is_auth_error(), "unexpected error: {err}");
        assert!(manager.current().await.is_none());
    }

    #[tokio::test]
    async fn test_login_with_non_json_success_is_auth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/Members/Login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&mock_server)
            .await;

        let manager = create_manager(create_test_config(&mock_server.uri()));
        let err = manager.login().await.unwrap_err();
        assert!(err.is_auth_error());
    }

    #[tokio::test]
    async fn test_failed_relogin_keeps_previous_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/Members/Login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jwtTokenForSPA": "T1" })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/Members/Login"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
            .mount(&mock_server)
            .await;

        let manager = create_manager(create_test_config(&mock_server.uri()));
        manager.login().await.unwrap();

        let err = manager.login().await.unwrap_err();
        assert!(err.is_auth_error());
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad credentials"));

        let held = manager.current().await.expect("previous session kept");
        assert_eq!(held.token().expose_secret(), "T1");
    }

    #[tokio::test]
    async fn test_login_without_credentials_is_configuration_error() {
        let mock_server = MockServer::start().await;
        mount_login(&mock_server, "T1", 0).await;

        let config = ImlConfig::new()
            .with_base_url(mock_server.uri())
            .with_email("coach@example.edu");
        let manager = create_manager(config);

        let err = manager.login().await.unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("password"));
    }

    #[tokio::test]
    async fn test_auth_header_empty_then_bearer() {
        let mock_server = MockServer::start().await;
        mount_login(&mock_server, "T1", 1).await;

        let manager = create_manager(create_test_config(&mock_server.uri()));
        assert!(manager.current_auth_header().await.is_empty());

        manager.login().await.unwrap();

        let headers = manager.current_auth_header().await;
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer T1");
    }

    #[tokio::test]
    async fn test_ensure_session_reuses_held_session() {
        let mock_server = MockServer::start().await;
        mount_login(&mock_server, "T1", 1).await;

        let manager = create_manager(create_test_config(&mock_server.uri()));
        let first = manager.ensure_session().await.unwrap();
        let second = manager.ensure_session().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_concurrent_ensure_session_logs_in_once() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/Members/Login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jwtTokenForSPA": "T1" }))
                    .set_delay(Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let manager = Arc::new(create_manager(create_test_config(&mock_server.uri())));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.ensure_session().await })
            })
            .collect();

        for handle in handles {
            let session = handle.await.unwrap().unwrap();
            assert_eq!(session.token().expose_secret(), "T1");
        }
    }

    #[tokio::test]
    async fn test_status_reports_without_tokens() {
        let mock_server = MockServer::start().await;
        mount_login(&mock_server, "T1", 1).await;

        let manager = create_manager(create_test_config(&mock_server.uri()));
        assert!(!manager.status().await.authenticated);

        manager.login().await.unwrap();

        let status = manager.status().await;
        assert!(status.authenticated);
        assert!(status.acquired_at.is_some());
        assert!(!status.has_index_token);
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new("secret-token", Some("idx".to_string()), Utc::now());
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-token"));
        assert!(!debug.contains("idx"));
    }
}
