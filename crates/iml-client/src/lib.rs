//! # iml-client
//!
//! Client library for the IMLeagues API.
//!
//! Logs in once with the configured account, caches the resulting session,
//! and forwards calls with the cached bearer credential:
//! - [`SessionManager`]: login and the session cache
//! - [`ImlClient`]: one outbound call per local call, with response and error
//!   normalization
//! - [`contract`]: the vendor wire format, kept in one place
//!
//! ## Example
//!
//! ```no_run
//! use iml_client::{ImlClient, LeagueApi};
//! use iml_common::ImlConfig;
//!
//! # async fn example() -> Result<(), iml_client::ClientError> {
//! let client = ImlClient::new(
//!     ImlConfig::new()
//!         .with_email("coach@example.edu")
//!         .with_password("hunter2"),
//! )?;
//!
//! let session = client.login().await?;
//! println!("logged in at {}", session.acquired_at());
//!
//! let roster = client.team_members("1234").await?;
//! println!("{roster}");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use iml_common::SessionStatus;
use serde_json::Value;

pub mod contract;
pub mod error;
pub mod forwarder;
pub mod session;

pub use contract::SaveScoreRequest;
pub use error::ClientError;
pub use forwarder::ImlClient;
pub use session::{Session, SessionManager};

/// Operations the proxy exposes on top of the league API.
///
/// Implemented by [`ImlClient`]; the server holds it as a trait object so the
/// vendor client can be replaced without touching the routes.
#[async_trait]
pub trait LeagueApi: Send + Sync {
    /// Forces a login and replaces the cached session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] when credentials are missing and
    /// [`ClientError::Auth`] when the league API rejects the login. The
    /// previous session is kept on failure.
    async fn login(&self) -> Result<Arc<Session>, ClientError>;

    /// Lists games of the configured network in a date range.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] when no network id is set, and
    /// [`ClientError::Upstream`] on a non-success status.
    async fn list_games(&self, start: &str, end: &str) -> Result<Value, ClientError>;

    /// Fetches a team roster.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Upstream`] on a non-success status.
    async fn team_members(&self, team_id: &str) -> Result<Value, ClientError>;

    /// Submits a game score, logging in first if no session is held.
    ///
    /// # Errors
    ///
    /// Returns login errors, then [`ClientError::Upstream`] on a non-success
    /// status.
    async fn save_score(&self, request: SaveScoreRequest) -> Result<Value, ClientError>;

    /// Reports whether a session is held.
    async fn session_status(&self) -> SessionStatus;
}
