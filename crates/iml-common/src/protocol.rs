//! Local wire types for the proxy's HTTP surface.
//!
//! Every route answers with an [`ApiResponse`] envelope, except the login
//! route which answers with a [`LoginResponse`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope used by every local route.
///
/// Serializes to `{"ok": true, "data": ...}` on success and
/// `{"ok": false, "error": "..."}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded
    pub ok: bool,

    /// Payload on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Error message on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Wraps a successful payload.
    pub const fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Wraps an error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Body returned by `POST /api/iml/login`.
///
/// Only the secondary index token is echoed back; the primary token never
/// leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Always `true`; failures use the error envelope instead
    pub ok: bool,

    /// Secondary token returned by the league API, `null` when absent
    #[serde(rename = "jwtTokenIndexForSPA")]
    pub jwt_token_index_for_spa: Option<String>,
}

/// Query string of `GET /api/iml/games`.
///
/// Both fields are optional at the type level so that a missing parameter
/// is reported with the envelope rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GamesQuery {
    /// Range start (ISO datetime string)
    pub start: Option<String>,
    /// Range end (ISO datetime string)
    pub end: Option<String>,
}

/// Body of `POST /api/iml/games/{gameId}/savescore`.
///
/// Scores and comments are accepted as any JSON scalar; the league API
/// wants strings, so coercion happens in the client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBody {
    /// Game-type code (required)
    pub game_type: Option<Value>,
    /// Score of the first team
    pub team1_score: Option<Value>,
    /// Score of the second team
    pub team2_score: Option<Value>,
    /// Free-text comments
    pub comments: Option<Value>,
}

/// Snapshot of the cached session, without token material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Whether a session is currently held
    pub authenticated: bool,
    /// When the held session was acquired
    pub acquired_at: Option<DateTime<Utc>>,
    /// Whether the league API returned a secondary index token
    pub has_index_token: bool,
}
