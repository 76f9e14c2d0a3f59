//! The league API contract.
//!
//! Everything that depends on the vendor's wire format lives here: endpoint
//! paths, the login payload and its client-context flags, the score payload
//! and its result-status code. Several of these values are undocumented by
//! the vendor and were observed from its web client; correct them here
//! without touching the session or forwarding logic.

use std::fmt;

use iml_common::ScoreBody;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use typed_builder::TypedBuilder;
use url::form_urlencoded;

use crate::error::ClientError;

/// Version tag of this contract, logged at client construction.
pub const CONTRACT_VERSION: &str = "2024-spa";

/// Login endpoint, relative to the base URL.
pub const LOGIN_PATH: &str = "Members/Login";

/// Score-submission endpoint, relative to the base URL.
pub const SAVE_SCORE_PATH: &str = "Games/SaveScore";

/// Result-status code sent with every score submission ("final").
pub const RESULT_STATUS_FINAL: i32 = 1;

/// Timezone offset in minutes reported with login.
pub const TIMEZONE_OFFSET_MINUTES: i32 = -300;

/// Games-listing path scoped by network and date range.
#[must_use]
pub fn games_path(network_id: &str, start: &str, end: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("startDate", start)
        .append_pair("endDate", end)
        .finish();
    format!("Networks/{}/Games?{query}", encode_segment(network_id))
}

/// Team-members path scoped by team.
#[must_use]
pub fn team_members_path(team_id: &str) -> String {
    format!("Teams/{}/Members", encode_segment(team_id))
}

/// Percent-encodes a single path segment.
fn encode_segment(segment: &str) -> String {
    // form encoding turns spaces into '+', which a path would keep literally
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Login payload.
///
/// The client-context flags describe the vendor's own web client and are
/// fixed for this deployment.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<&'a str>,
    pub is_web_client: bool,
    pub is_mobile_app: bool,
    pub is_embedded: bool,
    pub is_sso: bool,
    pub is_https: bool,
    pub timezone_offset: i32,
}

impl<'a> LoginRequest<'a> {
    /// Builds a login payload with the fixed client context.
    #[must_use]
    pub const fn new(email: &'a str, password: &'a str, school_id: Option<&'a str>) -> Self {
        Self {
            email,
            password,
            school_id,
            is_web_client: true,
            is_mobile_app: false,
            is_embedded: false,
            is_sso: false,
            is_https: true,
            timezone_offset: TIMEZONE_OFFSET_MINUTES,
        }
    }
}

impl fmt::Debug for LoginRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("school_id", &self.school_id)
            .finish_non_exhaustive()
    }
}

/// Success body of the login endpoint.
///
/// Both tokens are optional at the type level; a missing primary token is
/// turned into an authentication error by the session manager.
#[derive(Default, Deserialize)]
pub struct LoginReply {
    #[serde(rename = "jwtTokenForSPA", default)]
    pub jwt_token_for_spa: Option<String>,
    #[serde(rename = "jwtTokenIndexForSPA", default)]
    pub jwt_token_index_for_spa: Option<String>,
}

/// Score-submission payload.
///
/// # Examples
///
/// ```
/// use iml_client::contract::SaveScoreRequest;
///
/// let request = SaveScoreRequest::builder()
///     .game_id(42)
///     .game_type(serde_json::json!(1))
///     .team1_score("21".to_string())
///     .team2_score("14".to_string())
///     .build();
///
/// assert_eq!(request.result_status, 1);
/// assert!(request.period_scores.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SaveScoreRequest {
    /// Game identifier.
    pub game_id: i64,
    /// Game-type code, forwarded as given.
    pub game_type: Value,
    /// Result-status code.
    #[builder(default = RESULT_STATUS_FINAL)]
    pub result_status: i32,
    /// First team's score.
    #[builder(default)]
    pub team1_score: String,
    /// Second team's score.
    #[builder(default)]
    pub team2_score: String,
    /// Free-text comments.
    #[builder(default)]
    pub comments: String,
    /// Per-period detail; always empty for now.
    #[builder(default)]
    pub period_scores: Vec<Value>,
}

impl SaveScoreRequest {
    /// Builds a submission from the local request body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidRequest`] if `gameType` is missing or null.
    pub fn from_body(game_id: i64, body: ScoreBody) -> Result<Self, ClientError> {
        let game_type = body
            .game_type
            .filter(|v| !v.is_null())
            .ok_or_else(|| ClientError::InvalidRequest("gameType is required".to_string()))?;

        Ok(Self::builder()
            .game_id(game_id)
            .game_type(game_type)
            .team1_score(text_field(body.team1_score.as_ref()))
            .team2_score(text_field(body.team2_score.as_ref()))
            .comments(text_field(body.comments.as_ref()))
            .build())
    }
}

/// Coerces a score or comment to the string form the league API expects.
fn text_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
