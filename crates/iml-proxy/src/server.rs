//! HTTP routes.
//!
//! Maps the local REST surface onto [`LeagueApi`] calls. Handlers perform
//! the little validation the proxy owns (required query parameters, numeric
//! game ids, `gameType` presence) and leave everything else to the league
//! API.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path as UrlPath, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use iml_client::{ClientError, LeagueApi, SaveScoreRequest};
use iml_common::{ApiResponse, GamesQuery, LoginResponse, ScoreBody, SessionStatus};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument};

use crate::error::{ProxyError, Result};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// League API client
    pub api: Arc<dyn LeagueApi>,
}

impl AppState {
    /// Creates handler state around a league API client.
    pub fn new(api: Arc<dyn LeagueApi>) -> Self {
        Self { api }
    }
}

/// Builds the application router.
///
/// API routes live under `/api/iml`. When `static_dir` is given, any other
/// path is served from that directory.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/login", post(login))
        .route("/games", get(list_games))
        .route("/games/{game_id}/savescore", post(save_score))
        .route("/teams/{team_id}/members", get(team_members))
        .route("/session", get(session_status));

    let mut app = Router::new()
        .route("/health", get(health))
        .nest("/api/iml", api)
        .with_state(state);

    if let Some(dir) = static_dir {
        info!(static_dir = %dir.display(), "Serving static files");
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
}

/// Serves `app` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(address = %addr, "Proxy listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

#[instrument(skip(state))]
async fn login(State(state): State<AppState>) -> Result<Json<LoginResponse>> {
    let session = state.api.login().await?;

    Ok(Json(LoginResponse {
        ok: true,
        jwt_token_index_for_spa: session.index_token().map(str::to_string),
    }))
}

#[instrument(skip(state))]
async fn list_games(
    State(state): State<AppState>,
    query: std::result::Result<Query<GamesQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Value>>> {
    let Query(query) = query?;
    let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let (Some(start), Some(end)) = (present(query.start), present(query.end)) else {
        return Err(ProxyError::bad_request(
            "Missing required query parameters: start, end",
        ));
    };

    let games = state.api.list_games(&start, &end).await?;
    Ok(Json(ApiResponse::success(games)))
}

#[instrument(skip(state))]
async fn team_members(
    State(state): State<AppState>,
    team_id: std::result::Result<UrlPath<String>, PathRejection>,
) -> Result<Json<ApiResponse<Value>>> {
    let UrlPath(team_id) = team_id?;
    let members = state.api.team_members(&team_id).await?;
    Ok(Json(ApiResponse::success(members)))
}

#[instrument(skip(state, body), fields(body_len = body.len()))]
async fn save_score(
    State(state): State<AppState>,
    game_id: std::result::Result<UrlPath<String>, PathRejection>,
    body: Bytes,
) -> Result<Json<ApiResponse<Value>>> {
    let UrlPath(game_id) = game_id?;
    let game_id: i64 = game_id
        .trim()
        .parse()
        .map_err(|_| ProxyError::bad_request("Invalid gameId"))?;

    let body: ScoreBody = if body.iter().all(u8::is_ascii_whitespace) {
        ScoreBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ProxyError::bad_request(format!("Invalid JSON body: {e}")))?
    };

    let request = SaveScoreRequest::from_body(game_id, body).map_err(|e| match e {
        ClientError::InvalidRequest(message) => ProxyError::BadRequest(message),
        other => other.into(),
    })?;

    debug!(game_id, "Submitting score");

    let result = state.api.save_score(request).await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn session_status(State(state): State<AppState>) -> Json<ApiResponse<SessionStatus>> {
    Json(ApiResponse::success(state.api.session_status().await))
}
