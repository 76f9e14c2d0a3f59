//! Error types for the proxy server.
//!
//! Every error a route returns is rendered as `{"ok": false, "error": ...}`.
//! Local validation failures answer 400; everything else answers 500, no
//! matter what status the league API used.

use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use iml_client::ClientError;
use iml_common::ApiResponse;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

/// Errors that can occur in the proxy server.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Request failed local validation.
    #[error("{0}")]
    BadRequest(String),

    /// League API client error (configuration, auth, upstream, transport).
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (config file, socket binding).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias using `ProxyError`.
pub type Result<T> = std::result::Result<T, ProxyError>;

impl ProxyError {
    /// Creates a validation error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// The local HTTP status this error is reported with.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<QueryRejection> for ProxyError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ProxyError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(error = %message, "Request failed");
        } else {
            warn!(error = %message, "Request rejected");
        }

        (status, Json(ApiResponse::<Value>::failure(message))).into_response()
    }
}
