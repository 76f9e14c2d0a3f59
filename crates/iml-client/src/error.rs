//! Error types for the client library.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when talking to the league API.
///
/// None of these are retried; they propagate to the caller as-is.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// A required configuration value is missing or invalid.
    ///
    /// Raised at the point of use, e.g. on login without credentials.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Login failed.
    ///
    /// The login endpoint returned a non-success status, or a success body
    /// without the primary token.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A forwarded call returned a non-success HTTP status.
    #[error("Upstream request failed with status {status}: {}", body_text(.body))]
    Upstream {
        /// HTTP status code returned by the league API.
        status: u16,
        /// Response body, parsed as JSON when possible, raw text otherwise.
        body: Value,
    },

    /// Network or HTTP transport failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request could not be built, e.g. an unparseable target URL.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Check if this is a configuration error.
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is an authentication error.
    pub const fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Get the upstream status code if this is an upstream error.
    pub const fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Renders a body without the quotes JSON adds around raw text.
fn body_text(body: &Value) -> String {
    match body {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
