//! # iml-common
//!
//! Shared types for the IMLeagues proxy.
//!
//! - [`ImlConfig`]: credentials and identifiers used by the league API client
//! - [`protocol`]: the JSON shapes of the proxy's local HTTP surface
//!
//! ## Example
//!
//! ```
//! use iml_common::{ApiResponse, ImlConfig};
//!
//! let config = ImlConfig::new()
//!     .with_email("coach@example.edu")
//!     .with_password("hunter2");
//!
//! let response = ApiResponse::success(serde_json::json!({"games": []}));
//! assert!(response.ok);
//! ```

/// League API client configuration.
pub mod config;
/// Local HTTP request and response shapes.
pub mod protocol;

pub use config::{DEFAULT_BASE_URL, ImlConfig};
pub use protocol::{ApiResponse, GamesQuery, LoginResponse, ScoreBody, SessionStatus};
