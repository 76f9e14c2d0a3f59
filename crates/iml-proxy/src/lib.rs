//! IMLeagues proxy server.
//!
//! Exposes a small REST surface (login, games, rosters, score submission)
//! that forwards to the league API with a session cached in memory.

pub mod config;
pub mod error;
pub mod paths;
pub mod server;

pub use config::ProxyConfig;
pub use error::{ProxyError, Result};
pub use server::{AppState, router, serve};
