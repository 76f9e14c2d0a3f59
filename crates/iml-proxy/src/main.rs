//! IMLeagues proxy
//!
//! Long-running HTTP server that logs in to the league API on demand and
//! forwards a simplified set of routes with the cached session.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use futures::stream::StreamExt;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use iml_client::ImlClient;
use iml_proxy::{AppState, ProxyConfig, router, serve};

/// Command-line flags. Flags win over the config file and environment.
#[derive(Debug, Parser)]
#[command(name = "iml-proxy", version, about)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, env = "IML_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to bind
    #[arg(long)]
    port: Option<u16>,
}

/// Sets up the tracing subscriber.
///
/// `IML_PROXY_LOG_FORMAT=json` emits one JSON object per event with source
/// locations; anything else prints compact lines. `RUST_LOG` overrides the
/// default filter, which covers the proxy, the client and request spans.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let format = std::env::var("IML_PROXY_LOG_FORMAT")
        .unwrap_or_else(|_| "pretty".to_string())
        .to_lowercase();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("iml_proxy=info,iml_client=info,tower_http=info")
    });

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .init();
        }
    }
}

/// Resolves once SIGTERM or SIGINT is received.
async fn shutdown_signal() {
    let mut signals = match Signals::new([SIGTERM, SIGINT]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Failed to install signal handlers: {e}");
            std::future::pending::<()>().await;
            return;
        }
    };

    while let Some(signal) = signals.next().await {
        match signal {
            SIGTERM => {
                info!("Received SIGTERM, initiating graceful shutdown");
                break;
            }
            SIGINT => {
                info!("Received SIGINT, initiating graceful shutdown");
                break;
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be in the environment before clap reads `env` attributes
    let dotenv = dotenvy::dotenv();

    init_tracing();

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load .env file: {e}"),
    }

    let args = Args::parse();

    info!("Starting IMLeagues proxy");

    let mut config = match ProxyConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return Err(e.into());
        }
    };

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let missing = config.missing_login_settings();
    if !missing.is_empty() {
        warn!(
            "Login settings not set: {}; login will fail until they are",
            missing.join(", ")
        );
    }
    if config.iml.network_id.is_none() {
        warn!("IML_NETWORK_ID not set; the games listing will fail until it is");
    }

    let client = ImlClient::new(config.iml.clone()).context("failed to build league API client")?;
    let state = AppState::new(Arc::new(client));
    let app = router(state, config.server.static_dir.as_deref());

    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    serve(listener, app, shutdown_signal()).await?;

    info!("Proxy shutdown complete");

    Ok(())
}
