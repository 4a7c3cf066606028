//! Hookfilter server binary.
//!
//! Starts the webhook filter relay: loads configuration from the
//! environment (optionally pre-populated from `variables.env` when
//! `--env-file` is passed), builds the router, and serves until SIGINT or
//! SIGTERM.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hookfilter::{app, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("filter_server_starting");

    if std::env::args().any(|arg| arg == "--env-file") {
        hookfilter::config::load_env_file();
    }

    // Load configuration; a missing secret or relay URL is fatal here and
    // only here, never mid-request.
    let config = Config::from_env()?;
    info!(
        port = config.port,
        relay_url = %config.relay_url,
        "config_loaded"
    );

    let relay_client = Client::builder()
        .build()
        .context("Failed to build relay HTTP client")?;

    let state = AppState::new(config.clone(), relay_client);
    let router = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "filter_server_listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("filter_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("filter_server_shutting_down");
}
