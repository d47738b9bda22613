//! Edge Web Server - BCV rates and the Hevy webhook relay.
//!
//! This binary provides a small web server that:
//! - Aggregates BCV exchange rates on every (cacheable) request
//! - Relays Hevy webhooks to GitHub repository dispatch
//! - Answers admin login checks
//!
//! All handlers are stateless; configuration comes from the environment.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use edge::util::build_client;
use edge::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        eur_api_url = %config.eur_api_url,
        usd_api_url = %config.usd_api_url,
        usdt_api_url = %config.usdt_api_url,
        upstream_timeout_ms = config
            .upstream_timeout
            .and_then(|t| u64::try_from(t.as_millis()).ok()),
        github_repo = %config.github_repo,
        webhook_secret_configured = config.webhook_secret.is_some(),
        admin_configured = config.admin_user.is_some() && config.admin_pass.is_some(),
        "config_loaded"
    );

    if config.github_token.is_none() {
        warn!("github_token_not_configured");
    }

    let http = build_client(config.upstream_timeout).context("Failed to create HTTP client")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, http));

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
