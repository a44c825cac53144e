//! # Storefront Server
//!
//! Boots the resilience core and serves the REST API. The process starts
//! even when the database is unreachable - the resilience layer runs the
//! surface in offline mode until the coordinator reconnects.

use anyhow::Context;
use std::time::Duration;
use storefront_core::config::StorefrontConfig;
use storefront_core::web::{self, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_core::logging::init_structured_logging();

    let config = StorefrontConfig::from_env().context("loading configuration")?;
    let bind_address = config.web.bind_address.clone();

    let (state, worker) = AppState::initialize(config)
        .await
        .context("initializing application state")?;

    let app = web::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {bind_address}"))?;

    info!(address = %bind_address, "Storefront server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving API")?;

    // Router and state are gone; the coordinator worker exits once the last
    // handle drops, aborting any still-pending reconnection attempts.
    let _ = tokio::time::timeout(Duration::from_secs(5), worker).await;

    info!("Storefront server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
