// Main entry point - Dependency injection, poll loop and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::sync::{Mutex, broadcast, watch};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_controller::DashboardController;
use crate::application::poller::run_poll_loop;
use crate::infrastructure::config::{load_dashboard_config, load_field_registry};
use crate::infrastructure::http_source::HttpMetricsSource;
use crate::presentation::app_state::AppState;
use crate::presentation::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    let registry = load_field_registry(config.registry_path.as_deref())?;

    // Create metrics source (infrastructure layer)
    let source = Arc::new(HttpMetricsSource::new(
        config.source.endpoint.clone(),
        config.source.timeout_ms.map(Duration::from_millis),
    )?);

    // Create controller (application layer)
    let controller = DashboardController::create(registry, config.layout.clone())
        .context("Dashboard layout does not match the field registry")?;
    let controller = Arc::new(Mutex::new(controller));

    let (frames, _) = broadcast::channel(16);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tracing::info!("Polling {}", source.endpoint());
    let poller = tokio::spawn(run_poll_loop(
        controller.clone(),
        source,
        Duration::from_millis(config.poll.interval_ms),
        frames.clone(),
        shutdown_rx.clone(),
    ));

    // Build router (presentation layer)
    let state = Arc::new(AppState {
        controller: controller.clone(),
        frames,
        shutdown: shutdown_rx,
    });
    let router = router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen))?;
    tracing::info!("Starting pistat dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    poller.await?;
    controller.lock().await.teardown();

    Ok(())
}
