//! Kaiterra Exporter
//!
//! Serves the latest reading of one Kaiterra air-quality sensor as
//! Prometheus metrics. Each scrape of the metrics endpoint triggers one
//! request to the Kaiterra API; there is no background polling.

use anyhow::Context;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use kaiterra_exporter::api;
use kaiterra_exporter::config::{Cli, Config};
use kaiterra_exporter::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ──────────────────────────────────────────────────
    let cli = Cli::parse();
    let config = Config::from_cli(cli)?;
    let addr = config.listen_addr;

    // ── Shared state ────────────────────────────────────────────
    let state = AppState::new(config).context("failed to build upstream HTTP client")?;

    tracing::info!(
        %addr,
        device_uuid = %state.config().device_uuid,
        upstream = %state.fetcher().endpoint(),
        metrics_path = %state.config().metrics_path,
        "Kaiterra Laser Egg Prometheus Exporter starting"
    );

    // ── Router ──────────────────────────────────────────────────
    let app = api::router(&state.config().metrics_path)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // ── Listen ──────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("kaiterra-exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
