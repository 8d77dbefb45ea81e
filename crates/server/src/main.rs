// crates/server/src/main.rs
//! Querydeck server binary.
//!
//! Boots the HTTP API, wires the REST query executor from environment
//! configuration, and runs the job-store eviction loop until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use querydeck_core::{BackendConfig, RestQueryExecutor};
use querydeck_server::jobs::store::{DEFAULT_EVICTION_INTERVAL, DEFAULT_RETENTION};
use querydeck_server::jobs::JobStore;
use querydeck_server::{create_app, init_metrics, AppState};

/// Default port for the server.
const DEFAULT_PORT: u16 = 47911;

/// Get the server port from environment or use default.
fn get_port() -> u16 {
    std::env::var("QUERYDECK_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Seconds-valued env override with a default.
fn env_duration(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    init_metrics();

    // Backend wiring: the REST executor is the one production QueryExecutor.
    let config = BackendConfig::from_env()
        .ok_or_else(|| anyhow::anyhow!("QUERYDECK_BACKEND_URL must be set"))?;
    tracing::info!(backend_url = %config.base_url, "connecting to query backend");
    let executor = RestQueryExecutor::new(config)?;

    let retention = env_duration("QUERYDECK_RETENTION_SECS", DEFAULT_RETENTION);
    let jobs = Arc::new(JobStore::with_retention(retention));
    let state = AppState::with_jobs(Arc::new(executor), jobs);

    // The shutdown token stops the eviction loop when the server exits.
    let shutdown = CancellationToken::new();
    let eviction_interval = env_duration("QUERYDECK_EVICTION_INTERVAL_SECS", DEFAULT_EVICTION_INTERVAL);
    state.jobs.spawn_eviction_task(eviction_interval, shutdown.clone());

    let app = create_app(state);
    let port = get_port();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(port, "querydeck listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    shutdown.cancel();
    Ok(())
}
