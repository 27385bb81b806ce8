use anyhow::{Context, Result};
use axum::Router;
use fleetsim::api::{
    create_firmware_router, create_robots_router, create_warehouse_router, create_ws_router,
    RestAppState, WsAppState,
};
use fleetsim::config::{load_config, Config};
use fleetsim::registry::RobotRegistry;
use fleetsim::sim::{run_tick_loop, SimEngine};
use fleetsim::store::FsStore;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetsim=info".into()),
        )
        .init();

    info!("Fleetsim starting...");

    let config_path =
        std::env::var("FLEETSIM_CONFIG").unwrap_or_else(|_| "fleetsim.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        load_config(&config_path)?
    } else {
        info!(path = %config_path, "No config file found, using defaults");
        Config::default()
    };

    // State store and registry
    let store = Arc::new(FsStore::new(&config.store.data_dir).context("Failed to open store")?);
    let registry = Arc::new(RobotRegistry::new(store));

    // Simulation engine and tick fan-out channel
    let engine = Arc::new(SimEngine::new(registry.clone(), config.simulation.seed));
    let (tick_tx, _) = broadcast::channel(16);

    let driver = tokio::spawn(run_tick_loop(
        engine,
        tick_tx.clone(),
        config.simulation.tick_interval_ms,
    ));

    // Routers
    let rest_state = Arc::new(RestAppState { registry });
    let ws_state = Arc::new(WsAppState { tick_tx });

    let app = Router::new()
        .merge(create_robots_router(rest_state.clone()))
        .merge(create_warehouse_router(rest_state.clone()))
        .merge(create_firmware_router(rest_state))
        .merge(create_ws_router(ws_state))
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(addr = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the periodic driver; a tick in progress is synchronous and
    // completes before the task is torn down.
    driver.abort();
    info!("Fleetsim stopped");

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
