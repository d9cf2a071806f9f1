// =============================================================================
// Signal Engine — Main Entry Point
// =============================================================================
//
// Wires the store, provider router, bot registry, and runtime config into
// shared `AppState`, spawns the scheduler's recurring jobs (scan cron,
// outcome tracking, accuracy rollup, weight adjustment), and serves the
// REST surface until Ctrl+C.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod aggregation;
mod api;
mod app_state;
mod bots;
mod config;
mod indicators;
mod orchestrator;
mod outcome;
mod providers;
mod regime;
mod router;
mod scheduler;
mod store;
mod types;
mod weighting;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::config::{ProviderCredentials, RuntimeConfig};
use crate::scheduler::Scheduler;

const CONFIG_PATH: &str = "runtime_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("signal engine starting up");

    let config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load runtime config, using defaults");
        RuntimeConfig::default()
    });
    let credentials = ProviderCredentials::from_env();

    let state = Arc::new(AppState::new(config, &credentials));
    info!(
        scan_profiles = ?state.config.read().scan_profiles.keys().collect::<Vec<_>>(),
        bot_count = state.bots.all().len(),
        "app state ready"
    );

    let scheduler = Arc::new(Scheduler::new(
        state.orchestrator.clone(),
        state.outcome_tracker.clone(),
        state.weighting.clone(),
        state.config.clone(),
    ));
    scheduler.spawn();

    let bind_addr = std::env::var("SIGNAL_ENGINE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());
    let api_state = state.clone();
    let bind_addr_for_task = bind_addr.clone();
    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr_for_task)
            .await
            .expect("failed to bind API server");
        info!(addr = %bind_addr_for_task, "api server listening");
        axum::serve(listener, app).await.expect("api server failed");
    });

    info!("all subsystems running, press ctrl+c to stop");
    tokio::signal::ctrl_c().await?;
    warn!("shutdown signal received, stopping gracefully");

    if let Err(e) = state.config.read().save(CONFIG_PATH) {
        error!(error = %e, "failed to save runtime config on shutdown");
    }

    info!("signal engine shut down complete");
    Ok(())
}
