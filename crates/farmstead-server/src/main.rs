//! API server binary for the Farmstead backend.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration (argument, `FARMSTEAD_CONFIG`, or
//!    `farmstead-config.yaml`)
//! 3. Connect the store and ledger, run migrations
//! 4. With the simulated ledger, open the event stream and start the
//!    in-process reconciler before accepting requests
//! 5. Serve the API until Ctrl+C
//! 6. Stop the reconciler and close the pool
//!
//! With the NATS ledger the server only reads state and issues vouchers;
//! `farmstead-listener` applies confirmed events.

mod error;

use std::sync::Arc;

use farmstead_api::{AppState, start_server};
use farmstead_core::{FarmConfig, build_runtime, reconcile_stream};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::LaunchError;

/// Application entry point for the API server.
///
/// # Errors
///
/// Returns an error if configuration, startup, or the server itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("farmstead-server starting");
    run().await?;
    info!("farmstead-server shutdown complete");
    Ok(())
}

async fn run() -> Result<(), LaunchError> {
    let path = FarmConfig::resolve_path(std::env::args().nth(1), |key| std::env::var(key).ok());
    let config = FarmConfig::load(&path)?;
    info!(
        path = %path.display(),
        port = config.server.port,
        ledger = ?config.ledger.backend,
        "Configuration loaded"
    );

    let runtime = build_runtime(&config).await?;
    let (stop_tx, stop_rx) = watch::channel(false);

    let mut state = AppState::new(Arc::clone(&runtime.service));
    let reconciler = match &runtime.simulated {
        Some(ledger) => {
            let events = runtime.events.subscribe().await?;
            let handle = tokio::spawn(reconcile_stream(
                Arc::clone(&runtime.service),
                events,
                stopped(stop_rx.clone()),
            ));
            if config.server.dev_routes {
                state = state.with_dev_ledger(Arc::clone(ledger));
                warn!("Dev ledger routes enabled");
            }
            Some(handle)
        }
        None => None,
    };

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
        info!("Shutdown requested");
        stop_tx.send_replace(true);
    });

    start_server(&config.server, Arc::new(state), stopped(stop_rx)).await?;

    if let Some(handle) = reconciler {
        match handle.await {
            Ok(stats) => info!(applied = stats.applied, failed = stats.failed, "Reconciler joined"),
            Err(e) => warn!(error = %e, "Reconciler task ended abnormally"),
        }
    }
    if let Some(pool) = runtime.pool {
        pool.close().await;
    }
    Ok(())
}

/// Resolves once the stop flag is raised or its sender is gone.
async fn stopped(mut rx: watch::Receiver<bool>) {
    rx.wait_for(|stop| *stop).await.ok();
}

/// Install the global subscriber. `FARMSTEAD_LOG_JSON=1` switches to JSON
/// lines for log shippers.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("FARMSTEAD_LOG_JSON").is_ok_and(|v| v == "1") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
