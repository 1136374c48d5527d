//! Ledger event listener for the Farmstead backend.
//!
//! Subscribes to confirmed actions from the configured ledger and applies
//! each one to the player's stored document.
//!
//! # Architecture
//!
//! ```text
//! Ledger (confirmed) --> Reconciler --> Action effects --> User store
//! ```
//!
//! A bad event is logged and skipped; the listener only exits on Ctrl+C or
//! when the ledger closes the stream.

use farmstead_core::{FarmConfig, LedgerBackend, build_runtime, run_reconciler};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, startup, or the subscription fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("farmstead-listener starting");

    let path = FarmConfig::resolve_path(std::env::args().nth(1), |key| std::env::var(key).ok());
    let config = FarmConfig::load(&path)?;
    if config.ledger.backend == LedgerBackend::Simulated {
        warn!(
            "Simulated ledger selected: this process will only see its own events. \
             Run farmstead-server for local play"
        );
    }
    if config.infrastructure.database_url.is_none() {
        warn!("No database configured, reconciled documents will not be shared with the server");
    }

    let runtime = build_runtime(&config).await?;
    let stats = run_reconciler(runtime.service, runtime.events, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    })
    .await?;

    if let Some(pool) = runtime.pool {
        pool.close().await;
    }
    info!(
        applied = stats.applied,
        partial = stats.partial,
        failed = stats.failed,
        dropped = stats.dropped,
        "farmstead-listener shutdown complete"
    );
    Ok(())
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
