//! Assemble a runnable backend from a [`FarmConfig`].
//!
//! Both binaries call [`build_runtime`]: the API server to serve requests
//! (and, with the simulated ledger, to reconcile in-process), the listener
//! to reconcile events from an external ledger.
//!
//! # Usage
//!
//! ```rust,ignore
//! use farmstead_core::{FarmConfig, build_runtime, run_reconciler};
//!
//! let config = FarmConfig::load(&path)?;
//! let runtime = build_runtime(&config).await?;
//! run_reconciler(runtime.service, runtime.events, shutdown).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use farmstead_db::{MemoryUserStore, PostgresConfig, PostgresPool, UserStore};
use farmstead_ledger::{
    EventSource, HmacVoucherSigner, NatsLedger, NonceSource, SimulatedLedger, VoucherSigner,
};

use crate::clock::{Clock, SystemClock};
use crate::config::{FarmConfig, LedgerBackend};
use crate::error::ServiceError;
use crate::service::{GameService, ServiceDeps, VoucherDomain};

/// Everything a binary needs to run.
pub struct Runtime {
    /// The game service.
    pub service: Arc<GameService>,
    /// Where confirmed ledger events come from.
    pub events: Arc<dyn EventSource>,
    /// The in-process ledger, when the simulated backend is selected.
    pub simulated: Option<Arc<SimulatedLedger>>,
    /// The database pool, when `PostgreSQL` is configured.
    pub pool: Option<PostgresPool>,
}

/// Connect the store and ledger named by `config` and build the service.
///
/// Runs pending migrations when a database is configured.
///
/// # Errors
///
/// Returns [`ServiceError::Db`] if the database is unreachable or a
/// migration fails, and [`ServiceError::Ledger`] if the signer key is
/// unusable or the NATS relay is unreachable.
pub async fn build_runtime(config: &FarmConfig) -> Result<Runtime, ServiceError> {
    let (store, pool): (Arc<dyn UserStore>, Option<PostgresPool>) =
        if let Some(url) = &config.infrastructure.database_url {
            let pg = PostgresConfig::new(url)
                .with_max_connections(config.infrastructure.max_connections);
            let pool = PostgresPool::connect(&pg).await?;
            pool.run_migrations().await?;
            (Arc::new(pool.user_store()), Some(pool))
        } else {
            tracing::warn!("No database configured, player data lives in memory only");
            (Arc::new(MemoryUserStore::new()), None)
        };

    let signer: Arc<dyn VoucherSigner> =
        Arc::new(HmacVoucherSigner::new(config.ledger.signer_key.as_bytes().to_vec())?);

    let (nonces, events, simulated): (Arc<dyn NonceSource>, Arc<dyn EventSource>, _) =
        match config.ledger.backend {
            LedgerBackend::Simulated => {
                let ledger = Arc::new(SimulatedLedger::new(
                    Arc::clone(&signer),
                    config.ledger.domain.clone(),
                    config.ledger.chain_id,
                ));
                tracing::info!("Using simulated ledger");
                (
                    Arc::clone(&ledger) as Arc<dyn NonceSource>,
                    Arc::clone(&ledger) as Arc<dyn EventSource>,
                    Some(ledger),
                )
            }
            LedgerBackend::Nats => {
                let ledger = Arc::new(
                    NatsLedger::connect(
                        &config.infrastructure.nats_url,
                        config.ledger.subject_prefix.clone(),
                        Duration::from_millis(config.ledger.request_timeout_ms),
                    )
                    .await?,
                );
                (
                    Arc::clone(&ledger) as Arc<dyn NonceSource>,
                    ledger as Arc<dyn EventSource>,
                    None,
                )
            }
        };

    let service = GameService::new(
        ServiceDeps {
            store,
            nonces,
            signer,
            clock: Arc::new(SystemClock) as Arc<dyn Clock>,
        },
        config.catalog(),
        config.rules.clone(),
        VoucherDomain {
            name: config.ledger.domain.clone(),
            chain_id: config.ledger.chain_id,
        },
        GameService::rng_from_seed(config.rng_seed),
    );

    tracing::info!(
        ledger = ?config.ledger.backend,
        chain_id = config.ledger.chain_id,
        persistent = pool.is_some(),
        "Game service ready"
    );

    Ok(Runtime {
        service: Arc::new(service),
        events,
        simulated,
        pool,
    })
}
