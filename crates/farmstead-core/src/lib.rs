//! Core orchestration for the Farmstead game backend.
//!
//! This crate wires the pure game logic (`farmstead-farm`,
//! `farmstead-actions`) to persistence (`farmstead-db`) and the ledger
//! (`farmstead-ledger`). There is no tick loop: all work happens per
//! request or per confirmed ledger event, and the store is the only
//! serialization point.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides
//! - [`clock`] -- Injectable time source
//! - [`service`] -- [`GameService`]: state reads, vouchers, reconciliation
//! - [`subscriber`] -- The reconciliation loop over confirmed events
//! - [`startup`] -- Building a [`Runtime`] from configuration
//! - [`error`] -- [`ServiceError`]

pub mod clock;
pub mod config;
pub mod error;
pub mod service;
pub mod startup;
pub mod subscriber;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, FarmConfig, LedgerBackend};
pub use error::ServiceError;
pub use service::{FarmState, GameService, MAX_ATTEMPTS, ServiceDeps, VoucherDomain};
pub use startup::{Runtime, build_runtime};
pub use subscriber::{ReconcilerStats, reconcile_stream, run_reconciler};
