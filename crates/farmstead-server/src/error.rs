//! Error types for the API server binary.

/// Top-level error for the API server binary.
///
/// Each variant wraps a specific subsystem error so `main` can propagate
/// with `?`.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: farmstead_core::ConfigError,
    },

    /// Store, ledger, or service assembly failed.
    #[error("startup error: {source}")]
    Startup {
        /// The underlying service error.
        #[from]
        source: farmstead_core::ServiceError,
    },

    /// Opening the confirmed-event stream failed.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: farmstead_ledger::LedgerError,
    },

    /// The HTTP server failed to bind or crashed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: farmstead_api::ServerError,
    },
}
