//! Shared application state for the API server.

use std::sync::Arc;

use farmstead_core::GameService;
use farmstead_ledger::SimulatedLedger;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The game service.
    pub service: Arc<GameService>,
    /// In-process ledger exposed through the dev submit route. `None`
    /// disables the route.
    pub dev_ledger: Option<Arc<SimulatedLedger>>,
}

impl AppState {
    /// Create state without dev routes.
    pub const fn new(service: Arc<GameService>) -> Self {
        Self {
            service,
            dev_ledger: None,
        }
    }

    /// Enable `POST /api/dev/ledger/submit` against `ledger`.
    #[must_use]
    pub fn with_dev_ledger(mut self, ledger: Arc<SimulatedLedger>) -> Self {
        self.dev_ledger = Some(ledger);
        self
    }
}
