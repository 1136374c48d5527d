//! Error type for the game service.

use farmstead_actions::{ReconcileError, ValidationError};
use farmstead_db::DbError;
use farmstead_ledger::LedgerError;

/// Everything a [`crate::GameService`] operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The requested action is not allowed in the player's current state.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A confirmed action could not be applied.
    #[error("reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    /// The ledger or voucher signer failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The store failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Concurrent writers kept invalidating the document.
    #[error("gave up on {wallet} after {attempts} conflicting writes")]
    Contention {
        /// The player whose document kept changing.
        wallet: String,
        /// How many load/compute/save cycles were attempted.
        attempts: u32,
    },
}
