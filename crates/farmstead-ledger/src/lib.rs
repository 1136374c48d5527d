//! Ledger integration for the Farmstead game backend.
//!
//! Game actions are recorded on an external ledger. The backend never writes
//! to it directly: it issues a signed [`Voucher`] for a validated action, the
//! player submits it, and the ledger later reports a [`ConfirmedAction`] that
//! the backend reconciles into the player's document.
//!
//! # Modules
//!
//! - [`voucher`] -- Voucher claims and the HMAC-SHA256 signer.
//! - [`event`] -- Confirmed events plus the [`NonceSource`] and
//!   [`EventSource`] traits.
//! - [`simulated`] -- In-process ledger used for local runs and tests.
//! - [`nats`] -- Bridge to an external ledger relay over NATS.
//! - [`error`] -- [`LedgerError`].

pub mod error;
pub mod event;
pub mod nats;
pub mod simulated;
pub mod voucher;

pub use error::LedgerError;
pub use event::{ConfirmedAction, ConfirmedStream, EventSource, NonceSource};
pub use nats::{DEFAULT_SUBJECT_PREFIX, NatsLedger};
pub use simulated::SimulatedLedger;
pub use voucher::{HmacVoucherSigner, Voucher, VoucherClaims, VoucherSigner};
