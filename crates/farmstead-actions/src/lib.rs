//! Player actions for the Farmstead game backend.
//!
//! An action travels through this crate twice. Before it reaches the ledger,
//! [`validate_action`] checks it against the player's current state and
//! packs its arguments. After the ledger confirms it, [`apply_confirmed`]
//! unpacks the same integer and mutates the player's document.
//!
//! # Modules
//!
//! - [`payload`] -- Typed arguments and the bit-packed ledger encoding.
//! - [`validation`] -- Preconditions per action kind.
//! - [`reconcile`] -- Applying confirmed actions.
//! - [`rewards`] -- Letter, lottery, and check-in rolls.

pub mod payload;
pub mod reconcile;
pub mod rewards;
pub mod validation;

pub use payload::{ActionPayload, PayloadError};
pub use reconcile::{ReconcileContext, ReconcileError, ReconcileReport, apply_confirmed};
pub use validation::{ValidationContext, ValidationError, validate_action};
