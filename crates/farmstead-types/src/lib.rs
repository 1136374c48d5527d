//! Shared type definitions for the Farmstead game backend.
//!
//! This crate is the single source of truth for the data model used across
//! the workspace: the persisted user document, its plots and checkpoints,
//! inventory keys, and the action vocabulary. Types flow downstream to
//! `TypeScript` via `ts-rs` for the game client.
//!
//! # Modules
//!
//! - [`ids`] -- Wallet address and UUID identifier wrappers
//! - [`items`] -- Seed, item, and pet identifiers
//! - [`enums`] -- Plot stages and action kinds
//! - [`plot`] -- Plots and care checkpoints
//! - [`user`] -- The player document and inventory
//! - [`action`] -- The packed action payload integer
//! - [`error`] -- Parse errors for boundary-validated strings

pub mod action;
pub mod enums;
pub mod error;
pub mod ids;
pub mod items;
pub mod plot;
pub mod user;

pub use action::EncodedAction;
pub use enums::{ActionKind, PlotStage};
pub use error::ParseError;
pub use ids::{EventId, VoucherId, WalletAddress};
pub use items::{ItemId, PetKind, SeedId};
pub use plot::{Checkpoint, PLOT_COUNT, Plot, first_pending};
pub use user::{Inventory, STARTING_COINS, STARTING_SEED, UserDocument};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Exporting writes the files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::WalletAddress::export_all();
        let _ = crate::ids::VoucherId::export_all();
        let _ = crate::ids::EventId::export_all();
        let _ = crate::items::PetKind::export_all();
        let _ = crate::enums::PlotStage::export_all();
        let _ = crate::enums::ActionKind::export_all();
        let _ = crate::plot::Checkpoint::export_all();
        let _ = crate::plot::Plot::export_all();
        let _ = crate::user::UserDocument::export_all();
    }
}
