//! Crop lifecycle rules for the Farmstead game backend.
//!
//! Everything in this crate is a pure function of stored facts, the static
//! [`Catalog`], the tunable [`GameRules`], and an explicit `now`. No
//! background process advances plots; state is derived on read.
//!
//! # Modules
//!
//! - [`catalog`] -- Seed, pet, plot, level, and reward tables.
//! - [`rules`] -- Tunable values and the alternate calculation modes.
//! - [`growth`] -- Stage boundaries for a seed, with fertilizer applied.
//! - [`pause`] -- Paused-time accounting from checkpoint intervals.
//! - [`status`] -- The plot state calculator.
//! - [`requirements`] -- Water and weed checkpoint schedules.
//! - [`pests`] -- Pest evaluation for growing and ripe crops.
//! - [`income`] -- Passive pet income settlement.
//! - [`error`] -- Errors for invalid tables and rules.

pub mod catalog;
pub mod error;
pub mod growth;
pub mod income;
pub mod pause;
pub mod pests;
pub mod requirements;
pub mod rules;
pub mod status;

pub use catalog::{
    Catalog, CheckinReward, LotteryReward, PetDefinition, PlotPrice, SeedDefinition,
};
pub use error::FarmError;
pub use growth::Boundaries;
pub use income::{pending_income, settle_pet_income};
pub use pause::{PauseState, pause_state};
pub use requirements::{Requirements, generate_requirements};
pub use rules::{GameRules, GrowthModel, PauseModel, PestModel};
pub use status::{PlotStatus, compute_status, derive_status};
