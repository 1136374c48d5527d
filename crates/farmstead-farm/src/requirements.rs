//! Water and weed checkpoint schedules.
//!
//! Checkpoints divide the effective grow window into equal segments: `k`
//! checkpoints sit at `floor(total * i / (k + 1))` for `i = 1..=k`, so none
//! falls on planting or on maturity itself.

use farmstead_types::Checkpoint;

use crate::catalog::SeedDefinition;
use crate::growth::total_grow_time;
use crate::rules::GameRules;

/// A fresh set of checkpoints for one planting cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Requirements {
    /// Water checkpoints, ordered by offset.
    pub water: Vec<Checkpoint>,
    /// Weed checkpoints, ordered by offset.
    pub weeds: Vec<Checkpoint>,
}

/// Generate the checkpoint schedule for `seed`.
pub fn generate_requirements(
    seed: &SeedDefinition,
    fertilized: bool,
    rules: &GameRules,
) -> Requirements {
    let total = total_grow_time(seed, fertilized, rules);
    Requirements {
        water: evenly_spaced(total, seed.water_count),
        weeds: evenly_spaced(total, seed.weed_count),
    }
}

fn evenly_spaced(total: u64, count: u32) -> Vec<Checkpoint> {
    let segments = u128::from(count).saturating_add(1);
    (1..=count)
        .map(|i| {
            let offset = u128::from(total)
                .saturating_mul(u128::from(i))
                .checked_div(segments)
                .unwrap_or(0);
            Checkpoint::pending(u64::try_from(offset).unwrap_or(u64::MAX).max(1))
        })
        .collect()
}
