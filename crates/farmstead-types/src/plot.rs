//! Farm plots and their care checkpoints.
//!
//! A plot stores only facts: what was planted, when, and when each
//! requirement was satisfied. Everything else (stage, pause totals, maturity
//! and wither instants) is derived by the plot state calculator and cached
//! here for clients. All timestamps are absolute unix seconds.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::PlotStage;
use crate::items::SeedId;

/// Number of plots every farm has.
pub const PLOT_COUNT: usize = 18;

// ---------------------------------------------------------------------------
// Checkpoint
// ---------------------------------------------------------------------------

/// A scheduled water or weed requirement.
///
/// `offset` is measured in effective growth seconds from planting. Once
/// `done_at` has been set it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Checkpoint {
    /// Effective-time offset from planting at which the requirement triggers.
    pub offset: u64,
    /// Whether the requirement has been satisfied.
    pub done: bool,
    /// Absolute time the requirement was satisfied.
    pub done_at: Option<i64>,
}

impl Checkpoint {
    /// A not-yet-satisfied checkpoint at `offset`.
    pub const fn pending(offset: u64) -> Self {
        Self {
            offset,
            done: false,
            done_at: None,
        }
    }

    /// Mark the checkpoint satisfied at `at`.
    ///
    /// Returns `false` and leaves the checkpoint untouched if it was already
    /// completed.
    pub const fn complete(&mut self, at: i64) -> bool {
        if self.done {
            return false;
        }
        self.done = true;
        self.done_at = Some(at);
        true
    }
}

/// The first checkpoint in `list` that has not been completed.
pub fn first_pending(list: &mut [Checkpoint]) -> Option<&mut Checkpoint> {
    list.iter_mut().find(|c| !c.done)
}

// ---------------------------------------------------------------------------
// Plot
// ---------------------------------------------------------------------------

/// A single farm plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Plot {
    /// Position on the farm grid, `0..PLOT_COUNT`.
    pub index: u8,
    /// Whether the player has unlocked this plot.
    pub unlocked: bool,
    /// Planted seed, if any.
    #[ts(type = "string | null")]
    pub seed: Option<SeedId>,
    /// Planting instant.
    pub planted_at: Option<i64>,
    /// Whether fertilizer has been applied this cycle.
    pub fertilized: bool,
    /// Total seconds spent paused, as of the last calculation.
    pub paused_seconds: u64,
    /// Start of the currently open pause, if the plot is paused.
    pub paused_since: Option<i64>,
    /// Water checkpoints, ordered by offset.
    pub water: Vec<Checkpoint>,
    /// Weed checkpoints, ordered by offset.
    pub weeds: Vec<Checkpoint>,
    /// Pests currently present.
    pub pests: bool,
    /// Pests have appeared at least once this cycle. Further pest rolls are
    /// skipped until the plot is harvested or cleared.
    #[serde(default)]
    pub pests_occurred: bool,
    /// Last instant pests were evaluated.
    pub last_pest_check_at: Option<i64>,
    /// Pest protection lasts until this instant.
    #[serde(default)]
    pub protected_until: Option<i64>,
    /// Cached maturity instant.
    pub matures_at: Option<i64>,
    /// Cached wither instant.
    pub withers_at: Option<i64>,
    /// Cached stage label.
    pub stage: PlotStage,
}

impl Plot {
    /// An empty plot at `index`.
    pub const fn new(index: u8, unlocked: bool) -> Self {
        Self {
            index,
            unlocked,
            seed: None,
            planted_at: None,
            fertilized: false,
            paused_seconds: 0,
            paused_since: None,
            water: Vec::new(),
            weeds: Vec::new(),
            pests: false,
            pests_occurred: false,
            last_pest_check_at: None,
            protected_until: None,
            matures_at: None,
            withers_at: None,
            stage: PlotStage::Empty,
        }
    }

    /// Whether something is planted here.
    pub const fn is_planted(&self) -> bool {
        self.seed.is_some() && self.planted_at.is_some()
    }

    /// Reset to an empty plot, keeping only position and unlock state.
    pub fn clear(&mut self) {
        *self = Self::new(self.index, self.unlocked);
    }

    /// All checkpoints, water first.
    pub fn checkpoints(&self) -> impl Iterator<Item = &Checkpoint> {
        self.water.iter().chain(self.weeds.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_completion_is_write_once() {
        let mut cp = Checkpoint::pending(50);
        assert!(cp.complete(61));
        assert!(!cp.complete(99));
        assert_eq!(cp.done_at, Some(61));
    }

    #[test]
    fn first_pending_skips_completed() {
        let mut list = vec![Checkpoint::pending(10), Checkpoint::pending(20)];
        if let Some(first) = list.first_mut() {
            first.complete(12);
        }
        let next = first_pending(&mut list).map(|c| c.offset);
        assert_eq!(next, Some(20));
    }

    #[test]
    fn clear_keeps_index_and_unlock() {
        let mut plot = Plot::new(4, true);
        plot.seed = Some(SeedId(2));
        plot.planted_at = Some(1_000);
        plot.water.push(Checkpoint::pending(30));
        plot.pests = true;
        plot.clear();
        assert_eq!(plot, Plot::new(4, true));
    }

    #[test]
    fn older_documents_without_pest_fields_deserialize() {
        let json = serde_json::json!({
            "index": 0, "unlocked": true, "seed": null, "planted_at": null,
            "fertilized": false, "paused_seconds": 0, "paused_since": null,
            "water": [], "weeds": [], "pests": false, "last_pest_check_at": null,
            "matures_at": null, "withers_at": null, "stage": "empty"
        });
        let plot: Result<Plot, _> = serde_json::from_value(json);
        assert_eq!(plot.ok(), Some(Plot::new(0, true)));
    }
}
