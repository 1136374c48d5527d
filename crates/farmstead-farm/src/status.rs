//! The plot state calculator.
//!
//! A plot's stage is never stored as truth. Every read recomputes it from the
//! planting instant and the checkpoint history: pause accounting first, then
//! effective elapsed growth time, then the stage bucket. [`compute_status`]
//! also writes the derived values back onto the plot as a cache for clients
//! and rolls for pests; [`derive_status`] does neither and is what the action
//! validator uses.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::error;

use farmstead_types::{Plot, PlotStage};

use crate::catalog::Catalog;
use crate::growth::Boundaries;
use crate::pause::pause_state;
use crate::pests::evaluate_pests;
use crate::rules::GameRules;

/// Everything derived about a plot at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotStatus {
    /// Current stage.
    pub stage: PlotStage,
    /// A water checkpoint is due and unmet.
    pub needs_water: bool,
    /// A weed checkpoint is due and unmet.
    pub has_weeds: bool,
    /// Pests are present.
    pub has_pests: bool,
    /// Seconds of growth since planting, excluding paused time. Negative
    /// only if the clock is behind the planting instant.
    pub effective_elapsed: i64,
    /// Progress through the current stage, 0 to 100.
    pub progress: u8,
}

impl PlotStatus {
    /// Status of a plot with nothing growing.
    pub const EMPTY: Self = Self {
        stage: PlotStage::Empty,
        needs_water: false,
        has_weeds: false,
        has_pests: false,
        effective_elapsed: 0,
        progress: 0,
    };
}

/// Recompute `plot` at `now`, refresh its cached fields, and roll for pests.
pub fn compute_status<R: Rng + ?Sized>(
    plot: &mut Plot,
    catalog: &Catalog,
    rules: &GameRules,
    now: i64,
    rng: &mut R,
) -> PlotStatus {
    let Some((mut status, growing_from)) = refresh(plot, catalog, rules, now) else {
        return PlotStatus::EMPTY;
    };
    evaluate_pests(plot, status.stage, growing_from, now, rules, rng);
    status.has_pests = plot.pests;
    status
}

/// Recompute a copy of `plot` at `now` without touching the stored plot or
/// rolling for pests.
pub fn derive_status(plot: &Plot, catalog: &Catalog, rules: &GameRules, now: i64) -> PlotStatus {
    let mut scratch = plot.clone();
    refresh(&mut scratch, catalog, rules, now).map_or(PlotStatus::EMPTY, |(status, _)| status)
}

/// Refresh the cached fields of `plot` and return its status together with
/// the absolute instant it entered (or will enter) the growing stage.
///
/// Returns `None` after resetting the caches when nothing valid is planted.
fn refresh(
    plot: &mut Plot,
    catalog: &Catalog,
    rules: &GameRules,
    now: i64,
) -> Option<(PlotStatus, i64)> {
    let (Some(seed_id), Some(planted_at)) = (plot.seed, plot.planted_at) else {
        reset_caches(plot);
        return None;
    };
    let Some(seed) = catalog.seed(seed_id) else {
        error!(plot = plot.index, seed = %seed_id, "plot references unknown seed");
        reset_caches(plot);
        return None;
    };

    let pause = pause_state(plot, now, rules.pause_model);
    plot.paused_seconds = pause.paused_seconds;
    plot.paused_since = pause.paused_since;
    let paused = to_i64(pause.paused_seconds);

    let effective_elapsed = now.saturating_sub(planted_at).saturating_sub(paused);
    let needs_water = any_due(&plot.water, effective_elapsed);
    let has_weeds = any_due(&plot.weeds, effective_elapsed);

    let bounds = Boundaries::for_seed(seed, plot.fertilized, rules);
    let shifted = |offset: u64| planted_at.saturating_add(to_i64(offset)).saturating_add(paused);
    plot.matures_at = Some(shifted(bounds.mature));
    plot.withers_at = Some(shifted(bounds.wither_start));

    let (stage, progress) = if needs_water || has_weeds {
        (PlotStage::Paused, paused_progress(effective_elapsed, &bounds))
    } else {
        bucket(effective_elapsed, &bounds)
    };
    plot.stage = stage;

    let status = PlotStatus {
        stage,
        needs_water,
        has_weeds,
        has_pests: plot.pests,
        effective_elapsed,
        progress,
    };
    Some((status, shifted(bounds.sprout_end)))
}

fn reset_caches(plot: &mut Plot) {
    plot.stage = PlotStage::Empty;
    plot.matures_at = None;
    plot.withers_at = None;
    plot.paused_seconds = 0;
    plot.paused_since = None;
}

fn any_due(list: &[farmstead_types::Checkpoint], effective_elapsed: i64) -> bool {
    list.iter()
        .any(|c| !c.done && to_i64(c.offset) <= effective_elapsed)
}

/// Place `elapsed` into a stage and compute progress within it.
fn bucket(elapsed: i64, b: &Boundaries) -> (PlotStage, u8) {
    let seed_end = to_i64(b.seed_end);
    let sprout_end = to_i64(b.sprout_end);
    let mature = to_i64(b.mature);
    let wither_start = to_i64(b.wither_start);

    if elapsed < 0 {
        (PlotStage::Seed, 0)
    } else if elapsed < seed_end {
        (PlotStage::Seed, percent(elapsed, 0, seed_end))
    } else if elapsed < sprout_end {
        (PlotStage::Sprout, percent(elapsed, seed_end, sprout_end))
    } else if elapsed < mature {
        (PlotStage::Growing, percent(elapsed, sprout_end, mature))
    } else if elapsed < wither_start {
        (PlotStage::Ripe, 100)
    } else {
        (PlotStage::Wither, 0)
    }
}

/// Progress of a paused plot: frozen within the growth stage it paused in,
/// full once past maturity.
fn paused_progress(elapsed: i64, b: &Boundaries) -> u8 {
    match bucket(elapsed, b) {
        (PlotStage::Ripe | PlotStage::Wither, _) => 100,
        (_, progress) => progress,
    }
}

fn percent(value: i64, start: i64, end: i64) -> u8 {
    let span = i128::from(end).saturating_sub(i128::from(start));
    if span <= 0 {
        return 100;
    }
    let done = i128::from(value).saturating_sub(i128::from(start));
    let pct = done.saturating_mul(100).checked_div(span).unwrap_or(0);
    u8::try_from(pct.clamp(0, 100)).unwrap_or(100)
}

fn to_i64(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}
