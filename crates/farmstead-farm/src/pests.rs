//! Pest evaluation for growing and ripe crops.
//!
//! Pests are a once-per-cycle event: after they first appear on a planting,
//! no further rolls happen until the plot is harvested or cleared, even if a
//! pesticide has removed them in the meantime.

use rand::Rng;
use tracing::debug;

use farmstead_types::{Plot, PlotStage};

use crate::rules::{GameRules, PestModel};

/// Evaluate pests on `plot` at `now`.
///
/// `growing_from` is the absolute instant the crop entered the growing
/// stage; time before it never counts toward the pest window. Does nothing
/// unless `stage` is [`PlotStage::Growing`] or [`PlotStage::Ripe`].
pub fn evaluate_pests<R: Rng + ?Sized>(
    plot: &mut Plot,
    stage: PlotStage,
    growing_from: i64,
    now: i64,
    rules: &GameRules,
    rng: &mut R,
) {
    if !matches!(stage, PlotStage::Growing | PlotStage::Ripe) {
        return;
    }
    if plot.pests || plot.pests_occurred {
        plot.last_pest_check_at = Some(now);
        return;
    }

    let appeared = match rules.pest_model {
        PestModel::Probabilistic => {
            let since = plot
                .last_pest_check_at
                .or(plot.planted_at)
                .unwrap_or(now)
                .max(growing_from);
            let window = now.saturating_sub(since).max(0);
            roll_window(window, rules.pest_chance_per_second, rng)
        }
        PestModel::ProtectionWindow => {
            let protected = plot.protected_until.is_some_and(|until| until >= now);
            let exposed_from = plot
                .protected_until
                .map_or(growing_from, |until| until.max(growing_from));
            let exposed = u64::try_from(now.saturating_sub(exposed_from)).unwrap_or(0);
            !protected && exposed >= rules.pest_interval_secs
        }
    };

    plot.last_pest_check_at = Some(now);
    if appeared {
        plot.pests = true;
        plot.pests_occurred = true;
        debug!(plot = plot.index, "pests appeared");
    }
}

/// Probability that at least one of `seconds` independent per-second trials
/// with chance `p` succeeds, as a single Bernoulli draw.
fn roll_window<R: Rng + ?Sized>(seconds: i64, p: f64, rng: &mut R) -> bool {
    if seconds <= 0 || p <= 0.0 {
        return false;
    }
    let exponent = i32::try_from(seconds).unwrap_or(i32::MAX);
    let none = (1.0 - p.min(1.0)).powi(exponent);
    let chance = (1.0 - none).clamp(0.0, 1.0);
    rng.random_bool(chance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use farmstead_types::SeedId;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn growing_plot() -> Plot {
        let mut plot = Plot::new(0, true);
        plot.seed = Some(SeedId(0));
        plot.planted_at = Some(0);
        plot
    }

    fn certain() -> GameRules {
        GameRules {
            pest_chance_per_second: 1.0,
            ..GameRules::default()
        }
    }

    #[test]
    fn early_stages_are_never_evaluated() {
        let mut plot = growing_plot();
        let mut rng = SmallRng::seed_from_u64(1);
        evaluate_pests(&mut plot, PlotStage::Sprout, 60, 70, &certain(), &mut rng);
        assert!(!plot.pests);
        assert_eq!(plot.last_pest_check_at, None);
    }

    #[test]
    fn certain_chance_triggers_and_marks_cycle() {
        let mut plot = growing_plot();
        let mut rng = SmallRng::seed_from_u64(1);
        evaluate_pests(&mut plot, PlotStage::Growing, 60, 70, &certain(), &mut rng);
        assert!(plot.pests);
        assert!(plot.pests_occurred);
        assert_eq!(plot.last_pest_check_at, Some(70));
    }

    #[test]
    fn zero_chance_never_triggers() {
        let rules = GameRules {
            pest_chance_per_second: 0.0,
            ..GameRules::default()
        };
        let mut plot = growing_plot();
        let mut rng = SmallRng::seed_from_u64(1);
        evaluate_pests(&mut plot, PlotStage::Ripe, 60, 10_000, &rules, &mut rng);
        assert!(!plot.pests);
        assert_eq!(plot.last_pest_check_at, Some(10_000));
    }

    #[test]
    fn empty_window_cannot_trigger() {
        let mut plot = growing_plot();
        plot.last_pest_check_at = Some(70);
        let mut rng = SmallRng::seed_from_u64(1);
        evaluate_pests(&mut plot, PlotStage::Growing, 60, 70, &certain(), &mut rng);
        assert!(!plot.pests);
    }

    #[test]
    fn pests_do_not_return_after_pesticide() {
        let mut plot = growing_plot();
        plot.pests_occurred = true;
        let mut rng = SmallRng::seed_from_u64(1);
        evaluate_pests(&mut plot, PlotStage::Ripe, 60, 500, &certain(), &mut rng);
        assert!(!plot.pests);
        assert_eq!(plot.last_pest_check_at, Some(500));
    }

    #[test]
    fn long_windows_almost_surely_trigger() {
        // (1 - 0.004)^5000 is about 2e-9.
        let mut hits = 0_u32;
        for seed in 0..50 {
            let mut plot = growing_plot();
            let mut rng = SmallRng::seed_from_u64(seed);
            evaluate_pests(
                &mut plot,
                PlotStage::Growing,
                0,
                5_000,
                &GameRules::default(),
                &mut rng,
            );
            if plot.pests {
                hits = hits.saturating_add(1);
            }
        }
        assert_eq!(hits, 50);
    }

    #[test]
    fn protection_window_blocks_pests() {
        let rules = GameRules {
            pest_model: PestModel::ProtectionWindow,
            pest_interval_secs: 100,
            ..GameRules::default()
        };
        let mut rng = SmallRng::seed_from_u64(1);

        let mut protected = growing_plot();
        protected.protected_until = Some(1_000);
        evaluate_pests(&mut protected, PlotStage::Growing, 0, 500, &rules, &mut rng);
        assert!(!protected.pests);

        let mut exposed = growing_plot();
        exposed.protected_until = Some(100);
        evaluate_pests(&mut exposed, PlotStage::Growing, 0, 150, &rules, &mut rng);
        assert!(!exposed.pests);
        evaluate_pests(&mut exposed, PlotStage::Growing, 0, 200, &rules, &mut rng);
        assert!(exposed.pests);
    }
}
