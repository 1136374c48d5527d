//! Stage boundaries for a seed under the active growth model.

use crate::catalog::SeedDefinition;
use crate::rules::{GameRules, GrowthModel};

/// Effective-time offsets (seconds from planting) at which each stage ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundaries {
    /// End of the seed stage.
    pub seed_end: u64,
    /// End of the sprout stage.
    pub sprout_end: u64,
    /// End of the growing stage; the crop is ripe from here.
    pub mature: u64,
    /// The crop withers from here.
    pub wither_start: u64,
}

impl Boundaries {
    /// Boundaries for `seed`, with the fertilizer reduction applied to the
    /// growth stages (not to the wither grace).
    pub fn for_seed(seed: &SeedDefinition, fertilized: bool, rules: &GameRules) -> Self {
        let [first, second, third] = seed.stages;
        let (b1, b2, b3) = match rules.growth_model {
            GrowthModel::Cumulative => (first, second, third),
            GrowthModel::SummedStages => {
                let b2 = first.saturating_add(second);
                (first, b2, b2.saturating_add(third))
            }
        };
        let scale = |secs: u64| {
            if fertilized {
                rules.fertilized(secs)
            } else {
                secs
            }
        };
        let mature = scale(b3);
        Self {
            seed_end: scale(b1),
            sprout_end: scale(b2),
            mature,
            wither_start: mature.saturating_add(seed.wither_grace),
        }
    }
}

/// Total effective grow time for `seed`.
pub fn total_grow_time(seed: &SeedDefinition, fertilized: bool, rules: &GameRules) -> u64 {
    Boundaries::for_seed(seed, fertilized, rules).mature
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use farmstead_types::SeedId;

    fn wheat() -> SeedDefinition {
        Catalog::standard()
            .seed(SeedId(0))
            .cloned()
            .unwrap_or_else(|| Catalog::standard().seeds.remove(0))
    }

    #[test]
    fn cumulative_boundaries_are_used_directly() {
        let b = Boundaries::for_seed(&wheat(), false, &GameRules::default());
        assert_eq!((b.seed_end, b.sprout_end, b.mature), (30, 60, 90));
        assert_eq!(b.wither_start, 270);
    }

    #[test]
    fn fertilizer_scales_growth_but_not_grace() {
        let b = Boundaries::for_seed(&wheat(), true, &GameRules::default());
        assert_eq!((b.seed_end, b.sprout_end, b.mature), (24, 48, 72));
        assert_eq!(b.wither_start, 72 + 180);
    }

    #[test]
    fn summed_model_accumulates_durations() {
        let rules = GameRules {
            growth_model: GrowthModel::SummedStages,
            ..GameRules::default()
        };
        assert_eq!(total_grow_time(&wheat(), false, &rules), 180);
    }
}
