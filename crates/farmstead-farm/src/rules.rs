//! Tunable game rules and the alternate calculation modes.
//!
//! Two generations of the plot rules exist in the wild. The defaults here are
//! the current ones (interval-merge pause accounting, cumulative stage
//! boundaries, probabilistic pests); the older behaviors remain selectable
//! so existing deployments can be reproduced exactly.

use serde::{Deserialize, Serialize};

use crate::error::FarmError;

/// How paused time is accumulated from checkpoint intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseModel {
    /// Merge every triggered interval so overlapping pauses are counted once.
    #[default]
    IntervalMerge,
    /// Sum completed intervals as-is and allow a single open window from the
    /// earliest pending trigger.
    SingleWindow,
}

/// How a seed's three stage values map onto growth boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthModel {
    /// Stage values are cumulative offsets; total grow time is the third.
    #[default]
    Cumulative,
    /// Stage values are durations; boundaries are their running sums.
    SummedStages,
}

/// How pests appear on growing crops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PestModel {
    /// Independent per-second chance over the unevaluated window.
    #[default]
    Probabilistic,
    /// Pests appear once a plot has gone `pest_interval_secs` without
    /// protection.
    ProtectionWindow,
}

/// All tunable rule values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    /// Pause accounting mode.
    #[serde(default)]
    pub pause_model: PauseModel,
    /// Growth boundary mode.
    #[serde(default)]
    pub growth_model: GrowthModel,
    /// Pest mode.
    #[serde(default)]
    pub pest_model: PestModel,
    /// Fertilized crops grow in this percentage of the normal time.
    #[serde(default = "default_fertilizer_percent")]
    pub fertilizer_percent: u8,
    /// Per-second pest probability under [`PestModel::Probabilistic`].
    #[serde(default = "default_pest_chance")]
    pub pest_chance_per_second: f64,
    /// Unprotected seconds before pests appear under
    /// [`PestModel::ProtectionWindow`].
    #[serde(default = "default_pest_interval")]
    pub pest_interval_secs: u64,
    /// Duration of a protect action.
    #[serde(default = "default_protection_secs")]
    pub protection_secs: u64,
    /// Pet income accrues for at most this many hours between reads.
    #[serde(default = "default_income_cap_hours")]
    pub pet_income_cap_hours: u32,
    /// Chance in percent that a harvest drops a letter token.
    #[serde(default = "default_letter_drop_percent")]
    pub letter_drop_percent: u8,
    /// Largest count accepted by a single shop purchase.
    #[serde(default = "default_max_purchase")]
    pub max_purchase_count: u32,
    /// Most lottery draws per action.
    #[serde(default = "default_max_draws")]
    pub max_lottery_draws: u32,
}

const fn default_fertilizer_percent() -> u8 {
    80
}

const fn default_pest_chance() -> f64 {
    0.004
}

const fn default_pest_interval() -> u64 {
    3600
}

const fn default_protection_secs() -> u64 {
    86_400
}

const fn default_income_cap_hours() -> u32 {
    24
}

const fn default_letter_drop_percent() -> u8 {
    50
}

const fn default_max_purchase() -> u32 {
    999
}

const fn default_max_draws() -> u32 {
    10
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            pause_model: PauseModel::default(),
            growth_model: GrowthModel::default(),
            pest_model: PestModel::default(),
            fertilizer_percent: default_fertilizer_percent(),
            pest_chance_per_second: default_pest_chance(),
            pest_interval_secs: default_pest_interval(),
            protection_secs: default_protection_secs(),
            pet_income_cap_hours: default_income_cap_hours(),
            letter_drop_percent: default_letter_drop_percent(),
            max_purchase_count: default_max_purchase(),
            max_lottery_draws: default_max_draws(),
        }
    }
}

impl GameRules {
    /// Reject values that would make the calculators misbehave.
    pub fn validate(&self) -> Result<(), FarmError> {
        if self.fertilizer_percent == 0 || self.fertilizer_percent > 100 {
            return Err(FarmError::InvalidRules(format!(
                "fertilizer_percent must be in 1..=100, got {}",
                self.fertilizer_percent
            )));
        }
        if !(0.0..=1.0).contains(&self.pest_chance_per_second) {
            return Err(FarmError::InvalidRules(format!(
                "pest_chance_per_second must be in [0, 1], got {}",
                self.pest_chance_per_second
            )));
        }
        if self.letter_drop_percent > 100 {
            return Err(FarmError::InvalidRules(format!(
                "letter_drop_percent must be at most 100, got {}",
                self.letter_drop_percent
            )));
        }
        if self.max_purchase_count == 0 || self.max_lottery_draws == 0 {
            return Err(FarmError::InvalidRules(
                "purchase and draw limits must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Scale a duration by the fertilizer percentage, flooring.
    pub fn fertilized(&self, secs: u64) -> u64 {
        let scaled = u128::from(secs).saturating_mul(u128::from(self.fertilizer_percent)) / 100;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}
