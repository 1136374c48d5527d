//! Enumeration types shared between the calculator, validator, reconciler,
//! and clients.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ParseError;

// ---------------------------------------------------------------------------
// Plot stage
// ---------------------------------------------------------------------------

/// Derived growth stage of a plot.
///
/// Never authoritative on its own: it is recomputed from stored timestamps
/// on every read and only cached on the plot for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum PlotStage {
    /// Nothing planted, or the planted seed is unknown.
    #[default]
    Empty,
    /// Freshly planted.
    Seed,
    /// First visible growth.
    Sprout,
    /// Main growth stage. Pests may appear from here on.
    Growing,
    /// Ready to harvest.
    Ripe,
    /// Left too long after ripening.
    Wither,
    /// Growth frozen by an unmet water or weed requirement.
    Paused,
}

impl PlotStage {
    /// Upper-case label used in log lines and rejection reasons.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::Seed => "SEED",
            Self::Sprout => "SPROUT",
            Self::Growing => "GROWING",
            Self::Ripe => "RIPE",
            Self::Wither => "WITHER",
            Self::Paused => "PAUSED",
        }
    }
}

impl fmt::Display for PlotStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Action kind
// ---------------------------------------------------------------------------

/// Every action a player can record on the ledger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// Plant a seed from inventory on an empty plot.
    Plant,
    /// Harvest a ripe plot.
    Harvest,
    /// Satisfy the next water checkpoint.
    Water,
    /// Satisfy the next weed checkpoint.
    Weed,
    /// Apply fertilizer, compressing the growth schedule.
    Fertilize,
    /// Dig up whatever is planted.
    Shovel,
    /// Clear pests from a plot.
    Pesticide,
    /// Protect a plot from pests for a fixed window.
    Protect,
    /// Buy seeds with coins.
    BuySeed,
    /// Buy fertilizer with coins.
    BuyFertilizer,
    /// Sell harvested fruit for coins.
    SellFruit,
    /// Unlock the next farm plot.
    UnlockPlot,
    /// Buy a passive-income pet.
    BuyPet,
    /// Daily check-in reward.
    Checkin,
    /// Spend lottery tickets on seed draws.
    LotteryDraw,
}

impl ActionKind {
    /// All action kinds.
    pub const ALL: [Self; 15] = [
        Self::Plant,
        Self::Harvest,
        Self::Water,
        Self::Weed,
        Self::Fertilize,
        Self::Shovel,
        Self::Pesticide,
        Self::Protect,
        Self::BuySeed,
        Self::BuyFertilizer,
        Self::SellFruit,
        Self::UnlockPlot,
        Self::BuyPet,
        Self::Checkin,
        Self::LotteryDraw,
    ];

    /// Snake-case name, identical to the serialized form and to the action
    /// type string recorded on the ledger.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plant => "plant",
            Self::Harvest => "harvest",
            Self::Water => "water",
            Self::Weed => "weed",
            Self::Fertilize => "fertilize",
            Self::Shovel => "shovel",
            Self::Pesticide => "pesticide",
            Self::Protect => "protect",
            Self::BuySeed => "buy_seed",
            Self::BuyFertilizer => "buy_fertilizer",
            Self::SellFruit => "sell_fruit",
            Self::UnlockPlot => "unlock_plot",
            Self::BuyPet => "buy_pet",
            Self::Checkin => "checkin",
            Self::LotteryDraw => "lottery_draw",
        }
    }

    /// Whether the action targets a single plot by index.
    pub const fn targets_plot(self) -> bool {
        matches!(
            self,
            Self::Plant
                | Self::Harvest
                | Self::Water
                | Self::Weed
                | Self::Fertilize
                | Self::Shovel
                | Self::Pesticide
                | Self::Protect
                | Self::UnlockPlot
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseError::ActionKind(s.to_owned()))
    }
}
