//! Static game tables: seeds, pets, plot prices, levels, and reward odds.
//!
//! The [`Catalog`] is built once at startup (either [`Catalog::standard`] or
//! deserialized from configuration), checked with [`Catalog::validate`], and
//! passed by reference into every calculation. Nothing in this crate reads a
//! global table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use farmstead_types::{PetKind, SeedId};

use crate::error::FarmError;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A plantable crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedDefinition {
    /// Seed identifier.
    pub id: SeedId,
    /// Display name.
    pub name: String,
    /// Shop price in coins.
    pub cost: u64,
    /// Coins received for selling one fruit.
    pub sell_price: u64,
    /// Experience granted on harvest.
    pub exp: u64,
    /// Three stage values in seconds. Under the cumulative growth model these
    /// are the offsets from planting at which the seed, sprout, and growing
    /// stages end; under the summed model they are the stage durations.
    pub stages: [u64; 3],
    /// Seconds a ripe crop survives before withering.
    pub wither_grace: u64,
    /// Number of water checkpoints per planting.
    pub water_count: u32,
    /// Number of weed checkpoints per planting.
    pub weed_count: u32,
}

/// A purchasable pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetDefinition {
    /// Pet kind.
    pub kind: PetKind,
    /// Display name.
    pub name: String,
    /// Price in coins.
    pub price: u64,
    /// Passive income in coins per hour.
    pub coins_per_hour: Decimal,
}

/// Unlock requirements for one plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotPrice {
    /// Coins charged on unlock.
    pub cost: u64,
    /// Minimum player level.
    pub level: u32,
}

/// One weighted entry of the lottery table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryReward {
    /// Seed awarded.
    pub seed: SeedId,
    /// Relative weight.
    pub weight: u32,
    /// Minimum seeds awarded.
    pub min: u32,
    /// Maximum seeds awarded, inclusive.
    pub max: u32,
}

/// One weighted entry of the daily check-in table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinReward {
    /// Relative weight.
    pub weight: u32,
    /// Minimum coins awarded.
    pub min_coins: u64,
    /// Maximum coins awarded, inclusive.
    pub max_coins: u64,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Every static table the game rules consult.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Seed definitions.
    pub seeds: Vec<SeedDefinition>,
    /// Pet definitions.
    pub pets: Vec<PetDefinition>,
    /// Unlock price for each plot, by plot index.
    pub plot_prices: Vec<PlotPrice>,
    /// Cumulative experience required for each level. Entry `n` is the
    /// threshold for level `n + 1`.
    pub level_thresholds: Vec<u64>,
    /// Lottery reward table.
    pub lottery: Vec<LotteryReward>,
    /// Daily check-in reward table.
    pub checkin: Vec<CheckinReward>,
    /// Price of one fertilizer in coins.
    pub fertilizer_price: u64,
}

impl Catalog {
    /// Look up a seed definition.
    pub fn seed(&self, id: SeedId) -> Option<&SeedDefinition> {
        self.seeds.iter().find(|s| s.id == id)
    }

    /// Look up a pet definition.
    pub fn pet(&self, kind: PetKind) -> Option<&PetDefinition> {
        self.pets.iter().find(|p| p.kind == kind)
    }

    /// Unlock requirements for the plot at `index`.
    pub fn plot_price(&self, index: u16) -> Option<PlotPrice> {
        self.plot_prices.get(usize::from(index)).copied()
    }

    /// Level reached with `exp` cumulative experience. Never below 1.
    pub fn level_for_exp(&self, exp: u64) -> u32 {
        let reached = self
            .level_thresholds
            .iter()
            .take_while(|threshold| exp >= **threshold)
            .count();
        u32::try_from(reached).unwrap_or(u32::MAX).max(1)
    }

    /// Check the structural invariants every calculation relies on.
    pub fn validate(&self) -> Result<(), FarmError> {
        for seed in &self.seeds {
            let [b1, b2, b3] = seed.stages;
            if b1 == 0 || b1 >= b2 || b2 >= b3 {
                return Err(FarmError::InvalidCatalog(format!(
                    "{}: stage boundaries must be positive and strictly increasing, got {:?}",
                    seed.id, seed.stages
                )));
            }
        }
        if self.plot_prices.len() != farmstead_types::PLOT_COUNT {
            return Err(FarmError::InvalidCatalog(format!(
                "expected {} plot prices, got {}",
                farmstead_types::PLOT_COUNT,
                self.plot_prices.len()
            )));
        }
        if !self.level_thresholds.windows(2).all(|w| w.first() < w.get(1)) {
            return Err(FarmError::InvalidCatalog(
                "level thresholds must be strictly increasing".to_owned(),
            ));
        }
        for reward in &self.lottery {
            if reward.min > reward.max || self.seed(reward.seed).is_none() {
                return Err(FarmError::InvalidCatalog(format!(
                    "bad lottery entry for {}",
                    reward.seed
                )));
            }
        }
        if self.checkin.iter().any(|r| r.min_coins > r.max_coins) {
            return Err(FarmError::InvalidCatalog(
                "check-in reward with min above max".to_owned(),
            ));
        }
        Ok(())
    }

    /// The standard game tables.
    pub fn standard() -> Self {
        Self {
            seeds: standard_seeds(),
            pets: standard_pets(),
            plot_prices: STANDARD_PLOT_PRICES
                .iter()
                .map(|&(cost, level)| PlotPrice { cost, level })
                .collect(),
            level_thresholds: STANDARD_LEVELS.to_vec(),
            lottery: STANDARD_LOTTERY
                .iter()
                .map(|&(tier, weight, min, max)| LotteryReward {
                    seed: SeedId(tier),
                    weight,
                    min,
                    max,
                })
                .collect(),
            checkin: STANDARD_CHECKIN
                .iter()
                .map(|&(weight, min_coins, max_coins)| CheckinReward {
                    weight,
                    min_coins,
                    max_coins,
                })
                .collect(),
            fertilizer_price: 50,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Standard tables
// ---------------------------------------------------------------------------

/// (name, cost, sell price, exp, stages, wither grace, water, weeds)
type SeedRow = (&'static str, u64, u64, u64, [u64; 3], u64, u32, u32);

const STANDARD_SEEDS: [SeedRow; 10] = [
    ("Wheat", 10, 25, 5, [30, 60, 90], 180, 1, 1),
    ("Carrot", 20, 50, 8, [60, 120, 180], 300, 2, 1),
    ("Corn", 50, 120, 15, [180, 300, 420], 600, 2, 2),
    ("Tomato", 80, 200, 25, [300, 600, 900], 900, 3, 2),
    ("Watermelon", 150, 400, 40, [600, 1200, 1800], 1800, 3, 3),
    ("Strawberry", 250, 700, 60, [900, 1800, 2700], 3600, 4, 3),
    ("Pumpkin", 400, 1100, 90, [1800, 3600, 5400], 7200, 4, 4),
    ("Grape", 600, 1700, 130, [3600, 7200, 10800], 10800, 5, 4),
    ("Dragon Fruit", 1000, 3000, 200, [7200, 14400, 21600], 21600, 6, 5),
    ("Golden Corn", 1500, 5000, 300, [14400, 28800, 43200], 43200, 7, 6),
];

const STANDARD_PLOT_PRICES: [(u64, u32); 18] = [
    (0, 1),
    (100, 1),
    (150, 2),
    (250, 3),
    (400, 4),
    (600, 5),
    (900, 6),
    (1300, 7),
    (1800, 8),
    (2500, 9),
    (3300, 10),
    (4200, 11),
    (5500, 12),
    (7000, 13),
    (9000, 14),
    (11500, 15),
    (14500, 16),
    (18000, 17),
];

const STANDARD_LEVELS: [u64; 20] = [
    0, 100, 250, 450, 700, 1000, 1350, 1750, 2200, 2700, 3250, 3850, 4500, 5200, 5950, 6750, 7600,
    8500, 9450, 10450,
];

/// (seed tier, weight per mille, min, max)
const STANDARD_LOTTERY: [(u16, u32, u32, u32); 10] = [
    (0, 250, 3, 5),
    (1, 150, 2, 4),
    (2, 200, 2, 3),
    (3, 100, 1, 2),
    (4, 120, 1, 2),
    (5, 80, 1, 1),
    (6, 50, 1, 1),
    (7, 30, 1, 1),
    (8, 15, 1, 1),
    (9, 5, 1, 1),
];

/// (weight per mille, min coins, max coins)
const STANDARD_CHECKIN: [(u32, u64, u64); 4] = [
    (500, 50, 100),
    (300, 100, 200),
    (150, 200, 400),
    (50, 400, 800),
];

fn standard_seeds() -> Vec<SeedDefinition> {
    STANDARD_SEEDS
        .iter()
        .zip(0_u16..)
        .map(
            |(&(name, cost, sell_price, exp, stages, wither_grace, water_count, weed_count), tier)| {
                SeedDefinition {
                    id: SeedId(tier),
                    name: name.to_owned(),
                    cost,
                    sell_price,
                    exp,
                    stages,
                    wither_grace,
                    water_count,
                    weed_count,
                }
            },
        )
        .collect()
}

fn standard_pets() -> Vec<PetDefinition> {
    // Rates are stored with six decimal places.
    [
        (PetKind::Chick, "Chick", 100, 46_296),
        (PetKind::Rabbit, "Rabbit", 500, 231_481),
        (PetKind::Dog, "Dog", 2000, 925_926),
        (PetKind::Fox, "Fox", 5000, 2_314_815),
        (PetKind::Panda, "Panda", 10_000, 4_629_630),
    ]
    .into_iter()
    .map(|(kind, name, price, micro_rate)| PetDefinition {
        kind,
        name: name.to_owned(),
        price,
        coins_per_hour: Decimal::new(micro_rate, 6),
    })
    .collect()
}
