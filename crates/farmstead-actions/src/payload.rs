//! Typed action arguments and their bit-packed ledger encoding.
//!
//! The ledger records every action as `(kind, data)` where `data` is a wide
//! unsigned integer. Arguments are packed into fixed bit slots, least
//! significant first:
//!
//! | Kind | Slots |
//! |------|-------|
//! | `plant` | plot `[0, 16)`, seed tier `[16, 32)` |
//! | `buy_seed`, `sell_fruit` | seed tier `[0, 16)`, count `[16, 48)` |
//! | `buy_fertilizer` | count `[0, 32)` |
//! | `buy_pet` | pet index `[0, 16)` |
//! | `lottery_draw` | count `[0, 16)` |
//! | `checkin` | none |
//! | every other plot action | plot `[0, 16)` |
//!
//! Decoding is strict: a set bit outside the kind's slots is an error.

use serde::{Deserialize, Serialize};

use farmstead_types::{ActionKind, EncodedAction, PetKind, SeedId};

/// A bit slot inside an encoded payload.
#[derive(Debug, Clone, Copy)]
struct Slot {
    shift: u32,
    width: u32,
}

impl Slot {
    const fn new(shift: u32, width: u32) -> Self {
        Self { shift, width }
    }

    fn mask(self) -> u128 {
        let ones = 1_u128
            .checked_shl(self.width)
            .map_or(u128::MAX, |bit| bit.saturating_sub(1));
        ones.checked_shl(self.shift).unwrap_or(0)
    }

    fn put(self, acc: u128, value: u128) -> u128 {
        acc | (value.checked_shl(self.shift).unwrap_or(0) & self.mask())
    }

    fn get(self, raw: u128) -> u128 {
        (raw & self.mask()).checked_shr(self.shift).unwrap_or(0)
    }
}

const PLOT: Slot = Slot::new(0, 16);
const PLANT_SEED: Slot = Slot::new(16, 16);
const TRADE_SEED: Slot = Slot::new(0, 16);
const TRADE_COUNT: Slot = Slot::new(16, 32);
const FERTILIZER_COUNT: Slot = Slot::new(0, 32);
const PET_INDEX: Slot = Slot::new(0, 16);
const DRAW_COUNT: Slot = Slot::new(0, 16);

fn slots(kind: ActionKind) -> &'static [Slot] {
    match kind {
        ActionKind::Plant => &[PLOT, PLANT_SEED],
        ActionKind::BuySeed | ActionKind::SellFruit => &[TRADE_SEED, TRADE_COUNT],
        ActionKind::BuyFertilizer => &[FERTILIZER_COUNT],
        ActionKind::BuyPet => &[PET_INDEX],
        ActionKind::LotteryDraw => &[DRAW_COUNT],
        ActionKind::Checkin => &[],
        ActionKind::Harvest
        | ActionKind::Water
        | ActionKind::Weed
        | ActionKind::Fertilize
        | ActionKind::Shovel
        | ActionKind::Pesticide
        | ActionKind::Protect
        | ActionKind::UnlockPlot => &[PLOT],
    }
}

/// Errors decoding a ledger payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// Bits are set outside the slots defined for the kind.
    #[error("{kind} payload {data} has bits outside its layout")]
    StrayBits {
        /// Action kind.
        kind: ActionKind,
        /// Raw payload.
        data: EncodedAction,
    },

    /// The pet index does not name a pet.
    #[error("unknown pet index {0}")]
    UnknownPet(u16),
}

/// Decoded, typed action arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionPayload {
    /// Plant `seed` on `plot`.
    Plant {
        /// Target plot.
        plot: u16,
        /// Seed to plant.
        seed: SeedId,
    },
    /// Harvest `plot`.
    Harvest {
        /// Target plot.
        plot: u16,
    },
    /// Water `plot`.
    Water {
        /// Target plot.
        plot: u16,
    },
    /// Weed `plot`.
    Weed {
        /// Target plot.
        plot: u16,
    },
    /// Fertilize `plot`.
    Fertilize {
        /// Target plot.
        plot: u16,
    },
    /// Dig up `plot`.
    Shovel {
        /// Target plot.
        plot: u16,
    },
    /// Clear pests from `plot`.
    Pesticide {
        /// Target plot.
        plot: u16,
    },
    /// Protect `plot` from pests.
    Protect {
        /// Target plot.
        plot: u16,
    },
    /// Unlock `plot`.
    UnlockPlot {
        /// Target plot.
        plot: u16,
    },
    /// Buy `count` seeds.
    BuySeed {
        /// Seed to buy.
        seed: SeedId,
        /// How many.
        count: u32,
    },
    /// Sell `count` fruit of `seed`.
    SellFruit {
        /// Fruit tier.
        seed: SeedId,
        /// How many.
        count: u32,
    },
    /// Buy `count` fertilizer.
    BuyFertilizer {
        /// How many.
        count: u32,
    },
    /// Buy a pet.
    BuyPet {
        /// Which pet.
        pet: PetKind,
    },
    /// Daily check-in.
    Checkin,
    /// Draw `count` lottery tickets.
    LotteryDraw {
        /// How many draws.
        count: u16,
    },
}

impl ActionPayload {
    /// The action kind this payload belongs to.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Plant { .. } => ActionKind::Plant,
            Self::Harvest { .. } => ActionKind::Harvest,
            Self::Water { .. } => ActionKind::Water,
            Self::Weed { .. } => ActionKind::Weed,
            Self::Fertilize { .. } => ActionKind::Fertilize,
            Self::Shovel { .. } => ActionKind::Shovel,
            Self::Pesticide { .. } => ActionKind::Pesticide,
            Self::Protect { .. } => ActionKind::Protect,
            Self::UnlockPlot { .. } => ActionKind::UnlockPlot,
            Self::BuySeed { .. } => ActionKind::BuySeed,
            Self::SellFruit { .. } => ActionKind::SellFruit,
            Self::BuyFertilizer { .. } => ActionKind::BuyFertilizer,
            Self::BuyPet { .. } => ActionKind::BuyPet,
            Self::Checkin => ActionKind::Checkin,
            Self::LotteryDraw { .. } => ActionKind::LotteryDraw,
        }
    }

    /// The plot this action targets, if any.
    pub const fn plot(&self) -> Option<u16> {
        match self {
            Self::Plant { plot, .. }
            | Self::Harvest { plot }
            | Self::Water { plot }
            | Self::Weed { plot }
            | Self::Fertilize { plot }
            | Self::Shovel { plot }
            | Self::Pesticide { plot }
            | Self::Protect { plot }
            | Self::UnlockPlot { plot } => Some(*plot),
            _ => None,
        }
    }

    /// Pack the arguments into the ledger integer.
    pub fn encode(&self) -> EncodedAction {
        let raw = match *self {
            Self::Plant { plot, seed } => {
                PLANT_SEED.put(PLOT.put(0, u128::from(plot)), u128::from(seed.tier()))
            }
            Self::Harvest { plot }
            | Self::Water { plot }
            | Self::Weed { plot }
            | Self::Fertilize { plot }
            | Self::Shovel { plot }
            | Self::Pesticide { plot }
            | Self::Protect { plot }
            | Self::UnlockPlot { plot } => PLOT.put(0, u128::from(plot)),
            Self::BuySeed { seed, count } | Self::SellFruit { seed, count } => TRADE_COUNT.put(
                TRADE_SEED.put(0, u128::from(seed.tier())),
                u128::from(count),
            ),
            Self::BuyFertilizer { count } => FERTILIZER_COUNT.put(0, u128::from(count)),
            Self::BuyPet { pet } => PET_INDEX.put(0, u128::from(pet.index())),
            Self::Checkin => 0,
            Self::LotteryDraw { count } => DRAW_COUNT.put(0, u128::from(count)),
        };
        EncodedAction(raw)
    }

    /// Unpack a ledger integer recorded under `kind`.
    pub fn decode(kind: ActionKind, data: EncodedAction) -> Result<Self, PayloadError> {
        let raw = data.value();
        let used = slots(kind).iter().fold(0_u128, |acc, slot| acc | slot.mask());
        if raw & !used != 0 {
            return Err(PayloadError::StrayBits { kind, data });
        }

        // Every slot is at most 32 bits wide, so these conversions cannot fail
        // once the stray-bit check has passed.
        let u16_at = |slot: Slot| u16::try_from(slot.get(raw)).unwrap_or(u16::MAX);
        let u32_at = |slot: Slot| u32::try_from(slot.get(raw)).unwrap_or(u32::MAX);

        let payload = match kind {
            ActionKind::Plant => Self::Plant {
                plot: u16_at(PLOT),
                seed: SeedId(u16_at(PLANT_SEED)),
            },
            ActionKind::Harvest => Self::Harvest { plot: u16_at(PLOT) },
            ActionKind::Water => Self::Water { plot: u16_at(PLOT) },
            ActionKind::Weed => Self::Weed { plot: u16_at(PLOT) },
            ActionKind::Fertilize => Self::Fertilize { plot: u16_at(PLOT) },
            ActionKind::Shovel => Self::Shovel { plot: u16_at(PLOT) },
            ActionKind::Pesticide => Self::Pesticide { plot: u16_at(PLOT) },
            ActionKind::Protect => Self::Protect { plot: u16_at(PLOT) },
            ActionKind::UnlockPlot => Self::UnlockPlot { plot: u16_at(PLOT) },
            ActionKind::BuySeed => Self::BuySeed {
                seed: SeedId(u16_at(TRADE_SEED)),
                count: u32_at(TRADE_COUNT),
            },
            ActionKind::SellFruit => Self::SellFruit {
                seed: SeedId(u16_at(TRADE_SEED)),
                count: u32_at(TRADE_COUNT),
            },
            ActionKind::BuyFertilizer => Self::BuyFertilizer {
                count: u32_at(FERTILIZER_COUNT),
            },
            ActionKind::BuyPet => {
                let index = u16_at(PET_INDEX);
                let pet = PetKind::from_index(index).ok_or(PayloadError::UnknownPet(index))?;
                Self::BuyPet { pet }
            }
            ActionKind::Checkin => Self::Checkin,
            ActionKind::LotteryDraw => Self::LotteryDraw {
                count: u16_at(DRAW_COUNT),
            },
        };
        Ok(payload)
    }
}
