//! Action validation.
//!
//! Validation runs before a voucher is signed, against a freshly loaded user
//! document. Stage-dependent checks never trust the cached plot stage: they
//! recompute it with [`derive_status`], which leaves the document unchanged
//! and never rolls for pests.
//!
//! On success the arguments are returned in their packed ledger form.

use chrono::{DateTime, NaiveDate, Utc};

use farmstead_farm::{Catalog, GameRules, PlotStatus, derive_status, pending_income};
use farmstead_types::{EncodedAction, ItemId, PetKind, Plot, PlotStage, SeedId, UserDocument};

use crate::payload::ActionPayload;

/// Tables, rules, and the instant validation runs at.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Static game tables.
    pub catalog: &'a Catalog,
    /// Tunable rules.
    pub rules: &'a GameRules,
    /// Current time.
    pub now: DateTime<Utc>,
}

/// Why an action was rejected. The message is shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Plot index beyond the farm.
    #[error("plot {0} does not exist")]
    PlotOutOfRange(u16),

    /// Plot has not been unlocked.
    #[error("plot {0} is locked")]
    PlotLocked(u16),

    /// Plot is already unlocked.
    #[error("plot {0} is already unlocked")]
    PlotAlreadyUnlocked(u16),

    /// Something is already growing on the plot.
    #[error("plot {0} is already planted")]
    PlotOccupied(u16),

    /// Nothing is planted on the plot.
    #[error("plot {0} has nothing planted")]
    PlotEmpty(u16),

    /// Seed not in the catalog.
    #[error("unknown seed {0}")]
    UnknownSeed(SeedId),

    /// Pet not in the catalog.
    #[error("unknown pet {0}")]
    UnknownPet(PetKind),

    /// Not enough of an inventory item.
    #[error("not enough {item}: need {needed}, have {held}")]
    MissingItem {
        /// Item required.
        item: ItemId,
        /// Amount required.
        needed: u32,
        /// Amount held.
        held: u32,
    },

    /// Harvest attempted before the crop is ripe.
    #[error("crop is not ripe, current stage: {stage}")]
    NotRipe {
        /// Freshly computed stage.
        stage: PlotStage,
    },

    /// No water checkpoint is due.
    #[error("plot {0} does not need water")]
    NoWaterNeeded(u16),

    /// No weed checkpoint is due.
    #[error("plot {0} has no weeds")]
    NoWeeds(u16),

    /// No pests on the plot.
    #[error("plot {0} has no pests")]
    NoPests(u16),

    /// Fertilizer already applied this cycle.
    #[error("plot {0} is already fertilized")]
    AlreadyFertilized(u16),

    /// Not enough coins.
    #[error("not enough coins: need {needed}, have {held}")]
    InsufficientCoins {
        /// Coins required.
        needed: u64,
        /// Coins held.
        held: u64,
    },

    /// Count outside the accepted range.
    #[error("count must be between 1 and {max}, got {count}")]
    InvalidCount {
        /// Requested count.
        count: u32,
        /// Largest accepted count.
        max: u32,
    },

    /// Player level below the plot's requirement.
    #[error("plot {plot} requires level {required}, current level is {level}")]
    LevelTooLow {
        /// Target plot.
        plot: u16,
        /// Required level.
        required: u32,
        /// Current level.
        level: u32,
    },

    /// Pet already owned.
    #[error("already own a {0}")]
    PetOwned(PetKind),

    /// Already checked in on this UTC date.
    #[error("already checked in on {0}")]
    AlreadyCheckedIn(NaiveDate),

    /// Not enough lottery tickets.
    #[error("not enough tickets: need {needed}, have {held}")]
    NotEnoughTickets {
        /// Tickets required.
        needed: u32,
        /// Tickets held.
        held: u32,
    },
}

/// Check `payload` against `user` and return its packed form.
pub fn validate_action(
    user: &UserDocument,
    payload: &ActionPayload,
    ctx: &ValidationContext<'_>,
) -> Result<EncodedAction, ValidationError> {
    match *payload {
        ActionPayload::Plant { plot, seed } => validate_plant(user, plot, seed, ctx)?,
        ActionPayload::Harvest { plot } => {
            let status = fresh_status(planted_plot(user, plot)?, ctx);
            if status.stage != PlotStage::Ripe {
                return Err(ValidationError::NotRipe {
                    stage: status.stage,
                });
            }
        }
        ActionPayload::Water { plot } => {
            if !fresh_status(planted_plot(user, plot)?, ctx).needs_water {
                return Err(ValidationError::NoWaterNeeded(plot));
            }
        }
        ActionPayload::Weed { plot } => {
            if !fresh_status(planted_plot(user, plot)?, ctx).has_weeds {
                return Err(ValidationError::NoWeeds(plot));
            }
        }
        ActionPayload::Pesticide { plot } => {
            if !fresh_status(planted_plot(user, plot)?, ctx).has_pests {
                return Err(ValidationError::NoPests(plot));
            }
        }
        ActionPayload::Fertilize { plot } => {
            require_item(user, ItemId::Fertilizer, 1)?;
            if planted_plot(user, plot)?.fertilized {
                return Err(ValidationError::AlreadyFertilized(plot));
            }
        }
        ActionPayload::Shovel { plot } | ActionPayload::Protect { plot } => {
            planted_plot(user, plot)?;
        }
        ActionPayload::UnlockPlot { plot } => validate_unlock(user, plot, ctx)?,
        ActionPayload::BuySeed { seed, count } => {
            check_count(count, ctx.rules.max_purchase_count)?;
            let def = ctx
                .catalog
                .seed(seed)
                .ok_or(ValidationError::UnknownSeed(seed))?;
            require_coins(user.coins, def.cost.saturating_mul(u64::from(count)))?;
        }
        ActionPayload::BuyFertilizer { count } => {
            check_count(count, ctx.rules.max_purchase_count)?;
            let cost = ctx.catalog.fertilizer_price.saturating_mul(u64::from(count));
            require_coins(user.coins, cost)?;
        }
        ActionPayload::SellFruit { seed, count } => {
            check_count(count, u32::MAX)?;
            if ctx.catalog.seed(seed).is_none() {
                return Err(ValidationError::UnknownSeed(seed));
            }
            require_item(user, ItemId::Fruit(seed), count)?;
        }
        ActionPayload::BuyPet { pet } => {
            if user.pets.contains(&pet) {
                return Err(ValidationError::PetOwned(pet));
            }
            let def = ctx.catalog.pet(pet).ok_or(ValidationError::UnknownPet(pet))?;
            let income = pending_income(user, ctx.catalog, ctx.rules, ctx.now);
            require_coins(user.coins.saturating_add(income), def.price)?;
        }
        ActionPayload::Checkin => {
            let today = ctx.now.date_naive();
            if user.last_checkin_date == Some(today) {
                return Err(ValidationError::AlreadyCheckedIn(today));
            }
        }
        ActionPayload::LotteryDraw { count } => {
            check_count(u32::from(count), ctx.rules.max_lottery_draws)?;
            let needed = u32::from(count);
            if user.tickets < needed {
                return Err(ValidationError::NotEnoughTickets {
                    needed,
                    held: user.tickets,
                });
            }
        }
    }
    Ok(payload.encode())
}

// ---------------------------------------------------------------------------
// Per-kind checks
// ---------------------------------------------------------------------------

fn validate_plant(
    user: &UserDocument,
    plot: u16,
    seed: SeedId,
    ctx: &ValidationContext<'_>,
) -> Result<(), ValidationError> {
    let target = unlocked_plot(user, plot)?;
    if target.is_planted() {
        return Err(ValidationError::PlotOccupied(plot));
    }
    if ctx.catalog.seed(seed).is_none() {
        return Err(ValidationError::UnknownSeed(seed));
    }
    require_item(user, ItemId::Seed(seed), 1)
}

fn validate_unlock(
    user: &UserDocument,
    plot: u16,
    ctx: &ValidationContext<'_>,
) -> Result<(), ValidationError> {
    let target = user.plot(plot).ok_or(ValidationError::PlotOutOfRange(plot))?;
    if target.unlocked {
        return Err(ValidationError::PlotAlreadyUnlocked(plot));
    }
    let price = ctx
        .catalog
        .plot_price(plot)
        .ok_or(ValidationError::PlotOutOfRange(plot))?;
    if user.level < price.level {
        return Err(ValidationError::LevelTooLow {
            plot,
            required: price.level,
            level: user.level,
        });
    }
    require_coins(user.coins, price.cost)
}

// ---------------------------------------------------------------------------
// Shared checks
// ---------------------------------------------------------------------------

fn fresh_status(plot: &Plot, ctx: &ValidationContext<'_>) -> PlotStatus {
    derive_status(plot, ctx.catalog, ctx.rules, ctx.now.timestamp())
}

fn unlocked_plot(user: &UserDocument, index: u16) -> Result<&Plot, ValidationError> {
    let plot = user
        .plot(index)
        .ok_or(ValidationError::PlotOutOfRange(index))?;
    if !plot.unlocked {
        return Err(ValidationError::PlotLocked(index));
    }
    Ok(plot)
}

fn planted_plot(user: &UserDocument, index: u16) -> Result<&Plot, ValidationError> {
    let plot = unlocked_plot(user, index)?;
    if !plot.is_planted() {
        return Err(ValidationError::PlotEmpty(index));
    }
    Ok(plot)
}

fn require_item(user: &UserDocument, item: ItemId, needed: u32) -> Result<(), ValidationError> {
    let held = user.inventory.count(item);
    if held < needed {
        return Err(ValidationError::MissingItem { item, needed, held });
    }
    Ok(())
}

const fn require_coins(held: u64, needed: u64) -> Result<(), ValidationError> {
    if held < needed {
        return Err(ValidationError::InsufficientCoins { needed, held });
    }
    Ok(())
}

const fn check_count(count: u32, max: u32) -> Result<(), ValidationError> {
    if count == 0 || count > max {
        return Err(ValidationError::InvalidCount { count, max });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use farmstead_farm::generate_requirements;
    use farmstead_types::WalletAddress;

    fn user() -> UserDocument {
        let wallet = WalletAddress::parse("0x2222222222222222222222222222222222222222").unwrap();
        UserDocument::new(wallet, Utc.timestamp_opt(0, 0).unwrap())
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    /// Wheat planted on plot 0 at `t = 1000` with its normal schedule.
    fn with_wheat(catalog: &Catalog, rules: &GameRules) -> UserDocument {
        let mut user = user();
        let seed = catalog.seed(SeedId(0)).unwrap();
        let req = generate_requirements(seed, false, rules);
        let plot = user.plot_mut(0).unwrap();
        plot.seed = Some(SeedId(0));
        plot.planted_at = Some(1000);
        plot.water = req.water;
        plot.weeds = req.weeds;
        user
    }

    fn complete_all(plot: &mut Plot, at: i64) {
        for cp in plot.water.iter_mut().chain(plot.weeds.iter_mut()) {
            cp.complete(at);
        }
    }

    #[test]
    fn plant_requires_unlocked_empty_plot_and_seed() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let ctx = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(1000),
        };
        let user = user();

        let ok = validate_action(&user, &ActionPayload::Plant { plot: 0, seed: SeedId(0) }, &ctx);
        assert_eq!(ok, Ok(EncodedAction(0)));

        let locked = validate_action(&user, &ActionPayload::Plant { plot: 1, seed: SeedId(0) }, &ctx);
        assert_eq!(locked, Err(ValidationError::PlotLocked(1)));

        let missing =
            validate_action(&user, &ActionPayload::Plant { plot: 0, seed: SeedId(1) }, &ctx);
        assert!(matches!(missing, Err(ValidationError::MissingItem { .. })));

        let range = validate_action(&user, &ActionPayload::Plant { plot: 18, seed: SeedId(0) }, &ctx);
        assert_eq!(range, Err(ValidationError::PlotOutOfRange(18)));

        let unknown =
            validate_action(&user, &ActionPayload::Plant { plot: 0, seed: SeedId(77) }, &ctx);
        assert_eq!(unknown, Err(ValidationError::UnknownSeed(SeedId(77))));
    }

    #[test]
    fn harvest_rejects_growing_and_accepts_ripe() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let mut user = with_wheat(&catalog, &rules);
        complete_all(user.plot_mut(0).unwrap(), 1000);

        let growing = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(1070),
        };
        let err = validate_action(&user, &ActionPayload::Harvest { plot: 0 }, &growing);
        assert_eq!(
            err,
            Err(ValidationError::NotRipe {
                stage: PlotStage::Growing
            })
        );
        assert!(
            err.unwrap_err()
                .to_string()
                .contains("not ripe, current stage: GROWING")
        );

        let ripe = ValidationContext {
            now: at(1100),
            ..growing
        };
        assert!(validate_action(&user, &ActionPayload::Harvest { plot: 0 }, &ripe).is_ok());
    }

    #[test]
    fn harvest_ignores_stale_cached_stage() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let mut user = with_wheat(&catalog, &rules);
        let plot = user.plot_mut(0).unwrap();
        complete_all(plot, 1000);
        plot.stage = PlotStage::Ripe;
        let ctx = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(1010),
        };
        assert!(validate_action(&user, &ActionPayload::Harvest { plot: 0 }, &ctx).is_err());
    }

    #[test]
    fn water_requires_due_checkpoint() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let user = with_wheat(&catalog, &rules);
        let early = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(1010),
        };
        assert_eq!(
            validate_action(&user, &ActionPayload::Water { plot: 0 }, &early),
            Err(ValidationError::NoWaterNeeded(0))
        );
        let due = ValidationContext {
            now: at(1050),
            ..early
        };
        assert!(validate_action(&user, &ActionPayload::Water { plot: 0 }, &due).is_ok());
        assert!(validate_action(&user, &ActionPayload::Weed { plot: 0 }, &due).is_ok());
    }

    #[test]
    fn fertilize_needs_item_and_unfertilized_plot() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let mut user = with_wheat(&catalog, &rules);
        let ctx = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(1010),
        };
        assert!(matches!(
            validate_action(&user, &ActionPayload::Fertilize { plot: 0 }, &ctx),
            Err(ValidationError::MissingItem { item: ItemId::Fertilizer, .. })
        ));
        user.inventory.add(ItemId::Fertilizer, 1);
        assert!(validate_action(&user, &ActionPayload::Fertilize { plot: 0 }, &ctx).is_ok());
        user.plot_mut(0).unwrap().fertilized = true;
        assert_eq!(
            validate_action(&user, &ActionPayload::Fertilize { plot: 0 }, &ctx),
            Err(ValidationError::AlreadyFertilized(0))
        );
    }

    #[test]
    fn shop_checks_counts_and_coins() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let ctx = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(0),
        };
        let user = user();
        let buy = |seed, count| ActionPayload::BuySeed { seed, count };

        assert_eq!(
            validate_action(&user, &buy(SeedId(2), 3), &ctx),
            Ok(EncodedAction(2 | (3 << 16)))
        );
        assert_eq!(
            validate_action(&user, &buy(SeedId(2), 0), &ctx),
            Err(ValidationError::InvalidCount { count: 0, max: 999 })
        );
        assert_eq!(
            validate_action(&user, &buy(SeedId(9), 1), &ctx),
            Err(ValidationError::InsufficientCoins {
                needed: 1500,
                held: 1000
            })
        );
        assert!(
            validate_action(&user, &ActionPayload::BuyFertilizer { count: 20 }, &ctx).is_ok()
        );
        assert!(
            validate_action(&user, &ActionPayload::BuyFertilizer { count: 21 }, &ctx).is_err()
        );
    }

    #[test]
    fn sell_requires_fruit() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let ctx = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(0),
        };
        let mut user = user();
        let sell = ActionPayload::SellFruit {
            seed: SeedId(1),
            count: 2,
        };
        assert!(validate_action(&user, &sell, &ctx).is_err());
        user.inventory.add(ItemId::Fruit(SeedId(1)), 2);
        assert!(validate_action(&user, &sell, &ctx).is_ok());
    }

    #[test]
    fn unlock_checks_level_and_price() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let ctx = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(0),
        };
        let mut user = user();
        assert!(validate_action(&user, &ActionPayload::UnlockPlot { plot: 1 }, &ctx).is_ok());
        assert_eq!(
            validate_action(&user, &ActionPayload::UnlockPlot { plot: 0 }, &ctx),
            Err(ValidationError::PlotAlreadyUnlocked(0))
        );
        assert_eq!(
            validate_action(&user, &ActionPayload::UnlockPlot { plot: 2 }, &ctx),
            Err(ValidationError::LevelTooLow {
                plot: 2,
                required: 2,
                level: 1
            })
        );
        user.coins = 50;
        assert!(matches!(
            validate_action(&user, &ActionPayload::UnlockPlot { plot: 1 }, &ctx),
            Err(ValidationError::InsufficientCoins { .. })
        ));
    }

    #[test]
    fn pets_cannot_be_bought_twice() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let ctx = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(0),
        };
        let mut user = user();
        let buy = ActionPayload::BuyPet { pet: PetKind::Rabbit };
        assert_eq!(validate_action(&user, &buy, &ctx), Ok(EncodedAction(1)));
        user.pets.insert(PetKind::Rabbit);
        assert_eq!(
            validate_action(&user, &buy, &ctx),
            Err(ValidationError::PetOwned(PetKind::Rabbit))
        );
        let panda = ActionPayload::BuyPet { pet: PetKind::Panda };
        assert!(matches!(
            validate_action(&user, &panda, &ctx),
            Err(ValidationError::InsufficientCoins { .. })
        ));
    }

    #[test]
    fn checkin_once_per_utc_day() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let ctx = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(86_400 * 3 + 100),
        };
        let mut user = user();
        assert!(validate_action(&user, &ActionPayload::Checkin, &ctx).is_ok());
        user.last_checkin_date = Some(ctx.now.date_naive());
        assert!(matches!(
            validate_action(&user, &ActionPayload::Checkin, &ctx),
            Err(ValidationError::AlreadyCheckedIn(_))
        ));
    }

    #[test]
    fn lottery_limits_draws_and_tickets() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let ctx = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(0),
        };
        let mut user = user();
        user.tickets = 3;
        assert!(validate_action(&user, &ActionPayload::LotteryDraw { count: 3 }, &ctx).is_ok());
        assert_eq!(
            validate_action(&user, &ActionPayload::LotteryDraw { count: 4 }, &ctx),
            Err(ValidationError::NotEnoughTickets { needed: 4, held: 3 })
        );
        assert!(matches!(
            validate_action(&user, &ActionPayload::LotteryDraw { count: 11 }, &ctx),
            Err(ValidationError::InvalidCount { .. })
        ));
    }

    #[test]
    fn pesticide_requires_pests() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let mut user = with_wheat(&catalog, &rules);
        let ctx = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(1010),
        };
        assert_eq!(
            validate_action(&user, &ActionPayload::Pesticide { plot: 0 }, &ctx),
            Err(ValidationError::NoPests(0))
        );
        user.plot_mut(0).unwrap().pests = true;
        assert!(validate_action(&user, &ActionPayload::Pesticide { plot: 0 }, &ctx).is_ok());
    }

    #[test]
    fn plot_actions_on_empty_plot_are_rejected() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let ctx = ValidationContext {
            catalog: &catalog,
            rules: &rules,
            now: at(0),
        };
        let user = user();
        for payload in [
            ActionPayload::Harvest { plot: 0 },
            ActionPayload::Water { plot: 0 },
            ActionPayload::Shovel { plot: 0 },
            ActionPayload::Protect { plot: 0 },
        ] {
            assert_eq!(
                validate_action(&user, &payload, &ctx),
                Err(ValidationError::PlotEmpty(0))
            );
        }
    }
}
