//! Applying confirmed ledger actions to the user document.
//!
//! By the time an action reaches this module the ledger has accepted it, so
//! reconciliation never rejects on game grounds. A shortfall (coins spent
//! twice, a seed already consumed) is logged and saturates at zero. Only
//! payloads that cannot be interpreted at all (stray bits, an unknown seed or
//! plot) are returned as errors.
//!
//! No duplicate detection happens here; the event source guarantees each
//! sequence number is delivered for processing once.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use farmstead_farm::{Catalog, GameRules, generate_requirements, settle_pet_income};
use farmstead_types::{
    ActionKind, EncodedAction, ItemId, PetKind, PlotStage, SeedId, UserDocument, first_pending,
};

use crate::payload::{ActionPayload, PayloadError};
use crate::rewards::{roll_checkin, roll_letter, roll_lottery};

/// Tables and rules used while reconciling.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    /// Static game tables.
    pub catalog: &'a Catalog,
    /// Tunable rules.
    pub rules: &'a GameRules,
}

/// Confirmed actions that cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// The payload does not decode under its kind.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// The payload names a plot beyond the farm.
    #[error("plot {0} does not exist")]
    PlotOutOfRange(u16),

    /// The payload names a seed not in the catalog.
    #[error("unknown seed {0}")]
    UnknownSeed(SeedId),

    /// The payload names a pet not in the catalog.
    #[error("unknown pet {0}")]
    UnknownPet(PetKind),
}

/// What reconciling one action changed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReconcileReport {
    /// Coins credited.
    pub coins_gained: u64,
    /// Coins debited.
    pub coins_spent: u64,
    /// Experience gained.
    pub exp_gained: u64,
    /// Items added to the inventory.
    pub items_gained: Vec<(ItemId, u32)>,
    /// Letter token dropped by a harvest.
    pub letter: Option<char>,
    /// New level, if the action caused a level-up.
    pub level_up: Option<u32>,
    /// The action could not be fully applied (missing funds or items, or a
    /// plot already in a different state). Details are logged.
    pub partial: bool,
}

/// Apply a confirmed `kind`/`data` pair to `user` as of `confirmed_at`.
pub fn apply_confirmed<R: Rng + ?Sized>(
    user: &mut UserDocument,
    kind: ActionKind,
    data: EncodedAction,
    confirmed_at: DateTime<Utc>,
    ctx: &ReconcileContext<'_>,
    rng: &mut R,
) -> Result<ReconcileReport, ReconcileError> {
    let payload = ActionPayload::decode(kind, data)?;
    if let Some(plot) = payload.plot().filter(|&p| user.plot(p).is_none()) {
        return Err(ReconcileError::PlotOutOfRange(plot));
    }

    let mut report = ReconcileReport::default();
    let t = confirmed_at.timestamp();

    match payload {
        ActionPayload::Plant { plot, seed } => {
            let def = ctx
                .catalog
                .seed(seed)
                .ok_or(ReconcileError::UnknownSeed(seed))?;
            take_item(user, ItemId::Seed(seed), 1, &mut report);
            let requirements = generate_requirements(def, false, ctx.rules);
            if let Some(target) = user.plot_mut(plot) {
                if target.is_planted() {
                    warn!(plot, "plant confirmed on an occupied plot; replacing crop");
                    report.partial = true;
                }
                target.clear();
                target.unlocked = true;
                target.seed = Some(seed);
                target.planted_at = Some(t);
                target.water = requirements.water;
                target.weeds = requirements.weeds;
                target.stage = PlotStage::Seed;
            }
        }
        ActionPayload::Harvest { plot } => harvest(user, plot, ctx, rng, &mut report)?,
        ActionPayload::Water { plot } => {
            let completed = user
                .plot_mut(plot)
                .and_then(|target| first_pending(&mut target.water))
                .is_some_and(|cp| cp.complete(t));
            if !completed {
                warn!(plot, "water confirmed with no pending checkpoint");
                report.partial = true;
            }
        }
        ActionPayload::Weed { plot } => {
            let completed = user
                .plot_mut(plot)
                .and_then(|target| first_pending(&mut target.weeds))
                .is_some_and(|cp| cp.complete(t));
            if !completed {
                warn!(plot, "weed confirmed with no pending checkpoint");
                report.partial = true;
            }
        }
        ActionPayload::Fertilize { plot } => {
            take_item(user, ItemId::Fertilizer, 1, &mut report);
            if let Some(target) = user.plot_mut(plot) {
                if let Some(def) = target.seed.and_then(|id| ctx.catalog.seed(id)) {
                    let requirements = generate_requirements(def, true, ctx.rules);
                    target.fertilized = true;
                    target.water = requirements.water;
                    target.weeds = requirements.weeds;
                } else {
                    warn!(plot, "fertilize confirmed on an empty plot");
                    report.partial = true;
                }
            }
        }
        ActionPayload::Shovel { plot } => {
            if let Some(target) = user.plot_mut(plot) {
                target.clear();
            }
        }
        ActionPayload::Pesticide { plot } => {
            if let Some(target) = user.plot_mut(plot) {
                target.pests = false;
                target.last_pest_check_at = Some(t);
            }
        }
        ActionPayload::Protect { plot } => {
            let until = t.saturating_add(i64::try_from(ctx.rules.protection_secs).unwrap_or(i64::MAX));
            if let Some(target) = user.plot_mut(plot) {
                target.protected_until = Some(until);
            }
        }
        ActionPayload::UnlockPlot { plot } => {
            let cost = ctx.catalog.plot_price(plot).map_or(0, |p| p.cost);
            spend_coins(user, cost, &mut report);
            if let Some(target) = user.plot_mut(plot) {
                target.unlocked = true;
            }
        }
        ActionPayload::BuySeed { seed, count } => {
            let def = ctx
                .catalog
                .seed(seed)
                .ok_or(ReconcileError::UnknownSeed(seed))?;
            spend_coins(user, def.cost.saturating_mul(u64::from(count)), &mut report);
            give_item(user, ItemId::Seed(seed), count, &mut report);
        }
        ActionPayload::BuyFertilizer { count } => {
            let cost = ctx.catalog.fertilizer_price.saturating_mul(u64::from(count));
            spend_coins(user, cost, &mut report);
            give_item(user, ItemId::Fertilizer, count, &mut report);
        }
        ActionPayload::SellFruit { seed, count } => {
            let def = ctx
                .catalog
                .seed(seed)
                .ok_or(ReconcileError::UnknownSeed(seed))?;
            let sold = take_item(user, ItemId::Fruit(seed), count, &mut report);
            gain_coins(user, def.sell_price.saturating_mul(u64::from(sold)), &mut report);
        }
        ActionPayload::BuyPet { pet } => {
            let def = ctx.catalog.pet(pet).ok_or(ReconcileError::UnknownPet(pet))?;
            let earned = settle_pet_income(user, ctx.catalog, ctx.rules, confirmed_at);
            report.coins_gained = report.coins_gained.saturating_add(earned);
            spend_coins(user, def.price, &mut report);
            if !user.pets.insert(pet) {
                warn!(pet = %pet, "pet purchase confirmed for an owned pet");
                report.partial = true;
            }
            if user.income_settled_at.is_none() {
                user.income_settled_at = Some(confirmed_at);
            }
        }
        ActionPayload::Checkin => {
            let coins = roll_checkin(&ctx.catalog.checkin, rng);
            gain_coins(user, coins, &mut report);
            user.tickets = user.tickets.saturating_add(1);
            user.last_checkin_date = Some(confirmed_at.date_naive());
        }
        ActionPayload::LotteryDraw { count } => {
            let draws = u32::from(count);
            if user.tickets < draws {
                warn!(wallet = %user.wallet, draws, tickets = user.tickets, "lottery draw exceeds tickets");
                report.partial = true;
            }
            user.tickets = user.tickets.saturating_sub(draws);
            for _ in 0..draws {
                if let Some((seed, amount)) = roll_lottery(&ctx.catalog.lottery, rng) {
                    give_item(user, ItemId::Seed(seed), amount, &mut report);
                }
            }
        }
    }

    debug!(wallet = %user.wallet, kind = %kind, ?report, "reconciled action");
    Ok(report)
}

fn harvest<R: Rng + ?Sized>(
    user: &mut UserDocument,
    plot: u16,
    ctx: &ReconcileContext<'_>,
    rng: &mut R,
    report: &mut ReconcileReport,
) -> Result<(), ReconcileError> {
    let Some(seed) = user.plot(plot).and_then(|p| p.seed) else {
        warn!(plot, "harvest confirmed on an empty plot");
        report.partial = true;
        return Ok(());
    };
    let def = ctx
        .catalog
        .seed(seed)
        .ok_or(ReconcileError::UnknownSeed(seed))?;

    let level_before = user.level;
    user.exp = user.exp.saturating_add(def.exp);
    report.exp_gained = def.exp;
    give_item(user, ItemId::Fruit(seed), 1, report);

    if let Some(letter) = roll_letter(ctx.rules.letter_drop_percent, rng) {
        let count = user.letters.entry(letter.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        report.letter = Some(letter);
    }

    user.level = ctx.catalog.level_for_exp(user.exp);
    if user.level > level_before {
        info!(wallet = %user.wallet, level = user.level, "level up");
        report.level_up = Some(user.level);
    }

    if let Some(target) = user.plot_mut(plot) {
        target.clear();
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Balance helpers
// ---------------------------------------------------------------------------

fn spend_coins(user: &mut UserDocument, amount: u64, report: &mut ReconcileReport) {
    if user.coins < amount {
        warn!(wallet = %user.wallet, amount, coins = user.coins, "confirmed spend exceeds balance");
        report.partial = true;
    }
    let spent = user.coins.min(amount);
    user.coins = user.coins.saturating_sub(spent);
    report.coins_spent = report.coins_spent.saturating_add(spent);
}

fn gain_coins(user: &mut UserDocument, amount: u64, report: &mut ReconcileReport) {
    user.coins = user.coins.saturating_add(amount);
    report.coins_gained = report.coins_gained.saturating_add(amount);
}

fn take_item(
    user: &mut UserDocument,
    item: ItemId,
    amount: u32,
    report: &mut ReconcileReport,
) -> u32 {
    let taken = user.inventory.take(item, amount);
    if taken < amount {
        warn!(wallet = %user.wallet, %item, wanted = amount, taken, "confirmed action consumed missing items");
        report.partial = true;
    }
    taken
}

fn give_item(user: &mut UserDocument, item: ItemId, amount: u32, report: &mut ReconcileReport) {
    user.inventory.add(item, amount);
    report.items_gained.push((item, amount));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use farmstead_farm::derive_status;
    use farmstead_types::{STARTING_COINS, WalletAddress};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn user() -> UserDocument {
        let wallet = WalletAddress::parse("0x3333333333333333333333333333333333333333").unwrap();
        UserDocument::new(wallet, Utc.timestamp_opt(0, 0).unwrap())
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn apply(
        user: &mut UserDocument,
        payload: ActionPayload,
        secs: i64,
    ) -> Result<ReconcileReport, ReconcileError> {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let ctx = ReconcileContext {
            catalog: &catalog,
            rules: &rules,
        };
        let mut rng = SmallRng::seed_from_u64(21);
        apply_confirmed(user, payload.kind(), payload.encode(), at(secs), &ctx, &mut rng)
    }

    #[test]
    fn plant_consumes_seed_and_schedules_checkpoints() {
        let mut user = user();
        let report = apply(&mut user, ActionPayload::Plant { plot: 0, seed: SeedId(0) }, 100);
        assert!(report.is_ok_and(|r| !r.partial));
        assert_eq!(user.inventory.count(ItemId::Seed(SeedId(0))), 0);
        let plot = user.plot(0).unwrap();
        assert_eq!(plot.seed, Some(SeedId(0)));
        assert_eq!(plot.planted_at, Some(100));
        assert_eq!(plot.water.len(), 1);
        assert_eq!(plot.weeds.len(), 1);
    }

    #[test]
    fn plant_without_seed_saturates_and_flags() {
        let mut user = user();
        user.inventory.take(ItemId::Seed(SeedId(0)), 1);
        let report = apply(&mut user, ActionPayload::Plant { plot: 0, seed: SeedId(0) }, 100);
        assert!(report.unwrap().partial);
        assert!(user.plot(0).unwrap().is_planted());
    }

    #[test]
    fn water_marks_first_pending_checkpoint() {
        let mut user = user();
        user.inventory.add(ItemId::Seed(SeedId(1)), 1);
        apply(&mut user, ActionPayload::Plant { plot: 0, seed: SeedId(1) }, 0).unwrap();
        apply(&mut user, ActionPayload::Water { plot: 0 }, 61).unwrap();
        let plot = user.plot(0).unwrap();
        assert_eq!(plot.water.first().and_then(|c| c.done_at), Some(61));
        assert_eq!(plot.water.get(1).map(|c| c.done), Some(false));

        apply(&mut user, ActionPayload::Water { plot: 0 }, 130).unwrap();
        let extra = apply(&mut user, ActionPayload::Water { plot: 0 }, 140).unwrap();
        assert!(extra.partial);
        let plot = user.plot(0).unwrap();
        assert_eq!(plot.water.get(1).and_then(|c| c.done_at), Some(130));
    }

    #[test]
    fn fertilize_replaces_schedule_with_fresh_checkpoints() {
        let mut user = user();
        user.inventory.add(ItemId::Seed(SeedId(1)), 1);
        user.inventory.add(ItemId::Fertilizer, 1);
        apply(&mut user, ActionPayload::Plant { plot: 0, seed: SeedId(1) }, 0).unwrap();
        apply(&mut user, ActionPayload::Water { plot: 0 }, 61).unwrap();
        apply(&mut user, ActionPayload::Fertilize { plot: 0 }, 70).unwrap();

        let plot = user.plot(0).unwrap();
        assert!(plot.fertilized);
        assert_eq!(
            plot.water.iter().map(|c| c.offset).collect::<Vec<_>>(),
            vec![48, 96]
        );
        assert!(plot.checkpoints().all(|c| !c.done));
        assert_eq!(user.inventory.count(ItemId::Fertilizer), 0);
    }

    #[test]
    fn harvest_grants_rewards_and_clears_plot() {
        let mut user = user();
        apply(&mut user, ActionPayload::Plant { plot: 0, seed: SeedId(0) }, 0).unwrap();
        let report = apply(&mut user, ActionPayload::Harvest { plot: 0 }, 300).unwrap();
        assert_eq!(report.exp_gained, 5);
        assert_eq!(user.exp, 5);
        assert_eq!(user.inventory.count(ItemId::Fruit(SeedId(0))), 1);
        assert!(!user.plot(0).unwrap().is_planted());
        assert!(user.plot(0).unwrap().unlocked);
        let letters: u32 = user.letters.values().sum();
        assert_eq!(letters, u32::from(report.letter.is_some()));
    }

    #[test]
    fn harvest_recomputes_level() {
        let mut user = user();
        user.exp = 98;
        apply(&mut user, ActionPayload::Plant { plot: 0, seed: SeedId(0) }, 0).unwrap();
        let report = apply(&mut user, ActionPayload::Harvest { plot: 0 }, 300).unwrap();
        assert_eq!(user.level, 2);
        assert_eq!(report.level_up, Some(2));
    }

    #[test]
    fn harvest_on_empty_plot_is_partial() {
        let mut user = user();
        let report = apply(&mut user, ActionPayload::Harvest { plot: 0 }, 10).unwrap();
        assert!(report.partial);
        assert_eq!(user.exp, 0);
    }

    #[test]
    fn shop_transfers_coins_and_items() {
        let mut user = user();
        apply(&mut user, ActionPayload::BuySeed { seed: SeedId(2), count: 3 }, 0).unwrap();
        assert_eq!(user.coins, STARTING_COINS - 150);
        assert_eq!(user.inventory.count(ItemId::Seed(SeedId(2))), 3);

        apply(&mut user, ActionPayload::BuyFertilizer { count: 2 }, 0).unwrap();
        assert_eq!(user.coins, STARTING_COINS - 250);
        assert_eq!(user.inventory.count(ItemId::Fertilizer), 2);

        user.inventory.add(ItemId::Fruit(SeedId(3)), 2);
        apply(&mut user, ActionPayload::SellFruit { seed: SeedId(3), count: 2 }, 0).unwrap();
        assert_eq!(user.coins, STARTING_COINS - 250 + 400);
        assert_eq!(user.inventory.count(ItemId::Fruit(SeedId(3))), 0);
    }

    #[test]
    fn overspend_saturates_at_zero() {
        let mut user = user();
        user.coins = 10;
        let report = apply(&mut user, ActionPayload::BuySeed { seed: SeedId(1), count: 1 }, 0)
            .unwrap();
        assert!(report.partial);
        assert_eq!(user.coins, 0);
        assert_eq!(report.coins_spent, 10);
    }

    #[test]
    fn unlock_charges_catalog_price() {
        let mut user = user();
        apply(&mut user, ActionPayload::UnlockPlot { plot: 1 }, 0).unwrap();
        assert!(user.plot(1).unwrap().unlocked);
        assert_eq!(user.coins, STARTING_COINS - 100);
    }

    #[test]
    fn first_pet_starts_income_clock() {
        let mut user = user();
        apply(&mut user, ActionPayload::BuyPet { pet: PetKind::Chick }, 500).unwrap();
        assert!(user.pets.contains(&PetKind::Chick));
        assert_eq!(user.coins, STARTING_COINS - 100);
        assert_eq!(user.income_settled_at, Some(at(500)));
    }

    #[test]
    fn second_pet_settles_pending_income_first() {
        let mut user = user();
        user.coins = 5000;
        user.pets.insert(PetKind::Panda);
        user.income_settled_at = Some(at(0));
        let ten_hours = TimeDelta::hours(10).num_seconds();
        let report = apply(&mut user, ActionPayload::BuyPet { pet: PetKind::Chick }, ten_hours)
            .unwrap();
        assert_eq!(report.coins_gained, 46);
        assert_eq!(user.coins, 5000 + 46 - 100);
        assert_eq!(user.income_settled_at, Some(at(ten_hours)));
    }

    #[test]
    fn checkin_grants_coins_and_ticket() {
        let mut user = user();
        let report = apply(&mut user, ActionPayload::Checkin, 86_400 * 2).unwrap();
        assert!((50..=800).contains(&report.coins_gained));
        assert_eq!(user.tickets, 1);
        assert_eq!(user.last_checkin_date, Some(at(86_400 * 2).date_naive()));
    }

    #[test]
    fn lottery_spends_tickets_for_seeds() {
        let mut user = user();
        user.tickets = 3;
        let report = apply(&mut user, ActionPayload::LotteryDraw { count: 3 }, 0).unwrap();
        assert_eq!(user.tickets, 0);
        assert_eq!(report.items_gained.len(), 3);
        assert!(report
            .items_gained
            .iter()
            .all(|(item, n)| matches!(item, ItemId::Seed(_)) && *n >= 1));
    }

    #[test]
    fn pesticide_clears_flag_but_not_cycle_marker() {
        let mut user = user();
        apply(&mut user, ActionPayload::Plant { plot: 0, seed: SeedId(0) }, 0).unwrap();
        {
            let plot = user.plot_mut(0).unwrap();
            plot.pests = true;
            plot.pests_occurred = true;
        }
        apply(&mut user, ActionPayload::Pesticide { plot: 0 }, 80).unwrap();
        let plot = user.plot(0).unwrap();
        assert!(!plot.pests);
        assert!(plot.pests_occurred);
        assert_eq!(plot.last_pest_check_at, Some(80));
    }

    #[test]
    fn protect_sets_window() {
        let mut user = user();
        apply(&mut user, ActionPayload::Plant { plot: 0, seed: SeedId(0) }, 0).unwrap();
        apply(&mut user, ActionPayload::Protect { plot: 0 }, 50).unwrap();
        assert_eq!(user.plot(0).unwrap().protected_until, Some(50 + 86_400));
    }

    #[test]
    fn undecodable_payloads_are_errors() {
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let ctx = ReconcileContext {
            catalog: &catalog,
            rules: &rules,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let mut user = user();
        let stray = apply_confirmed(
            &mut user,
            ActionKind::Water,
            EncodedAction(1 << 20),
            at(0),
            &ctx,
            &mut rng,
        );
        assert!(matches!(stray, Err(ReconcileError::Payload(_))));
        let range = apply(&mut user, ActionPayload::Water { plot: 30 }, 0);
        assert_eq!(range, Err(ReconcileError::PlotOutOfRange(30)));
        let seed = apply(&mut user, ActionPayload::BuySeed { seed: SeedId(99), count: 1 }, 0);
        assert_eq!(seed, Err(ReconcileError::UnknownSeed(SeedId(99))));
    }

    #[test]
    fn watering_resumes_growth_from_pause_point() {
        // One water checkpoint at offset 50, watered at 61, queried at 70.
        let catalog = Catalog::standard();
        let rules = GameRules::default();
        let mut user = user();
        user.inventory.add(ItemId::Seed(SeedId(1)), 1);
        apply(&mut user, ActionPayload::Plant { plot: 0, seed: SeedId(1) }, 0).unwrap();
        {
            let plot = user.plot_mut(0).unwrap();
            plot.water = vec![farmstead_types::Checkpoint::pending(50)];
            plot.weeds.clear();
        }
        let before = derive_status(user.plot(0).unwrap(), &catalog, &rules, 60);
        assert_eq!(before.stage, PlotStage::Paused);
        assert!(before.needs_water);

        apply(&mut user, ActionPayload::Water { plot: 0 }, 61).unwrap();
        let after = derive_status(user.plot(0).unwrap(), &catalog, &rules, 70);
        assert_eq!(after.effective_elapsed, 59);
        assert!(!after.needs_water);
    }
}
