//! Passive pet income.
//!
//! Pets pay out continuously at their hourly rate. Income is settled lazily
//! on reads: the elapsed time since the last settlement (capped) is
//! converted to whole coins. The settlement instant only moves forward when
//! at least one coin was paid, so fractional accrual is never thrown away
//! between frequent reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, warn};

use farmstead_types::UserDocument;

use crate::catalog::Catalog;
use crate::rules::GameRules;

const SECONDS_PER_HOUR: i64 = 3600;

/// Whole coins the user's pets have earned since the last settlement.
pub fn pending_income(
    user: &UserDocument,
    catalog: &Catalog,
    rules: &GameRules,
    now: DateTime<Utc>,
) -> u64 {
    let Some(settled_at) = user.income_settled_at else {
        return 0;
    };
    if user.pets.is_empty() {
        return 0;
    }

    let cap = i64::from(rules.pet_income_cap_hours).saturating_mul(SECONDS_PER_HOUR);
    let elapsed = now
        .signed_duration_since(settled_at)
        .num_seconds()
        .clamp(0, cap);

    let hourly = user.pets.iter().fold(Decimal::ZERO, |sum, kind| {
        catalog.pet(*kind).map_or_else(
            || {
                warn!(pet = %kind, "owned pet missing from catalog");
                sum
            },
            |pet| sum.saturating_add(pet.coins_per_hour),
        )
    });

    hourly
        .saturating_mul(Decimal::from(elapsed))
        .checked_div(Decimal::from(SECONDS_PER_HOUR))
        .unwrap_or(Decimal::ZERO)
        .floor()
        .to_u64()
        .unwrap_or(0)
}

/// Pay out pending pet income and advance the settlement instant.
///
/// Returns the coins credited.
pub fn settle_pet_income(
    user: &mut UserDocument,
    catalog: &Catalog,
    rules: &GameRules,
    now: DateTime<Utc>,
) -> u64 {
    let earned = pending_income(user, catalog, rules, now);
    if earned > 0 {
        user.coins = user.coins.saturating_add(earned);
        user.income_settled_at = Some(now);
        debug!(wallet = %user.wallet, earned, "settled pet income");
    }
    earned
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use farmstead_types::{PetKind, STARTING_COINS, WalletAddress};

    fn user_with(pets: &[PetKind], settled_hours_ago: i64, now: DateTime<Utc>) -> UserDocument {
        let wallet = WalletAddress::parse("0x1111111111111111111111111111111111111111").unwrap();
        let mut user = UserDocument::new(wallet, now);
        user.pets.extend(pets.iter().copied());
        user.income_settled_at = Some(now - TimeDelta::hours(settled_hours_ago));
        user
    }

    #[test]
    fn income_accrues_hourly_and_floors() {
        let now = Utc::now();
        // Panda: 4.62963/h, 10h -> 46.2963 -> 46.
        let mut user = user_with(&[PetKind::Panda], 10, now);
        let earned = settle_pet_income(&mut user, &Catalog::standard(), &GameRules::default(), now);
        assert_eq!(earned, 46);
        assert_eq!(user.coins, STARTING_COINS + 46);
        assert_eq!(user.income_settled_at, Some(now));
    }

    #[test]
    fn income_is_capped() {
        let now = Utc::now();
        let user = user_with(&[PetKind::Panda], 100, now);
        let capped = pending_income(&user, &Catalog::standard(), &GameRules::default(), now);
        // 24h * 4.62963 = 111.11112
        assert_eq!(capped, 111);
    }

    #[test]
    fn rates_of_all_pets_add_up() {
        let now = Utc::now();
        let user = user_with(&[PetKind::Dog, PetKind::Fox], 2, now);
        // (0.925926 + 2.314815) * 2 = 6.481482
        assert_eq!(
            pending_income(&user, &Catalog::standard(), &GameRules::default(), now),
            6
        );
    }

    #[test]
    fn fractional_income_keeps_settlement_instant() {
        let now = Utc::now();
        // Chick: 0.046296/h, 1h -> 0 coins.
        let mut user = user_with(&[PetKind::Chick], 1, now);
        let before = user.income_settled_at;
        let earned = settle_pet_income(&mut user, &Catalog::standard(), &GameRules::default(), now);
        assert_eq!(earned, 0);
        assert_eq!(user.income_settled_at, before);
    }

    #[test]
    fn no_pets_no_income() {
        let now = Utc::now();
        let user = user_with(&[], 10, now);
        assert_eq!(
            pending_income(&user, &Catalog::standard(), &GameRules::default(), now),
            0
        );
    }
}
