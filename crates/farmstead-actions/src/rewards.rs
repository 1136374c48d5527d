//! Random rewards: harvest letters, lottery draws, and check-in coins.
//!
//! All rolls take the random source as a parameter so callers decide how
//! randomness is seeded.

use rand::Rng;

use farmstead_farm::{CheckinReward, LotteryReward};
use farmstead_types::SeedId;

const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Roll for a collectible letter with `percent` chance.
pub fn roll_letter<R: Rng + ?Sized>(percent: u8, rng: &mut R) -> Option<char> {
    let chance = f64::from(percent.min(100)) / 100.0;
    if !rng.random_bool(chance) {
        return None;
    }
    let index = rng.random_range(0..LETTERS.len());
    LETTERS.get(index).map(|&b| char::from(b))
}

/// Pick one entry by relative weight. `None` when the table is empty or all
/// weights are zero.
fn pick_weighted<'a, T, R: Rng + ?Sized>(
    table: &'a [T],
    weight: impl Fn(&T) -> u32,
    rng: &mut R,
) -> Option<&'a T> {
    let total = table
        .iter()
        .fold(0_u64, |sum, entry| sum.saturating_add(u64::from(weight(entry))));
    if total == 0 {
        return None;
    }
    let mut ticket = rng.random_range(0..total);
    for entry in table {
        let w = u64::from(weight(entry));
        if ticket < w {
            return Some(entry);
        }
        ticket = ticket.saturating_sub(w);
    }
    table.last()
}

/// Draw once from the lottery table: the seed won and how many.
pub fn roll_lottery<R: Rng + ?Sized>(
    table: &[LotteryReward],
    rng: &mut R,
) -> Option<(SeedId, u32)> {
    let reward = pick_weighted(table, |r| r.weight, rng)?;
    let count = rng.random_range(reward.min..=reward.max.max(reward.min));
    Some((reward.seed, count))
}

/// Roll the daily check-in coin reward.
pub fn roll_checkin<R: Rng + ?Sized>(table: &[CheckinReward], rng: &mut R) -> u64 {
    pick_weighted(table, |r| r.weight, rng).map_or(0, |reward| {
        rng.random_range(reward.min_coins..=reward.max_coins.max(reward.min_coins))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use farmstead_farm::Catalog;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn letters_are_uppercase_ascii() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..200 {
            let letter = roll_letter(100, &mut rng).unwrap();
            assert!(letter.is_ascii_uppercase());
        }
        assert_eq!(roll_letter(0, &mut rng), None);
    }

    #[test]
    fn lottery_counts_stay_in_range() {
        let catalog = Catalog::standard();
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..500 {
            let (seed, count) = roll_lottery(&catalog.lottery, &mut rng).unwrap();
            let entry = catalog.lottery.iter().find(|r| r.seed == seed);
            assert!(entry.is_some_and(|r| (r.min..=r.max).contains(&count)));
        }
    }

    #[test]
    fn checkin_coins_stay_in_range() {
        let catalog = Catalog::standard();
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..500 {
            let coins = roll_checkin(&catalog.checkin, &mut rng);
            assert!((50..=800).contains(&coins));
        }
    }

    #[test]
    fn zero_weight_entries_never_win() {
        let table = [
            LotteryReward {
                seed: SeedId(0),
                weight: 0,
                min: 1,
                max: 1,
            },
            LotteryReward {
                seed: SeedId(7),
                weight: 1,
                min: 2,
                max: 2,
            },
        ];
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..50 {
            assert_eq!(roll_lottery(&table, &mut rng), Some((SeedId(7), 2)));
        }
        assert_eq!(roll_lottery(&[], &mut rng), None);
    }
}
