//! The persisted player document.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::WalletAddress;
use crate::items::{ItemId, PetKind, SeedId};
use crate::plot::{PLOT_COUNT, Plot};

/// Coins granted to a new player.
pub const STARTING_COINS: u64 = 1000;

/// Seed granted to a new player so the first plot can be planted.
pub const STARTING_SEED: SeedId = SeedId(0);

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Sparse item counts. Entries that reach zero are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory(BTreeMap<ItemId, u32>);

impl Inventory {
    /// How many of `item` are held.
    pub fn count(&self, item: ItemId) -> u32 {
        self.0.get(&item).copied().unwrap_or(0)
    }

    /// Whether at least `amount` of `item` are held.
    pub fn has(&self, item: ItemId, amount: u32) -> bool {
        self.count(item) >= amount
    }

    /// Add `amount` of `item`, saturating at `u32::MAX`.
    pub fn add(&mut self, item: ItemId, amount: u32) {
        if amount == 0 {
            return;
        }
        let entry = self.0.entry(item).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Remove up to `amount` of `item` and return how many were removed.
    pub fn take(&mut self, item: ItemId, amount: u32) -> u32 {
        let held = self.count(item);
        let taken = held.min(amount);
        let left = held.saturating_sub(taken);
        if left == 0 {
            self.0.remove(&item);
        } else {
            self.0.insert(item, left);
        }
        taken
    }

    /// Iterate over held items in key order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.0.iter().map(|(item, count)| (*item, *count))
    }
}

// ---------------------------------------------------------------------------
// User document
// ---------------------------------------------------------------------------

/// Everything stored about one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserDocument {
    /// Normalized wallet address. Primary key.
    pub wallet: WalletAddress,
    /// Soft currency.
    pub coins: u64,
    /// Premium-exchange currency balance.
    #[ts(as = "String")]
    pub premium_balance: Decimal,
    /// Lottery tickets.
    pub tickets: u32,
    /// Accumulated experience.
    pub exp: u64,
    /// Level derived from experience thresholds.
    pub level: u32,
    /// Owned pets.
    pub pets: BTreeSet<PetKind>,
    /// Pet income has been paid out up to this instant.
    pub income_settled_at: Option<DateTime<Utc>>,
    /// UTC date of the last daily check-in.
    #[serde(default)]
    pub last_checkin_date: Option<NaiveDate>,
    /// Item counts.
    #[ts(type = "Record<string, number>")]
    pub inventory: Inventory,
    /// Collected letter tokens (`"A"`..`"Z"`) and their counts.
    pub letters: BTreeMap<String, u32>,
    /// The farm grid, always `PLOT_COUNT` long.
    pub plots: Vec<Plot>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last modification instant.
    pub updated_at: DateTime<Utc>,
}

impl UserDocument {
    /// A fresh player: starting coins, one starter seed, and only the first
    /// plot unlocked.
    pub fn new(wallet: WalletAddress, now: DateTime<Utc>) -> Self {
        let plots = (0..PLOT_COUNT)
            .filter_map(|i| u8::try_from(i).ok())
            .map(|i| Plot::new(i, i == 0))
            .collect();
        let mut inventory = Inventory::default();
        inventory.add(ItemId::Seed(STARTING_SEED), 1);
        Self {
            wallet,
            coins: STARTING_COINS,
            premium_balance: Decimal::ZERO,
            tickets: 0,
            exp: 0,
            level: 1,
            pets: BTreeSet::new(),
            income_settled_at: None,
            last_checkin_date: None,
            inventory,
            letters: BTreeMap::new(),
            plots,
            created_at: now,
            updated_at: now,
        }
    }

    /// Plot at `index`, if in range.
    pub fn plot(&self, index: u16) -> Option<&Plot> {
        self.plots.get(usize::from(index))
    }

    /// Mutable plot at `index`, if in range.
    pub fn plot_mut(&mut self, index: u16) -> Option<&mut Plot> {
        self.plots.get_mut(usize::from(index))
    }
}
