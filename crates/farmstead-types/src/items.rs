//! Catalog keys and inventory item identifiers.
//!
//! Seeds are identified by their tier (`seed_0` .. `seed_9` in the standard
//! catalog). Inventory holds three closed families of items: seeds, the
//! fruit produced by harvesting a seed, and fertilizer. All of them
//! serialize to the string form used by clients and the stored document
//! (`seed_3`, `fruit_3`, `fertilizer`) and are validated when parsed.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

use crate::error::ParseError;

// ---------------------------------------------------------------------------
// Seed identifier
// ---------------------------------------------------------------------------

const SEED_PREFIX: &str = "seed_";
const FRUIT_PREFIX: &str = "fruit_";
const FERTILIZER: &str = "fertilizer";

/// Identifier of a seed definition, by tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeedId(pub u16);

impl SeedId {
    /// The tier number, which is also the value packed into action payloads.
    pub const fn tier(self) -> u16 {
        self.0
    }
}

impl fmt::Display for SeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SEED_PREFIX}{}", self.0)
    }
}

impl FromStr for SeedId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_tier(s, SEED_PREFIX)
            .map(Self)
            .ok_or_else(|| ParseError::SeedId(s.to_owned()))
    }
}

impl Serialize for SeedId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeedId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse `<prefix><digits>` into a tier number. Leading zeros are rejected so
/// every tier has exactly one spelling.
fn parse_tier(s: &str, prefix: &str) -> Option<u16> {
    let digits = s.strip_prefix(prefix)?;
    if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

// ---------------------------------------------------------------------------
// Item identifier
// ---------------------------------------------------------------------------

/// Anything that can be stacked in a player's inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemId {
    /// A plantable seed.
    Seed(SeedId),
    /// The fruit harvested from a seed of the same tier.
    Fruit(SeedId),
    /// Growth-accelerating fertilizer.
    Fertilizer,
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seed(seed) => write!(f, "{seed}"),
            Self::Fruit(seed) => write!(f, "{FRUIT_PREFIX}{}", seed.tier()),
            Self::Fertilizer => f.write_str(FERTILIZER),
        }
    }
}

impl FromStr for ItemId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == FERTILIZER {
            return Ok(Self::Fertilizer);
        }
        if let Some(tier) = parse_tier(s, SEED_PREFIX) {
            return Ok(Self::Seed(SeedId(tier)));
        }
        if let Some(tier) = parse_tier(s, FRUIT_PREFIX) {
            return Ok(Self::Fruit(SeedId(tier)));
        }
        Err(ParseError::ItemId(s.to_owned()))
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Pets
// ---------------------------------------------------------------------------

/// A purchasable pet. Each kind earns passive coin income at its own rate.
///
/// The discriminant order is the on-chain payload index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PetKind {
    /// Cheapest pet.
    Chick,
    /// Second tier.
    Rabbit,
    /// Third tier.
    Dog,
    /// Fourth tier.
    Fox,
    /// Most expensive pet.
    Panda,
}

impl PetKind {
    /// All pet kinds in payload-index order.
    pub const ALL: [Self; 5] = [Self::Chick, Self::Rabbit, Self::Dog, Self::Fox, Self::Panda];

    /// Index used when packing a `buy_pet` payload.
    pub const fn index(self) -> u16 {
        match self {
            Self::Chick => 0,
            Self::Rabbit => 1,
            Self::Dog => 2,
            Self::Fox => 3,
            Self::Panda => 4,
        }
    }

    /// Inverse of [`PetKind::index`].
    pub const fn from_index(index: u16) -> Option<Self> {
        match index {
            0 => Some(Self::Chick),
            1 => Some(Self::Rabbit),
            2 => Some(Self::Dog),
            3 => Some(Self::Fox),
            4 => Some(Self::Panda),
            _ => None,
        }
    }

    /// Lower-case name, matching the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chick => "chick",
            Self::Rabbit => "rabbit",
            Self::Dog => "dog",
            Self::Fox => "fox",
            Self::Panda => "panda",
        }
    }
}

impl fmt::Display for PetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PetKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseError::PetKind(s.to_owned()))
    }
}
