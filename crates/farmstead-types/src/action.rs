//! The packed integer carried by every ledger action.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

/// Bit-packed action arguments, as recorded in the ledger's `data` field.
///
/// The ledger stores a 256-bit unsigned integer; every layout this backend
/// produces fits in the low 128 bits. Serialized as a base-10 string so that
/// JSON clients never lose precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EncodedAction(pub u128);

impl EncodedAction {
    /// Raw integer value.
    pub const fn value(self) -> u128 {
        self.0
    }
}

impl fmt::Display for EncodedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EncodedAction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::EncodedAction(s.to_owned()));
        }
        s.parse::<u128>()
            .map(Self)
            .map_err(|e| ParseError::EncodedAction(format!("{s}: {e}")))
    }
}

impl Serialize for EncodedAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EncodedAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
