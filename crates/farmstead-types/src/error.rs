//! Parse errors for boundary-validated string types.

/// A string value that does not name a valid identifier or item.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Not `0x` followed by 40 hex digits.
    #[error("invalid wallet address: {0}")]
    WalletAddress(String),

    /// Not of the form `seed_N`.
    #[error("invalid seed id: {0}")]
    SeedId(String),

    /// Not `seed_N`, `fruit_N`, or `fertilizer`.
    #[error("invalid item id: {0}")]
    ItemId(String),

    /// Unknown pet name.
    #[error("invalid pet kind: {0}")]
    PetKind(String),

    /// Unknown action kind name.
    #[error("invalid action kind: {0}")]
    ActionKind(String),

    /// Not a base-10 unsigned integer that fits the payload width.
    #[error("invalid encoded action: {0}")]
    EncodedAction(String),
}
