//! Error types for the ledger crate.

/// Errors raised while signing vouchers or talking to a ledger backend.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The signer was built with an empty key.
    #[error("voucher signer key cannot be empty")]
    EmptyKey,

    /// A voucher signature did not verify.
    #[error("voucher signature verification failed")]
    BadSignature,

    /// The signer key was rejected by the MAC implementation.
    #[error("voucher signer key is unusable: {0}")]
    InvalidKey(String),

    /// A voucher signature was not valid hex.
    #[error("voucher signature is not valid hex: {0}")]
    MalformedSignature(String),

    /// The voucher carried a nonce other than the one the ledger expects.
    #[error("nonce mismatch for {user}: expected {expected}, got {got}")]
    NonceMismatch {
        /// The wallet the voucher was issued for.
        user: String,
        /// The nonce the ledger currently holds.
        expected: u64,
        /// The nonce carried by the voucher.
        got: u64,
    },

    /// The voucher was signed for another domain or chain.
    #[error("voucher issued for {domain}/{chain_id}, ledger is {expected}")]
    WrongDomain {
        /// Domain in the voucher.
        domain: String,
        /// Chain id in the voucher.
        chain_id: u64,
        /// Domain and chain the ledger accepts.
        expected: String,
    },

    /// A confirmed-event subscriber fell behind and missed events.
    #[error("event subscriber lagged, {0} events skipped")]
    Lagged(u64),

    /// The transport to the ledger failed.
    #[error("ledger transport error: {0}")]
    Transport(String),

    /// The ledger did not answer in time.
    #[error("ledger request timed out after {0} ms")]
    Timeout(u64),

    /// A payload could not be serialized or deserialized.
    #[error("ledger payload error: {0}")]
    Serialization(#[from] serde_json::Error),
}
