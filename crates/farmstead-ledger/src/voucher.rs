//! Signed vouchers authorizing a ledger action.
//!
//! The backend validates an action, packs its arguments, and hands the
//! player a [`Voucher`]: the claims the ledger will check plus a signature
//! over them. The ledger accepts the action only if the signature verifies
//! and the nonce matches the player's current nonce.
//!
//! Signatures are HMAC-SHA256 over the JSON encoding of [`VoucherClaims`],
//! hex encoded. Field order in the JSON follows the struct declaration, so
//! the signed bytes are stable across processes.

use core::fmt;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use farmstead_types::{ActionKind, EncodedAction, VoucherId, WalletAddress};

use crate::error::LedgerError;

/// The fields covered by a voucher signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherClaims {
    /// Signing domain name, shared with the ledger.
    pub domain: String,
    /// Chain the voucher is valid on.
    pub chain_id: u64,
    /// The wallet allowed to submit the action.
    pub user: WalletAddress,
    /// Which action the voucher authorizes.
    pub action_kind: ActionKind,
    /// Packed action arguments.
    pub data: EncodedAction,
    /// The player's ledger nonce at issue time.
    pub nonce: u64,
}

/// A signed voucher as returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    /// Backend-side identifier, used only for logging.
    pub id: VoucherId,
    /// The signed claims.
    #[serde(flatten)]
    pub claims: VoucherClaims,
    /// Hex-encoded signature over the claims.
    pub signature: String,
    /// When the backend issued the voucher.
    pub issued_at: DateTime<Utc>,
}

impl Voucher {
    /// Sign `claims` and wrap them in a new voucher.
    ///
    /// # Errors
    ///
    /// Propagates any signing failure from `signer`.
    pub fn issue(
        signer: &dyn VoucherSigner,
        claims: VoucherClaims,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        let signature = signer.sign(&claims)?;
        Ok(Self {
            id: VoucherId::new(),
            claims,
            signature,
            issued_at,
        })
    }

    /// Check this voucher's signature.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::BadSignature`] or
    /// [`LedgerError::MalformedSignature`] when the signature does not match.
    pub fn verify(&self, signer: &dyn VoucherSigner) -> Result<(), LedgerError> {
        signer.verify(&self.claims, &self.signature)
    }
}

/// Produces and checks voucher signatures.
pub trait VoucherSigner: Send + Sync {
    /// Sign the claims, returning a hex signature.
    ///
    /// # Errors
    ///
    /// Returns an error when the claims cannot be encoded or the key is
    /// unusable.
    fn sign(&self, claims: &VoucherClaims) -> Result<String, LedgerError>;

    /// Verify a hex signature against the claims.
    ///
    /// # Errors
    ///
    /// Returns an error when the signature is malformed or does not match.
    fn verify(&self, claims: &VoucherClaims, signature: &str) -> Result<(), LedgerError>;
}

/// HMAC-SHA256 voucher signer with a shared secret.
#[derive(Clone)]
pub struct HmacVoucherSigner {
    key: Vec<u8>,
}

impl HmacVoucherSigner {
    /// Build a signer from a secret key.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EmptyKey`] if the key is empty.
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, LedgerError> {
        let key = key.into();
        if key.is_empty() {
            return Err(LedgerError::EmptyKey);
        }
        Ok(Self { key })
    }

    fn mac(&self, claims: &VoucherClaims) -> Result<Hmac<Sha256>, LedgerError> {
        let bytes = serde_json::to_vec(claims)?;
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|e| LedgerError::InvalidKey(e.to_string()))?;
        mac.update(&bytes);
        Ok(mac)
    }
}

impl fmt::Debug for HmacVoucherSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacVoucherSigner")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl VoucherSigner for HmacVoucherSigner {
    fn sign(&self, claims: &VoucherClaims) -> Result<String, LedgerError> {
        let mac = self.mac(claims)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn verify(&self, claims: &VoucherClaims, signature: &str) -> Result<(), LedgerError> {
        let raw = hex::decode(signature)
            .map_err(|e| LedgerError::MalformedSignature(e.to_string()))?;
        self.mac(claims)?
            .verify_slice(&raw)
            .map_err(|e| {
                tracing::debug!(error = %e, user = %claims.user, "Voucher MAC mismatch");
                LedgerError::BadSignature
            })
    }
}
