//! Confirmed action events and the traits backends implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use farmstead_types::{ActionKind, EncodedAction, EventId, WalletAddress};

use crate::error::LedgerError;

/// An action the ledger has accepted, as delivered to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedAction {
    /// Backend-side identifier. Assigned on receipt when the ledger omits it.
    #[serde(default)]
    pub id: EventId,
    /// Ledger-wide sequence number, carried for deduplication by the source.
    pub sequence: u64,
    /// The wallet that submitted the action.
    pub user: WalletAddress,
    /// Which action was confirmed.
    pub action_kind: ActionKind,
    /// Packed action arguments.
    pub data: EncodedAction,
    /// Confirmation time according to the ledger.
    pub confirmed_at: DateTime<Utc>,
}

/// A stream of confirmed events. Individual items may fail without ending
/// the stream.
pub type ConfirmedStream = BoxStream<'static, Result<ConfirmedAction, LedgerError>>;

/// Reads a player's current ledger nonce.
#[async_trait]
pub trait NonceSource: Send + Sync {
    /// The nonce the next voucher for `user` must carry.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the ledger cannot be reached.
    async fn current_nonce(&self, user: &WalletAddress) -> Result<u64, LedgerError>;
}

/// Delivers confirmed ledger events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open a new subscription to confirmed events.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the subscription cannot be opened.
    async fn subscribe(&self) -> Result<ConfirmedStream, LedgerError>;
}
