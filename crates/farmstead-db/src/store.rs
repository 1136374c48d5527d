//! The [`UserStore`] abstraction.
//!
//! The store is the only serialization point between concurrent requests
//! for the same player. Every stored document carries a revision; a save
//! names the revision it read and fails with [`DbError::Conflict`] if
//! another writer got there first. Callers reload and retry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use farmstead_types::{UserDocument, WalletAddress};

use crate::error::DbError;

/// A player document together with the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    /// The document.
    pub document: UserDocument,
    /// Revision counter, incremented by every successful save.
    pub revision: u64,
}

/// Persistence for player documents.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Load a player, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails or the document does not
    /// deserialize.
    async fn find(&self, wallet: &WalletAddress) -> Result<Option<StoredUser>, DbError>;

    /// Load a player, creating the starting farm on first contact.
    ///
    /// Safe to race: when two callers create the same player, both receive
    /// the single stored document.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the backend fails.
    async fn find_or_create(
        &self,
        wallet: &WalletAddress,
        now: DateTime<Utc>,
    ) -> Result<StoredUser, DbError>;

    /// Replace the document if its stored revision still equals `revision`.
    ///
    /// Returns the new revision.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] when the revision moved and
    /// [`DbError::NotFound`] when the player was never stored.
    async fn save(&self, document: &UserDocument, revision: u64) -> Result<u64, DbError>;
}
