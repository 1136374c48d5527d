//! In-memory [`UserStore`] for tests and local runs without a database.
//!
//! Documents are kept in serialized form so that a round trip through the
//! store behaves like `PostgreSQL`: callers never share a document with
//! the store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use farmstead_types::{UserDocument, WalletAddress};

use crate::error::DbError;
use crate::store::{StoredUser, UserStore};

#[derive(Debug)]
struct Entry {
    document: serde_json::Value,
    revision: u64,
}

impl Entry {
    fn load(&self) -> Result<StoredUser, DbError> {
        Ok(StoredUser {
            document: serde_json::from_value(self.document.clone())?,
            revision: self.revision,
        })
    }
}

/// A [`UserStore`] held in process memory.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<WalletAddress, Entry>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored players.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Whether no player has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find(&self, wallet: &WalletAddress) -> Result<Option<StoredUser>, DbError> {
        self.users
            .read()
            .await
            .get(wallet)
            .map(Entry::load)
            .transpose()
    }

    async fn find_or_create(
        &self,
        wallet: &WalletAddress,
        now: DateTime<Utc>,
    ) -> Result<StoredUser, DbError> {
        let mut users = self.users.write().await;
        if let Some(entry) = users.get(wallet) {
            return entry.load();
        }
        let fresh = UserDocument::new(wallet.clone(), now);
        let entry = Entry {
            document: serde_json::to_value(&fresh)?,
            revision: 0,
        };
        users.insert(wallet.clone(), entry);
        tracing::info!(wallet = %wallet, "Created new farm");
        Ok(StoredUser {
            document: fresh,
            revision: 0,
        })
    }

    async fn save(&self, document: &UserDocument, revision: u64) -> Result<u64, DbError> {
        let mut users = self.users.write().await;
        let Some(entry) = users.get_mut(&document.wallet) else {
            return Err(DbError::NotFound(document.wallet.to_string()));
        };
        if entry.revision != revision {
            return Err(DbError::Conflict {
                wallet: document.wallet.to_string(),
                expected: revision,
            });
        }
        entry.document = serde_json::to_value(document)?;
        entry.revision = revision.saturating_add(1);
        Ok(entry.revision)
    }
}
