//! `PostgreSQL`-backed [`UserStore`].
//!
//! Table `users(wallet, document, revision, created_at, updated_at)`. The
//! document column holds the serialized [`UserDocument`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use farmstead_types::{UserDocument, WalletAddress};

use crate::error::DbError;
use crate::store::{StoredUser, UserStore};

/// Raw row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// Normalized wallet address.
    pub wallet: String,
    /// Serialized document.
    pub document: serde_json::Value,
    /// Revision counter.
    pub revision: i64,
    /// Insert time.
    pub created_at: DateTime<Utc>,
    /// Last save time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for StoredUser {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let document: UserDocument = serde_json::from_value(row.document)?;
        Ok(Self {
            document,
            revision: u64::try_from(row.revision).unwrap_or(0),
        })
    }
}

/// Operations on the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find(&self, wallet: &WalletAddress) -> Result<Option<StoredUser>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"SELECT wallet, document, revision, created_at, updated_at
              FROM users
              WHERE wallet = $1",
        )
        .bind(wallet.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredUser::try_from).transpose()
    }

    async fn find_or_create(
        &self,
        wallet: &WalletAddress,
        now: DateTime<Utc>,
    ) -> Result<StoredUser, DbError> {
        let fresh = UserDocument::new(wallet.clone(), now);
        let document = serde_json::to_value(&fresh)?;

        let inserted = sqlx::query(
            r"INSERT INTO users (wallet, document, revision, created_at, updated_at)
              VALUES ($1, $2, 0, $3, $3)
              ON CONFLICT (wallet) DO NOTHING",
        )
        .bind(wallet.as_str())
        .bind(&document)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            tracing::info!(wallet = %wallet, "Created new farm");
        }

        self.find(wallet)
            .await?
            .ok_or_else(|| DbError::NotFound(wallet.to_string()))
    }

    async fn save(&self, document: &UserDocument, revision: u64) -> Result<u64, DbError> {
        let expected = i64::try_from(revision).unwrap_or(i64::MAX);
        let body = serde_json::to_value(document)?;

        let updated: Option<i64> = sqlx::query_scalar(
            r"UPDATE users
              SET document = $2, revision = revision + 1, updated_at = $3
              WHERE wallet = $1 AND revision = $4
              RETURNING revision",
        )
        .bind(document.wallet.as_str())
        .bind(&body)
        .bind(document.updated_at)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(next) = updated {
            tracing::debug!(wallet = %document.wallet, revision = next, "Saved user document");
            return Ok(u64::try_from(next).unwrap_or(0));
        }

        let exists: Option<i64> =
            sqlx::query_scalar(r"SELECT revision FROM users WHERE wallet = $1")
                .bind(document.wallet.as_str())
                .fetch_optional(&self.pool)
                .await?;

        match exists {
            Some(_) => Err(DbError::Conflict {
                wallet: document.wallet.to_string(),
                expected: revision,
            }),
            None => Err(DbError::NotFound(document.wallet.to_string())),
        }
    }
}
