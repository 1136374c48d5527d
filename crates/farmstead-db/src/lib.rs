//! Data layer for the Farmstead game backend.
//!
//! Each player is one document. The store is the sole serialization point:
//! writes are compare-and-swap on a per-player revision, and a losing
//! writer reloads and recomputes.
//!
//! # Modules
//!
//! - [`store`] -- The [`UserStore`] trait and [`StoredUser`]
//! - [`user_store`] -- `PostgreSQL` implementation
//! - [`memory`] -- In-memory implementation
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod user_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use memory::MemoryUserStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use store::{StoredUser, UserStore};
pub use user_store::{PgUserStore, UserRow};
