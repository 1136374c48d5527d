//! Game API server for the Farmstead backend.
//!
//! A thin HTTP layer over [`farmstead_core::GameService`]. Handlers parse
//! the caller's wallet and request body, call the service, and map
//! [`farmstead_core::ServiceError`] onto HTTP statuses.
//!
//! # Modules
//!
//! - [`handlers`] -- Endpoint handlers
//! - [`auth`] -- Wallet extraction from the `Authorization` header
//! - [`router`] -- Route table and middleware
//! - [`server`] -- Bind and serve with graceful shutdown
//! - [`state`] -- Shared [`AppState`]
//! - [`error`] -- [`ApiError`] and its JSON response shape

pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
