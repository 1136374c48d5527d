//! Axum router construction for the game API.
//!
//! Assembles all routes into a single [`Router`] with CORS and request
//! tracing enabled.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health`
/// - `GET /api/catalog`
/// - `GET /api/user/state`
/// - `POST /api/actions/voucher`
/// - `POST /api/dev/ledger/submit`, only when the state carries a
///   simulated ledger
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/catalog", get(handlers::get_catalog))
        .route("/api/user/state", get(handlers::get_user_state))
        .route("/api/actions/voucher", post(handlers::request_voucher));

    if state.dev_ledger.is_some() {
        router = router.route("/api/dev/ledger/submit", post(handlers::dev_submit));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
