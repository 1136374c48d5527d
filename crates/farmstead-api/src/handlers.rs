//! REST API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/catalog` | Game tables and rules |
//! | `GET` | `/api/user/state` | The caller's refreshed farm |
//! | `POST` | `/api/actions/voucher` | Validate an action and issue a voucher |
//! | `POST` | `/api/dev/ledger/submit` | Confirm a voucher on the simulated ledger |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;

use farmstead_actions::ActionPayload;
use farmstead_core::FarmState;
use farmstead_farm::{Catalog, GameRules};
use farmstead_ledger::{ConfirmedAction, Voucher};

use crate::auth::Wallet;
use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct Health {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Server time as seen by the game clock.
    pub time: chrono::DateTime<chrono::Utc>,
}

/// Report that the server is up.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        time: state.service.now(),
    })
}

// ---------------------------------------------------------------------------
// GET /api/catalog
// ---------------------------------------------------------------------------

/// Static tables clients need to render the shop and plots.
#[derive(Debug, Serialize)]
pub struct CatalogResponse<'a> {
    /// Seeds, pets, prices, and reward tables.
    pub catalog: &'a Catalog,
    /// Rules in effect.
    pub rules: &'a GameRules,
}

/// Return the catalog and rules.
pub async fn get_catalog(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let body = serde_json::to_value(CatalogResponse {
        catalog: state.service.catalog(),
        rules: state.service.rules(),
    })
    .map_err(|e| ApiError::Internal(format!("JSON error: {e}")))?;
    Ok(Json(body))
}

// ---------------------------------------------------------------------------
// GET /api/user/state
// ---------------------------------------------------------------------------

/// Load, refresh, and return the caller's farm.
pub async fn get_user_state(
    State(state): State<Arc<AppState>>,
    Wallet(wallet): Wallet,
) -> Result<Json<FarmState>, ApiError> {
    let farm = state.service.load_state(&wallet).await?;
    Ok(Json(farm))
}

// ---------------------------------------------------------------------------
// POST /api/actions/voucher
// ---------------------------------------------------------------------------

/// Validate the posted action and return a signed voucher.
pub async fn request_voucher(
    State(state): State<Arc<AppState>>,
    Wallet(wallet): Wallet,
    payload: Result<Json<ActionPayload>, JsonRejection>,
) -> Result<Json<Voucher>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let voucher = state.service.request_voucher(&wallet, &payload).await?;
    Ok(Json(voucher))
}

// ---------------------------------------------------------------------------
// POST /api/dev/ledger/submit
// ---------------------------------------------------------------------------

/// Submit a voucher to the simulated ledger, as a wallet would on chain.
///
/// The confirmed event is reconciled asynchronously by the reconciler.
pub async fn dev_submit(
    State(state): State<Arc<AppState>>,
    voucher: Result<Json<Voucher>, JsonRejection>,
) -> Result<Json<ConfirmedAction>, ApiError> {
    let ledger = state
        .dev_ledger
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("simulated ledger is not enabled".to_owned()))?;
    let Json(voucher) = voucher.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let confirmed = ledger.submit(&voucher, state.service.now()).await?;
    Ok(Json(confirmed))
}
