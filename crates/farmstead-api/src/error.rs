//! Error types for the game API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body has the shape `{"error": "...", "status": N}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use farmstead_actions::ValidationError;
use farmstead_core::ServiceError;
use farmstead_ledger::LedgerError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request did not identify a wallet.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request body or parameters are malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The action is not allowed in the player's current state.
    #[error("{0}")]
    Rejected(#[from] ValidationError),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A submitted voucher was refused by the ledger.
    #[error("voucher refused: {0}")]
    VoucherRefused(String),

    /// Concurrent requests kept conflicting.
    #[error("busy: {0}")]
    Busy(String),

    /// The ledger could not be reached.
    #[error("ledger unavailable: {0}")]
    Upstream(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::BadSignature
            | LedgerError::MalformedSignature(_)
            | LedgerError::NonceMismatch { .. }
            | LedgerError::WrongDomain { .. } => Self::VoucherRefused(e.to_string()),
            LedgerError::Transport(_) | LedgerError::Timeout(_) | LedgerError::Lagged(_) => {
                Self::Upstream(e.to_string())
            }
            LedgerError::EmptyKey | LedgerError::InvalidKey(_) | LedgerError::Serialization(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(v) => Self::Rejected(v),
            ServiceError::Ledger(l) => l.into(),
            ServiceError::Contention { .. } => Self::Busy(e.to_string()),
            ServiceError::Db(_) | ServiceError::Reconcile(_) => Self::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) | Self::Rejected(_) | Self::VoucherRefused(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Busy(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
