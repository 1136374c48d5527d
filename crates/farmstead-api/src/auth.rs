//! Wallet identification from the `Authorization` header.
//!
//! The header carries the player's wallet address, either as
//! `Bearer 0x...` or as the bare address.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use farmstead_types::WalletAddress;

use crate::error::ApiError;

/// The authenticated player's wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet(pub WalletAddress);

/// Extract a wallet from an `Authorization` header value.
pub fn parse_authorization(value: &str) -> Result<WalletAddress, ApiError> {
    let trimmed = value.trim();
    let raw = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))
        .unwrap_or(trimmed);
    WalletAddress::parse(raw).map_err(|e| ApiError::Unauthorized(e.to_string()))
}

impl<S: Send + Sync> FromRequestParts<S> for Wallet {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("missing Authorization header".to_owned()))?;
        let value = header
            .to_str()
            .map_err(|e| ApiError::Unauthorized(format!("Authorization header is unreadable: {e}")))?;
        parse_authorization(value).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x6666666666666666666666666666666666666666";

    #[test]
    fn bearer_and_bare_forms_are_accepted() {
        let bearer = parse_authorization(&format!("Bearer {ADDR}")).ok();
        let bare = parse_authorization(ADDR).ok();
        assert!(bearer.is_some());
        assert_eq!(bearer, bare);
    }

    #[test]
    fn garbage_is_unauthorized() {
        assert!(matches!(
            parse_authorization("Bearer not-a-wallet"),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
