//! NATS bridge to an external ledger.
//!
//! [`NatsLedger`] talks to a relay process that fronts the real contract.
//! Nonces are read with a request/reply round-trip and confirmed actions
//! arrive on a plain subscription. All payloads are JSON.
//!
//! # Subject Convention
//!
//! - **Nonce request:** `{prefix}.nonce` with body `{"user": "0x..."}`,
//!   reply `{"nonce": N}`.
//! - **Confirmed events:** `{prefix}.confirmed`, one [`ConfirmedAction`]
//!   per message.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use farmstead_types::WalletAddress;

use crate::error::LedgerError;
use crate::event::{ConfirmedAction, ConfirmedStream, EventSource, NonceSource};

/// Default subject prefix.
pub const DEFAULT_SUBJECT_PREFIX: &str = "farmstead.ledger";

#[derive(Debug, Serialize)]
struct NonceRequest<'a> {
    user: &'a WalletAddress,
}

#[derive(Debug, Deserialize)]
struct NonceReply {
    nonce: u64,
}

/// Ledger backend reached over NATS.
pub struct NatsLedger {
    client: async_nats::Client,
    prefix: String,
    timeout: Duration,
}

impl NatsLedger {
    /// Wrap an already connected client.
    pub fn new(client: async_nats::Client, prefix: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            timeout,
        }
    }

    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Transport`] if the connection fails.
    pub async fn connect(
        url: &str,
        prefix: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| LedgerError::Transport(format!("failed to connect to NATS at {url}: {e}")))?;
        info!(url, "Connected to NATS ledger relay");
        Ok(Self::new(client, prefix, timeout))
    }

    fn nonce_subject(&self) -> String {
        format!("{}.nonce", self.prefix)
    }

    fn confirmed_subject(&self) -> String {
        format!("{}.confirmed", self.prefix)
    }
}

#[async_trait]
impl NonceSource for NatsLedger {
    async fn current_nonce(&self, user: &WalletAddress) -> Result<u64, LedgerError> {
        let subject = self.nonce_subject();
        let body = serde_json::to_vec(&NonceRequest { user })?;
        let reply = tokio::time::timeout(self.timeout, self.client.request(subject.clone(), body.into()))
            .await
            .map_err(|_elapsed| {
                LedgerError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
            })?
            .map_err(|e| LedgerError::Transport(format!("nonce request on {subject} failed: {e}")))?;
        let parsed: NonceReply = serde_json::from_slice(&reply.payload)?;
        debug!(user = %user, nonce = parsed.nonce, "Fetched ledger nonce");
        Ok(parsed.nonce)
    }
}

#[async_trait]
impl EventSource for NatsLedger {
    async fn subscribe(&self) -> Result<ConfirmedStream, LedgerError> {
        let subject = self.confirmed_subject();
        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .map_err(|e| LedgerError::Transport(format!("failed to subscribe to {subject}: {e}")))?;
        info!(subject = %subject, "Subscribed to confirmed ledger events");
        let stream = subscriber.map(|msg| {
            serde_json::from_slice::<ConfirmedAction>(&msg.payload).map_err(LedgerError::from)
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn nonce_request_shape() {
        let user = WalletAddress::parse("0x2222222222222222222222222222222222222222").unwrap();
        let json = serde_json::to_string(&NonceRequest { user: &user }).unwrap();
        assert_eq!(
            json,
            r#"{"user":"0x2222222222222222222222222222222222222222"}"#
        );
    }

    #[test]
    fn confirmed_event_without_id_gets_one() {
        let raw = r#"{
            "sequence": 4,
            "user": "0x2222222222222222222222222222222222222222",
            "action_kind": "harvest",
            "data": "3",
            "confirmed_at": "2026-01-01T00:00:00Z"
        }"#;
        let event: ConfirmedAction = serde_json::from_str(raw).unwrap();
        assert_eq!(event.sequence, 4);
        assert_eq!(event.data.value(), 3);
    }

    #[tokio::test]
    #[ignore = "requires live NATS"]
    async fn live_subscription_opens() {
        let ledger = NatsLedger::connect(
            "nats://localhost:4222",
            DEFAULT_SUBJECT_PREFIX,
            Duration::from_secs(2),
        )
        .await
        .unwrap();
        assert!(ledger.subscribe().await.is_ok());
    }
}
