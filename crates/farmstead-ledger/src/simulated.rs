//! In-process ledger for local runs and tests.
//!
//! [`SimulatedLedger`] plays the part of the on-chain contract: it checks a
//! voucher's domain, signature, and nonce, bumps the nonce, assigns a
//! sequence number, and broadcasts the resulting [`ConfirmedAction`] to
//! every subscriber.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt as _;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};

use farmstead_types::{EventId, WalletAddress};

use crate::error::LedgerError;
use crate::event::{ConfirmedAction, ConfirmedStream, EventSource, NonceSource};
use crate::voucher::{Voucher, VoucherSigner};

/// Capacity of the confirmed-event broadcast channel.
///
/// Subscribers that fall further behind than this receive a
/// [`LedgerError::Lagged`] item and resume from the oldest retained event.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct LedgerState {
    nonces: HashMap<WalletAddress, u64>,
    sequence: u64,
}

/// Contract stand-in holding nonces in memory.
pub struct SimulatedLedger {
    signer: Arc<dyn VoucherSigner>,
    domain: String,
    chain_id: u64,
    state: Mutex<LedgerState>,
    tx: broadcast::Sender<ConfirmedAction>,
}

impl SimulatedLedger {
    /// Create a ledger that accepts vouchers signed by `signer` for the
    /// given domain and chain.
    pub fn new(signer: Arc<dyn VoucherSigner>, domain: impl Into<String>, chain_id: u64) -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            signer,
            domain: domain.into(),
            chain_id,
            state: Mutex::new(LedgerState::default()),
            tx,
        }
    }

    /// Submit a voucher as the player's wallet would.
    ///
    /// On success the player's nonce advances by one and the confirmed event
    /// is broadcast. Having no subscribers is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::WrongDomain`], a signature error, or
    /// [`LedgerError::NonceMismatch`] when the voucher is not acceptable.
    pub async fn submit(
        &self,
        voucher: &Voucher,
        confirmed_at: DateTime<Utc>,
    ) -> Result<ConfirmedAction, LedgerError> {
        let claims = &voucher.claims;
        if claims.domain != self.domain || claims.chain_id != self.chain_id {
            return Err(LedgerError::WrongDomain {
                domain: claims.domain.clone(),
                chain_id: claims.chain_id,
                expected: format!("{}/{}", self.domain, self.chain_id),
            });
        }
        voucher.verify(self.signer.as_ref())?;

        let event = {
            let mut state = self.state.lock().await;
            let expected = state.nonces.get(&claims.user).copied().unwrap_or(0);
            if claims.nonce != expected {
                return Err(LedgerError::NonceMismatch {
                    user: claims.user.to_string(),
                    expected,
                    got: claims.nonce,
                });
            }
            state
                .nonces
                .insert(claims.user.clone(), expected.saturating_add(1));
            state.sequence = state.sequence.saturating_add(1);
            ConfirmedAction {
                id: EventId::new(),
                sequence: state.sequence,
                user: claims.user.clone(),
                action_kind: claims.action_kind,
                data: claims.data,
                confirmed_at,
            }
        };

        info!(
            voucher_id = %voucher.id,
            user = %event.user,
            action = %event.action_kind,
            sequence = event.sequence,
            "Simulated ledger confirmed action"
        );
        if self.tx.send(event.clone()).is_err() {
            debug!(sequence = event.sequence, "No confirmed-event subscribers");
        }
        Ok(event)
    }
}

#[async_trait]
impl NonceSource for SimulatedLedger {
    async fn current_nonce(&self, user: &WalletAddress) -> Result<u64, LedgerError> {
        Ok(self.state.lock().await.nonces.get(user).copied().unwrap_or(0))
    }
}

#[async_trait]
impl EventSource for SimulatedLedger {
    async fn subscribe(&self) -> Result<ConfirmedStream, LedgerError> {
        let rx = self.tx.subscribe();
        let stream = futures::stream::unfold(rx, |mut rx| async move {
            match rx.recv().await {
                Ok(event) => Some((Ok(event), rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    Some((Err(LedgerError::Lagged(skipped)), rx))
                }
                Err(broadcast::error::RecvError::Closed) => None,
            }
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::voucher::{HmacVoucherSigner, VoucherClaims};
    use farmstead_types::{ActionKind, EncodedAction};
    use futures::StreamExt as _;

    const DOMAIN: &str = "Farmstead";
    const CHAIN: u64 = 31_337;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0x1111111111111111111111111111111111111111").unwrap()
    }

    fn ledger() -> (SimulatedLedger, Arc<dyn VoucherSigner>) {
        let signer: Arc<dyn VoucherSigner> = Arc::new(HmacVoucherSigner::new("k").unwrap());
        (SimulatedLedger::new(Arc::clone(&signer), DOMAIN, CHAIN), signer)
    }

    fn voucher(signer: &dyn VoucherSigner, nonce: u64) -> Voucher {
        let claims = VoucherClaims {
            domain: DOMAIN.to_owned(),
            chain_id: CHAIN,
            user: wallet(),
            action_kind: ActionKind::Water,
            data: EncodedAction(0),
            nonce,
        };
        Voucher::issue(signer, claims, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn submit_bumps_nonce_and_broadcasts() {
        let (ledger, signer) = ledger();
        let mut events = ledger.subscribe().await.unwrap();

        assert_eq!(ledger.current_nonce(&wallet()).await.unwrap(), 0);
        let confirmed = ledger
            .submit(&voucher(signer.as_ref(), 0), Utc::now())
            .await
            .unwrap();
        assert_eq!(confirmed.sequence, 1);
        assert_eq!(ledger.current_nonce(&wallet()).await.unwrap(), 1);

        let received = events.next().await.unwrap().unwrap();
        assert_eq!(received, confirmed);
    }

    #[tokio::test]
    async fn replayed_voucher_is_rejected() {
        let (ledger, signer) = ledger();
        let v = voucher(signer.as_ref(), 0);
        ledger.submit(&v, Utc::now()).await.unwrap();
        let err = ledger.submit(&v, Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::NonceMismatch {
                expected: 1,
                got: 0,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn foreign_signature_is_rejected() {
        let (ledger, _) = ledger();
        let forger = HmacVoucherSigner::new("not-the-key").unwrap();
        let err = ledger
            .submit(&voucher(&forger, 0), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::BadSignature));
        assert_eq!(ledger.current_nonce(&wallet()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn wrong_chain_is_rejected() {
        let signer: Arc<dyn VoucherSigner> = Arc::new(HmacVoucherSigner::new("k").unwrap());
        let ledger = SimulatedLedger::new(Arc::clone(&signer), DOMAIN, 1);
        let err = ledger
            .submit(&voucher(signer.as_ref(), 0), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::WrongDomain { .. }));
    }
}
