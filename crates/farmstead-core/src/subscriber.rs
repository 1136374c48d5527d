//! Reconciliation loop: confirmed ledger events in, document updates out.
//!
//! The loop never stops on a bad event. Undecodable messages, events that
//! name unknown plots or seeds, and store failures are logged and skipped;
//! only the end of the stream or the shutdown signal ends the loop.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt as _;
use tracing::{debug, error, info, warn};

use farmstead_ledger::{ConfirmedStream, EventSource, LedgerError};

use crate::error::ServiceError;
use crate::service::GameService;

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerStats {
    /// Events applied in full.
    pub applied: u64,
    /// Events applied with saturated shortfalls.
    pub partial: u64,
    /// Events that could not be applied.
    pub failed: u64,
    /// Stream items that were not events (lag notices, bad payloads).
    pub dropped: u64,
}

/// Subscribe to `source` and consume confirmed events until the stream
/// ends or `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServiceError::Ledger`] only if the subscription cannot be
/// opened.
pub async fn run_reconciler<F>(
    service: Arc<GameService>,
    source: Arc<dyn EventSource>,
    shutdown: F,
) -> Result<ReconcilerStats, ServiceError>
where
    F: Future<Output = ()> + Send,
{
    let events = source.subscribe().await?;
    Ok(reconcile_stream(service, events, shutdown).await)
}

/// Consume an already opened event stream.
///
/// Open the stream before anything can confirm actions (for example
/// before the HTTP server starts) so no event is missed.
pub async fn reconcile_stream<F>(
    service: Arc<GameService>,
    mut events: ConfirmedStream,
    shutdown: F,
) -> ReconcilerStats
where
    F: Future<Output = ()> + Send,
{
    let mut stats = ReconcilerStats::default();
    tokio::pin!(shutdown);
    info!("Reconciler started, awaiting confirmed actions");

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Reconciler received shutdown signal");
                break;
            }
            item = events.next() => {
                match item {
                    Some(Ok(event)) => {
                        debug!(sequence = event.sequence, wallet = %event.user, "Received confirmed action");
                        match service.apply_confirmed(&event).await {
                            Ok(report) if report.partial => {
                                stats.partial = stats.partial.saturating_add(1);
                            }
                            Ok(_) => stats.applied = stats.applied.saturating_add(1),
                            Err(e) => {
                                stats.failed = stats.failed.saturating_add(1);
                                error!(
                                    sequence = event.sequence,
                                    wallet = %event.user,
                                    action = %event.action_kind,
                                    data = %event.data,
                                    error = %e,
                                    "Failed to reconcile confirmed action"
                                );
                            }
                        }
                    }
                    Some(Err(LedgerError::Lagged(skipped))) => {
                        stats.dropped = stats.dropped.saturating_add(1);
                        error!(skipped, "Reconciler lagged behind the ledger, events lost");
                    }
                    Some(Err(e)) => {
                        stats.dropped = stats.dropped.saturating_add(1);
                        warn!(error = %e, "Skipping unreadable ledger message");
                    }
                    None => {
                        info!("Confirmed-event stream ended");
                        break;
                    }
                }
            }
        }
    }

    info!(
        applied = stats.applied,
        partial = stats.partial,
        failed = stats.failed,
        dropped = stats.dropped,
        "Reconciler stopped"
    );
    stats
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::service::{ServiceDeps, VoucherDomain};
    use async_trait::async_trait;
    use chrono::Utc;
    use farmstead_actions::ActionPayload;
    use farmstead_db::MemoryUserStore;
    use farmstead_farm::{Catalog, GameRules};
    use farmstead_ledger::{ConfirmedAction, HmacVoucherSigner, NonceSource, VoucherSigner};
    use farmstead_types::{ActionKind, EncodedAction, EventId, ItemId, WalletAddress};
    use futures::StreamExt as _;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0x5555555555555555555555555555555555555555").unwrap()
    }

    /// Replays a fixed list of stream items, then ends.
    struct Scripted(Vec<Result<ConfirmedAction, LedgerError>>);

    #[async_trait]
    impl EventSource for Scripted {
        async fn subscribe(&self) -> Result<ConfirmedStream, LedgerError> {
            let items: Vec<_> = self
                .0
                .iter()
                .map(|item| match item {
                    Ok(event) => Ok(event.clone()),
                    Err(_) => Err(LedgerError::Lagged(1)),
                })
                .collect();
            Ok(futures::stream::iter(items).boxed())
        }
    }

    #[async_trait]
    impl NonceSource for Scripted {
        async fn current_nonce(&self, _user: &WalletAddress) -> Result<u64, LedgerError> {
            Ok(0)
        }
    }

    fn event(sequence: u64, kind: ActionKind, payload: ActionPayload) -> ConfirmedAction {
        ConfirmedAction {
            id: EventId::new(),
            sequence,
            user: wallet(),
            action_kind: kind,
            data: payload.encode(),
            confirmed_at: Utc::now(),
        }
    }

    fn service(nonces: Arc<dyn NonceSource>) -> Arc<GameService> {
        let signer: Arc<dyn VoucherSigner> = Arc::new(HmacVoucherSigner::new("k").unwrap());
        Arc::new(GameService::new(
            ServiceDeps {
                store: Arc::new(MemoryUserStore::new()),
                nonces,
                signer,
                clock: Arc::new(ManualClock::at(Utc::now().timestamp())) as Arc<dyn Clock>,
            },
            Catalog::standard(),
            GameRules::default(),
            VoucherDomain {
                name: "Farmstead".to_owned(),
                chain_id: 1,
            },
            GameService::rng_from_seed(Some(3)),
        ))
    }

    #[tokio::test]
    async fn bad_events_do_not_stop_the_loop() {
        let source = Arc::new(Scripted(vec![
            Ok(event(
                1,
                ActionKind::BuyFertilizer,
                ActionPayload::BuyFertilizer { count: 2 },
            )),
            Err(LedgerError::Lagged(1)),
            Ok(ConfirmedAction {
                data: EncodedAction(99),
                ..event(2, ActionKind::Plant, ActionPayload::Checkin)
            }),
            Ok(event(3, ActionKind::Checkin, ActionPayload::Checkin)),
        ]));
        let svc = service(Arc::clone(&source) as Arc<dyn NonceSource>);

        let stats = run_reconciler(
            Arc::clone(&svc),
            source as Arc<dyn EventSource>,
            std::future::pending(),
        )
        .await
        .unwrap();

        assert_eq!(stats.applied, 2);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.failed, 1);
        let state = svc.load_state(&wallet()).await.unwrap();
        assert_eq!(state.user.inventory.count(ItemId::Fertilizer), 2);
        assert_eq!(state.user.tickets, 1);
    }

    #[tokio::test]
    async fn shutdown_stops_an_idle_loop() {
        let signer: Arc<dyn VoucherSigner> = Arc::new(HmacVoucherSigner::new("k").unwrap());
        let ledger = Arc::new(farmstead_ledger::SimulatedLedger::new(signer, "Farmstead", 1));
        let svc = service(Arc::clone(&ledger) as Arc<dyn NonceSource>);

        let stats = run_reconciler(svc, ledger as Arc<dyn EventSource>, async {})
            .await
            .unwrap();
        assert_eq!(stats, ReconcilerStats::default());
    }
}
