//! The game service: the one place that loads, computes, and saves.
//!
//! Every operation follows the same cycle. Load the player's document with
//! its revision, compute on a private copy at one instant, then save with a
//! compare-and-swap on the revision. A conflicting save means another
//! request won; the whole cycle runs again from a fresh load, up to
//! [`MAX_ATTEMPTS`] times.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use farmstead_actions::{
    ActionPayload, ReconcileContext, ReconcileReport, ValidationContext, validate_action,
};
use farmstead_db::UserStore;
use farmstead_farm::{Catalog, GameRules, PlotStatus, compute_status, settle_pet_income};
use farmstead_ledger::{
    ConfirmedAction, NonceSource, Voucher, VoucherClaims, VoucherSigner,
};
use farmstead_types::{UserDocument, WalletAddress};

use crate::clock::Clock;
use crate::error::ServiceError;

/// Load/compute/save cycles attempted before giving up on a contended
/// document.
pub const MAX_ATTEMPTS: u32 = 3;

/// A player's farm as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmState {
    /// The stored document, refreshed to `server_time`.
    pub user: UserDocument,
    /// Derived status per plot, in the same order as `user.plots`.
    pub plots: Vec<PlotStatus>,
    /// Coins credited by pet income during this read.
    pub income_settled: u64,
    /// Store revision after this read.
    pub revision: u64,
    /// The instant everything was computed at.
    pub server_time: DateTime<Utc>,
}

/// Collaborators the service is built from.
pub struct ServiceDeps {
    /// Player document persistence.
    pub store: Arc<dyn UserStore>,
    /// Ledger nonce lookups.
    pub nonces: Arc<dyn NonceSource>,
    /// Voucher signer.
    pub signer: Arc<dyn VoucherSigner>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Voucher domain settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherDomain {
    /// Signing domain name.
    pub name: String,
    /// Chain id.
    pub chain_id: u64,
}

/// Game logic entry points shared by the HTTP API and the reconciler.
pub struct GameService {
    store: Arc<dyn UserStore>,
    nonces: Arc<dyn NonceSource>,
    signer: Arc<dyn VoucherSigner>,
    clock: Arc<dyn Clock>,
    catalog: Catalog,
    rules: GameRules,
    domain: VoucherDomain,
    rng: Mutex<SmallRng>,
}

impl GameService {
    /// Assemble a service.
    pub fn new(
        deps: ServiceDeps,
        catalog: Catalog,
        rules: GameRules,
        domain: VoucherDomain,
        rng: SmallRng,
    ) -> Self {
        Self {
            store: deps.store,
            nonces: deps.nonces,
            signer: deps.signer,
            clock: deps.clock,
            catalog,
            rules,
            domain,
            rng: Mutex::new(rng),
        }
    }

    /// Seed the game RNG from `seed`, or from the OS when `None`.
    pub fn rng_from_seed(seed: Option<u64>) -> SmallRng {
        seed.map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64)
    }

    /// The game tables in use.
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The rules in use.
    pub const fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// The current instant according to the service clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Load a player's farm, settle pet income, and refresh every plot.
    ///
    /// Pest rolls happen here, so the refreshed document is saved.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Db`] on store failure and
    /// [`ServiceError::Contention`] after [`MAX_ATTEMPTS`] conflicts.
    pub async fn load_state(&self, wallet: &WalletAddress) -> Result<FarmState, ServiceError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let now = self.clock.now();
            let stored = self.store.find_or_create(wallet, now).await?;
            let mut document = stored.document.clone();

            let income_settled = settle_pet_income(&mut document, &self.catalog, &self.rules, now);
            let plots = self.refresh_plots(&mut document, now).await;

            if document == stored.document {
                return Ok(FarmState {
                    user: document,
                    plots,
                    income_settled,
                    revision: stored.revision,
                    server_time: now,
                });
            }

            document.updated_at = now;
            match self.store.save(&document, stored.revision).await {
                Ok(revision) => {
                    debug!(wallet = %wallet, revision, income_settled, "Refreshed farm state");
                    return Ok(FarmState {
                        user: document,
                        plots,
                        income_settled,
                        revision,
                        server_time: now,
                    });
                }
                Err(e) if e.is_conflict() => {
                    debug!(wallet = %wallet, attempt, "State refresh lost a write race, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Contention {
            wallet: wallet.to_string(),
            attempts: MAX_ATTEMPTS,
        })
    }

    async fn refresh_plots(&self, document: &mut UserDocument, now: DateTime<Utc>) -> Vec<PlotStatus> {
        let t = now.timestamp();
        let mut rng = self.rng.lock().await;
        document
            .plots
            .iter_mut()
            .map(|plot| compute_status(plot, &self.catalog, &self.rules, t, &mut *rng))
            .collect()
    }

    /// Validate an action against the player's current state and issue a
    /// signed voucher for it.
    ///
    /// Nothing is written: the document only changes once the ledger
    /// confirms the action. Validation sees the stored document, so pet
    /// income not yet settled by a state read is not spendable.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] when the action is not allowed,
    /// and [`ServiceError::Ledger`] when the nonce lookup or signing fails.
    pub async fn request_voucher(
        &self,
        wallet: &WalletAddress,
        payload: &ActionPayload,
    ) -> Result<Voucher, ServiceError> {
        let now = self.clock.now();
        let document = self.store.find_or_create(wallet, now).await?.document;

        let ctx = ValidationContext {
            catalog: &self.catalog,
            rules: &self.rules,
            now,
        };
        let data = validate_action(&document, payload, &ctx).inspect_err(|e| {
            debug!(wallet = %wallet, action = %payload.kind(), reason = %e, "Action rejected");
        })?;

        let nonce = self.nonces.current_nonce(wallet).await?;
        let claims = VoucherClaims {
            domain: self.domain.name.clone(),
            chain_id: self.domain.chain_id,
            user: wallet.clone(),
            action_kind: payload.kind(),
            data,
            nonce,
        };
        let voucher = Voucher::issue(self.signer.as_ref(), claims, now)?;
        info!(
            voucher_id = %voucher.id,
            wallet = %wallet,
            action = %payload.kind(),
            data = %data,
            nonce,
            "Issued voucher"
        );
        Ok(voucher)
    }

    /// Apply a confirmed ledger action to the player's document.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Reconcile`] when the event cannot be decoded
    /// or names something that does not exist, [`ServiceError::Db`] on store
    /// failure, and [`ServiceError::Contention`] after [`MAX_ATTEMPTS`]
    /// conflicts.
    pub async fn apply_confirmed(
        &self,
        event: &ConfirmedAction,
    ) -> Result<ReconcileReport, ServiceError> {
        let ctx = ReconcileContext {
            catalog: &self.catalog,
            rules: &self.rules,
        };
        for attempt in 1..=MAX_ATTEMPTS {
            let now = self.clock.now();
            let stored = self.store.find_or_create(&event.user, now).await?;
            let mut document = stored.document;

            let report = {
                let mut rng = self.rng.lock().await;
                farmstead_actions::apply_confirmed(
                    &mut document,
                    event.action_kind,
                    event.data,
                    event.confirmed_at,
                    &ctx,
                    &mut *rng,
                )?
            };
            document.updated_at = now;

            match self.store.save(&document, stored.revision).await {
                Ok(revision) => {
                    if report.partial {
                        warn!(
                            sequence = event.sequence,
                            wallet = %event.user,
                            action = %event.action_kind,
                            "Confirmed action applied partially"
                        );
                    }
                    info!(
                        event_id = %event.id,
                        sequence = event.sequence,
                        wallet = %event.user,
                        action = %event.action_kind,
                        revision,
                        "Reconciled confirmed action"
                    );
                    return Ok(report);
                }
                Err(e) if e.is_conflict() => {
                    debug!(
                        sequence = event.sequence,
                        wallet = %event.user,
                        attempt,
                        "Reconcile lost a write race, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Contention {
            wallet: event.user.to_string(),
            attempts: MAX_ATTEMPTS,
        })
    }
}
