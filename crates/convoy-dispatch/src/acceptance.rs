//! # Acceptance State Machine
//!
//! Applies a driver's decision to one offer.
//!
//! **Pass** touches only the offer: `ACTIVE → PASSED`.
//!
//! **Accept** runs as one transaction:
//!
//! ```text
//! lock shipment ─▶ lock offer ─▶ classify
//!   ─▶ shipment OFFERS_READY → PENDING_ACCEPT   (compare-and-swap)
//!   ─▶ revoke every other ACTIVE offer      (PASSED offers stay terminal)
//!   ─▶ offer ACTIVE → ACCEPTED                   (compare-and-swap)
//!   ─▶ shipment PENDING_ACCEPT → ACCEPTED
//!   ─▶ commit
//! ```
//!
//! The shipment compare-and-swap is the linearization point: of any number
//! of concurrent accepts for one shipment, exactly one sees `OFFERS_READY`.
//! The rest observe a revoked offer or a closed shipment and fail with
//! [`DispatchError::Conflict`]. Responding again to an offer the caller has
//! already resolved fails with [`DispatchError::InvalidTransition`].

use convoy_core::{OfferId, ShipmentId};
use convoy_state::{Decision, OfferStatus, Shipment, ShipmentStatus, TransitionError};
use convoy_store::{EntityStore, StoreTx};

use crate::error::DispatchError;

/// Drives shipment and offer status transitions for driver decisions.
#[derive(Debug, Clone)]
pub struct AcceptanceMachine<S> {
    store: S,
}

impl<S: EntityStore> AcceptanceMachine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Apply `decision` to `offer_id`.
    #[tracing::instrument(skip_all, fields(offer = %offer_id, decision = %decision))]
    pub async fn respond(&self, offer_id: OfferId, decision: Decision) -> Result<(), DispatchError> {
        match decision {
            Decision::Accept => self.accept(offer_id).await,
            Decision::Pass => self.pass(offer_id).await,
        }
    }

    async fn pass(&self, offer_id: OfferId) -> Result<(), DispatchError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(DispatchError::StoreUnavailable)?;

        let offer = tx
            .lock_offer(offer_id)
            .await
            .map_err(DispatchError::StoreUnavailable)?
            .ok_or_else(|| DispatchError::not_found(offer_id))?;
        let next = offer.status.transition_to(OfferStatus::Passed)?;

        let swapped = tx
            .compare_and_set_offer_status(offer_id, offer.status, next)
            .await
            .map_err(DispatchError::StoreUnavailable)?;
        if !swapped {
            return Err(TransitionError::Offer {
                from: offer.status,
                to: next,
            }
            .into());
        }

        tx.commit().await.map_err(DispatchError::StoreUnavailable)?;
        tracing::info!(shipment = %offer.shipment_id, driver = %offer.driver_id, "offer passed");
        Ok(())
    }

    async fn accept(&self, offer_id: OfferId) -> Result<(), DispatchError> {
        // The offer→shipment link never changes, so it can be read unlocked.
        let shipment_id = self
            .store
            .get_offer(offer_id)
            .await
            .map_err(DispatchError::StoreUnavailable)?
            .ok_or_else(|| DispatchError::not_found(offer_id))?
            .shipment_id;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(DispatchError::StoreUnavailable)?;

        match accept_in(&mut tx, shipment_id, offer_id).await {
            Ok(revoked) => {
                tx.commit().await.map_err(DispatchError::StoreUnavailable)?;
                tracing::info!(shipment = %shipment_id, revoked, "offer accepted");
                Ok(())
            }
            Err(e) => {
                if matches!(e, DispatchError::Conflict { .. }) {
                    tracing::warn!(shipment = %shipment_id, error = %e, "acceptance lost the race");
                }
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed; transaction discarded");
                }
                Err(e)
            }
        }
    }
}

/// The locked part of an acceptance. Returns how many sibling offers were
/// revoked.
async fn accept_in<T: StoreTx>(
    tx: &mut T,
    shipment_id: ShipmentId,
    offer_id: OfferId,
) -> Result<u64, DispatchError> {
    let mut shipment = tx
        .lock_shipment(shipment_id)
        .await
        .map_err(DispatchError::StoreUnavailable)?
        .ok_or_else(|| DispatchError::not_found(shipment_id))?;
    let mut offer = tx
        .lock_offer(offer_id)
        .await
        .map_err(DispatchError::StoreUnavailable)?
        .ok_or_else(|| DispatchError::not_found(offer_id))?;

    match offer.status {
        OfferStatus::Active => {}
        OfferStatus::Revoked => {
            return Err(DispatchError::Conflict {
                shipment: shipment_id,
                reason: "offer was revoked by another acceptance",
            });
        }
        OfferStatus::Accepted | OfferStatus::Passed => {
            return Err(TransitionError::Offer {
                from: offer.status,
                to: OfferStatus::Accepted,
            }
            .into());
        }
    }
    if !shipment.status.is_open_for_offers() {
        return Err(DispatchError::Conflict {
            shipment: shipment_id,
            reason: "shipment already has an acceptance in progress or recorded",
        });
    }

    if !advance_shipment(tx, &mut shipment, ShipmentStatus::PendingAccept).await? {
        return Err(DispatchError::Conflict {
            shipment: shipment_id,
            reason: "shipment was claimed concurrently",
        });
    }

    let revoked = tx
        .revoke_sibling_offers(shipment_id, offer_id)
        .await
        .map_err(DispatchError::StoreUnavailable)?;

    let from = offer.status;
    offer.resolve(OfferStatus::Accepted)?;
    let swapped = tx
        .compare_and_set_offer_status(offer_id, from, offer.status)
        .await
        .map_err(DispatchError::StoreUnavailable)?;
    if !swapped {
        return Err(DispatchError::Conflict {
            shipment: shipment_id,
            reason: "offer changed during acceptance",
        });
    }

    if !advance_shipment(tx, &mut shipment, ShipmentStatus::Accepted).await? {
        return Err(DispatchError::Conflict {
            shipment: shipment_id,
            reason: "shipment changed during acceptance",
        });
    }

    Ok(revoked)
}

/// Validate `shipment.status → to` against the table, then write it with a
/// compare-and-swap. Returns `false` when the stored status had moved.
async fn advance_shipment<T: StoreTx>(
    tx: &mut T,
    shipment: &mut Shipment,
    to: ShipmentStatus,
) -> Result<bool, DispatchError> {
    let from = shipment.status;
    from.transition_to(to)?;
    let swapped = tx
        .compare_and_set_shipment_status(shipment.id, from, to)
        .await
        .map_err(DispatchError::StoreUnavailable)?;
    if swapped {
        shipment.advance(to)?;
    }
    Ok(swapped)
}
