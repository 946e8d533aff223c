//! # Query Service
//!
//! Read-only projections over committed store state.

use convoy_core::{DriverId, ShipmentId};
use convoy_state::{Driver, Offer, OfferStatus, Shipment};
use convoy_store::EntityStore;

use crate::error::DispatchError;

/// Offers visible for one shipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentOffers {
    /// Whether the shipment has a recorded acceptance.
    pub accepted: bool,
    /// The accepted offer when `accepted`, otherwise every active offer.
    pub offers: Vec<Offer>,
}

/// Read-only views of drivers, shipments and offers.
#[derive(Debug, Clone)]
pub struct QueryService<S> {
    store: S,
}

impl<S: EntityStore> QueryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Offers of a shipment, as seen by whoever posted it.
    #[tracing::instrument(level = "debug", skip_all, fields(shipment = %id))]
    pub async fn shipment_offers(&self, id: ShipmentId) -> Result<ShipmentOffers, DispatchError> {
        let shipment = self
            .store
            .get_shipment(id)
            .await
            .map_err(DispatchError::StoreUnavailable)?
            .ok_or_else(|| DispatchError::not_found(id))?;

        let accepted = shipment.status.is_accepted();
        let status = if accepted {
            OfferStatus::Accepted
        } else {
            OfferStatus::Active
        };
        let offers = self
            .store
            .offers_for_shipment(id, status)
            .await
            .map_err(DispatchError::StoreUnavailable)?;
        Ok(ShipmentOffers { accepted, offers })
    }

    /// Offers a driver can still respond to.
    #[tracing::instrument(level = "debug", skip_all, fields(driver = %id))]
    pub async fn driver_offers(&self, id: DriverId) -> Result<Vec<Offer>, DispatchError> {
        self.store
            .get_driver(id)
            .await
            .map_err(DispatchError::StoreUnavailable)?
            .ok_or_else(|| DispatchError::not_found(id))?;
        self.store
            .actionable_offers_for_driver(id)
            .await
            .map_err(DispatchError::StoreUnavailable)
    }

    pub async fn drivers(&self) -> Result<Vec<Driver>, DispatchError> {
        self.store
            .list_drivers()
            .await
            .map_err(DispatchError::StoreUnavailable)
    }

    pub async fn shipments(&self) -> Result<Vec<Shipment>, DispatchError> {
        self.store
            .list_shipments()
            .await
            .map_err(DispatchError::StoreUnavailable)
    }

    pub async fn offers(&self) -> Result<Vec<Offer>, DispatchError> {
        self.store
            .list_offers()
            .await
            .map_err(DispatchError::StoreUnavailable)
    }
}
