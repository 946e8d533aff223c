//! # Dispatcher
//!
//! Single entry point bundling the allocator, acceptance machine and query
//! service over one shared store handle.

use convoy_core::{AllocationConfig, Capacity, DriverId, Label, OfferId, ShipmentId};
use convoy_state::{Decision, Driver, Offer, Shipment};
use convoy_store::EntityStore;

use crate::acceptance::AcceptanceMachine;
use crate::allocator::{Allocation, Allocator};
use crate::error::DispatchError;
use crate::query::{QueryService, ShipmentOffers};

/// All dispatch operations over one store.
#[derive(Debug, Clone)]
pub struct Dispatcher<S> {
    store: S,
    allocator: Allocator<S>,
    acceptance: AcceptanceMachine<S>,
    query: QueryService<S>,
}

impl<S: EntityStore> Dispatcher<S> {
    pub fn new(store: S, config: AllocationConfig) -> Self {
        Self {
            allocator: Allocator::new(store.clone(), config),
            acceptance: AcceptanceMachine::new(store.clone()),
            query: QueryService::new(store.clone()),
            store,
        }
    }

    /// The shared store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> AllocationConfig {
        self.allocator.config()
    }

    /// Register a driver with a zero offer count.
    #[tracing::instrument(skip(self, name))]
    pub async fn register_driver(&self, name: &str, capacity: i64) -> Result<Driver, DispatchError> {
        let name = Label::new("name", name)?;
        let capacity = Capacity::new(capacity)?;
        let driver = self
            .store
            .create_driver(name, capacity)
            .await
            .map_err(DispatchError::StoreUnavailable)?;
        tracing::info!(driver = %driver.id, "driver registered");
        Ok(driver)
    }

    /// Create a shipment and offer it to eligible drivers.
    pub async fn create_shipment(&self, title: &str, capacity: i64) -> Result<Allocation, DispatchError> {
        self.allocator.create_shipment(title, capacity).await
    }

    /// Apply a driver's accept or pass decision.
    pub async fn respond_to_offer(&self, offer: OfferId, decision: Decision) -> Result<(), DispatchError> {
        self.acceptance.respond(offer, decision).await
    }

    pub async fn shipment_offers(&self, shipment: ShipmentId) -> Result<ShipmentOffers, DispatchError> {
        self.query.shipment_offers(shipment).await
    }

    pub async fn driver_offers(&self, driver: DriverId) -> Result<Vec<Offer>, DispatchError> {
        self.query.driver_offers(driver).await
    }

    pub async fn drivers(&self) -> Result<Vec<Driver>, DispatchError> {
        self.query.drivers().await
    }

    pub async fn shipments(&self) -> Result<Vec<Shipment>, DispatchError> {
        self.query.shipments().await
    }

    pub async fn offers(&self) -> Result<Vec<Offer>, DispatchError> {
        self.query.offers().await
    }
}
