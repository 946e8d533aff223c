//! # Offer Allocator
//!
//! Creates a shipment and offers it to a fair subset of eligible drivers,
//! all inside one store transaction:
//!
//! 1. Insert the shipment as `PENDING`. Its identifier comes from the insert.
//! 2. Select drivers whose capacity covers the load, fewest offers first,
//!    ties broken by ascending driver identifier, at most `window` of them.
//! 3. For each selected driver, bump the offer count and insert an `ACTIVE`
//!    offer.
//! 4. Advance the shipment to `OFFERS_READY`.
//!
//! With no eligible driver the shipment is committed as `PENDING` with no
//! offers. It is never re-scanned. Any store failure rolls everything back.

use convoy_core::{AllocationConfig, Capacity, Label};
use convoy_state::{Offer, Shipment, ShipmentStatus};
use convoy_store::{EntityStore, StoreError, StoreTx};

use crate::error::DispatchError;

/// A newly created shipment and the offers extended for it, in selection
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub shipment: Shipment,
    pub offers: Vec<Offer>,
}

/// Selects drivers for new shipments and creates their offers.
#[derive(Debug, Clone)]
pub struct Allocator<S> {
    store: S,
    config: AllocationConfig,
}

impl<S: EntityStore> Allocator<S> {
    pub fn new(store: S, config: AllocationConfig) -> Self {
        Self { store, config }
    }

    /// The configuration this allocator was built with.
    pub fn config(&self) -> AllocationConfig {
        self.config
    }

    /// Create a shipment and allocate its offers atomically.
    #[tracing::instrument(skip(self, title), fields(window = self.config.window()))]
    pub async fn create_shipment(&self, title: &str, capacity: i64) -> Result<Allocation, DispatchError> {
        let title = Label::new("title", title)?;
        let capacity = Capacity::new(capacity)?;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(DispatchError::StoreUnavailable)?;

        match self.allocate(&mut tx, title, capacity).await {
            Ok(allocation) => {
                tx.commit().await.map_err(DispatchError::AllocationFailed)?;
                tracing::info!(
                    shipment = %allocation.shipment.id,
                    status = %allocation.shipment.status,
                    offers = allocation.offers.len(),
                    "shipment allocated"
                );
                Ok(allocation)
            }
            Err(e) => {
                tracing::warn!(error = %e, "allocation failed, rolling back");
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed; transaction discarded");
                }
                Err(DispatchError::AllocationFailed(e))
            }
        }
    }

    async fn allocate(
        &self,
        tx: &mut S::Tx,
        title: Label,
        capacity: Capacity,
    ) -> Result<Allocation, StoreError> {
        let mut shipment = tx.insert_shipment(title, capacity).await?;
        let drivers = tx.eligible_drivers(capacity, self.config.window()).await?;
        if drivers.is_empty() {
            tracing::info!(shipment = %shipment.id, "no eligible drivers, shipment stays pending");
            return Ok(Allocation {
                shipment,
                offers: Vec::new(),
            });
        }

        let mut offers = Vec::with_capacity(drivers.len());
        for driver in &drivers {
            tx.increment_offer_count(driver.id).await?;
            offers.push(tx.insert_offer(shipment.id, driver.id).await?);
        }

        let from = shipment.status;
        shipment
            .advance(ShipmentStatus::OffersReady)
            .map_err(|e| StoreError::Constraint(e.to_string()))?;
        if !tx
            .compare_and_set_shipment_status(shipment.id, from, shipment.status)
            .await?
        {
            return Err(StoreError::Constraint(format!(
                "{} left {from} during allocation",
                shipment.id
            )));
        }

        Ok(Allocation { shipment, offers })
    }
}

#[cfg(test)]
mod tests {
    use convoy_core::DriverId;
    use convoy_state::OfferStatus;
    use convoy_store::MemoryStore;

    use super::*;
    use crate::error::ErrorKind;

    async fn store_with(capacities: &[i64]) -> MemoryStore {
        let store = MemoryStore::new();
        for (i, c) in capacities.iter().enumerate() {
            let name = Label::new("name", &format!("driver {i}")).unwrap();
            store.create_driver(name, Capacity::new(*c).unwrap()).await.unwrap();
        }
        store
    }

    fn ids(offers: &[Offer]) -> Vec<i64> {
        offers.iter().map(|o| o.driver_id.get()).collect()
    }

    #[tokio::test]
    async fn offers_only_drivers_that_can_carry() {
        let store = store_with(&[100, 50, 80]).await;
        let allocator = Allocator::new(store, AllocationConfig::default());
        let a = allocator.create_shipment("Steel coil", 80).await.unwrap();
        assert_eq!(ids(&a.offers), vec![1, 3]);
        assert_eq!(a.shipment.status, ShipmentStatus::OffersReady);
        assert!(a.offers.iter().all(|o| o.status == OfferStatus::Active));
    }

    #[tokio::test]
    async fn window_rotates_through_drivers() {
        let store = store_with(&[10, 10, 10, 10, 10]).await;
        let allocator = Allocator::new(store.clone(), AllocationConfig::new(2).unwrap());

        let first = allocator.create_shipment("one", 5).await.unwrap();
        let second = allocator.create_shipment("two", 5).await.unwrap();
        let third = allocator.create_shipment("three", 5).await.unwrap();
        assert_eq!(ids(&first.offers), vec![1, 2]);
        assert_eq!(ids(&second.offers), vec![3, 4]);
        assert_eq!(ids(&third.offers), vec![5, 1]);

        let d1 = store.get_driver(DriverId::new(1)).await.unwrap().unwrap();
        assert_eq!(d1.offer_count, 2);
    }

    #[tokio::test]
    async fn no_eligible_driver_commits_pending_shipment() {
        let store = store_with(&[10]).await;
        let allocator = Allocator::new(store.clone(), AllocationConfig::default());
        let a = allocator.create_shipment("Piano", 1000).await.unwrap();
        assert!(a.offers.is_empty());
        assert_eq!(a.shipment.status, ShipmentStatus::Pending);
        let stored = store.get_shipment(a.shipment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ShipmentStatus::Pending);
    }

    #[tokio::test]
    async fn invalid_input_touches_nothing() {
        let store = store_with(&[10]).await;
        let allocator = Allocator::new(store.clone(), AllocationConfig::default());

        let err = allocator.create_shipment("   ", 5).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = allocator.create_shipment("Bricks", 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert!(store.list_shipments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn identifiers_come_from_the_insert() {
        let store = store_with(&[10]).await;
        let allocator = Allocator::new(store, AllocationConfig::default());
        let a = allocator.create_shipment("Same title", 5).await.unwrap();
        let b = allocator.create_shipment("Same title", 5).await.unwrap();
        assert_ne!(a.shipment.id, b.shipment.id);
        assert!(b.offers.iter().all(|o| o.shipment_id == b.shipment.id));
    }
}
