//! Shared fixtures for the dispatch integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use convoy_core::{AllocationConfig, Capacity, DriverId, Label, OfferId, ShipmentId};
use convoy_dispatch::Dispatcher;
use convoy_state::{Driver, Offer, OfferStatus, Shipment, ShipmentStatus};
use convoy_store::{EntityStore, MemoryStore, MemoryTx, PgStore, StoreError, StoreStats, StoreTx};

pub fn memory_dispatcher() -> Dispatcher<MemoryStore> {
    Dispatcher::new(MemoryStore::new(), AllocationConfig::default())
}

/// A migrated, emptied Postgres store, or `None` when `DATABASE_URL` is
/// not set.
pub async fn postgres_store() -> Option<PgStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let store = PgStore::connect(&url, true)
        .await
        .expect("DATABASE_URL is set but the database is unreachable");
    reset(&store).await;
    Some(store)
}

pub async fn reset(store: &PgStore) {
    sqlx::query("TRUNCATE offers, shipments, drivers RESTART IDENTITY")
        .execute(store.pool())
        .await
        .expect("truncate failed");
}

// ─── Fault Injection ─────────────────────────────────────────────────

/// Memory store whose transactions fail on a chosen `insert_offer` call.
///
/// The budget is shared by every transaction opened from the handle: once
/// `offers_before_fault` offers have been inserted, the next insert fails.
#[derive(Debug, Clone)]
pub struct FaultyStore {
    inner: MemoryStore,
    remaining: Arc<AtomicUsize>,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore, offers_before_fault: usize) -> Self {
        Self {
            inner,
            remaining: Arc::new(AtomicUsize::new(offers_before_fault)),
        }
    }
}

#[derive(Debug)]
pub struct FaultyTx {
    inner: MemoryTx,
    remaining: Arc<AtomicUsize>,
}

impl EntityStore for FaultyStore {
    type Tx = FaultyTx;

    async fn begin(&self) -> Result<FaultyTx, StoreError> {
        Ok(FaultyTx {
            inner: self.inner.begin().await?,
            remaining: Arc::clone(&self.remaining),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn create_driver(&self, name: Label, capacity: Capacity) -> Result<Driver, StoreError> {
        self.inner.create_driver(name, capacity).await
    }

    async fn get_driver(&self, id: DriverId) -> Result<Option<Driver>, StoreError> {
        self.inner.get_driver(id).await
    }

    async fn get_shipment(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        self.inner.get_shipment(id).await
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        self.inner.get_offer(id).await
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>, StoreError> {
        self.inner.list_drivers().await
    }

    async fn list_shipments(&self) -> Result<Vec<Shipment>, StoreError> {
        self.inner.list_shipments().await
    }

    async fn list_offers(&self) -> Result<Vec<Offer>, StoreError> {
        self.inner.list_offers().await
    }

    async fn offers_for_shipment(
        &self,
        shipment: ShipmentId,
        status: OfferStatus,
    ) -> Result<Vec<Offer>, StoreError> {
        self.inner.offers_for_shipment(shipment, status).await
    }

    async fn actionable_offers_for_driver(&self, driver: DriverId) -> Result<Vec<Offer>, StoreError> {
        self.inner.actionable_offers_for_driver(driver).await
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        self.inner.stats().await
    }
}

impl StoreTx for FaultyTx {
    async fn insert_shipment(&mut self, title: Label, capacity: Capacity) -> Result<Shipment, StoreError> {
        self.inner.insert_shipment(title, capacity).await
    }

    async fn lock_shipment(&mut self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        self.inner.lock_shipment(id).await
    }

    async fn lock_offer(&mut self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        self.inner.lock_offer(id).await
    }

    async fn eligible_drivers(
        &mut self,
        min_capacity: Capacity,
        limit: usize,
    ) -> Result<Vec<Driver>, StoreError> {
        self.inner.eligible_drivers(min_capacity, limit).await
    }

    async fn increment_offer_count(&mut self, driver: DriverId) -> Result<(), StoreError> {
        self.inner.increment_offer_count(driver).await
    }

    async fn insert_offer(&mut self, shipment: ShipmentId, driver: DriverId) -> Result<Offer, StoreError> {
        let budget = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if budget.is_err() {
            return Err(StoreError::Unavailable("injected fault".to_string()));
        }
        self.inner.insert_offer(shipment, driver).await
    }

    async fn compare_and_set_shipment_status(
        &mut self,
        id: ShipmentId,
        expected: ShipmentStatus,
        next: ShipmentStatus,
    ) -> Result<bool, StoreError> {
        self.inner.compare_and_set_shipment_status(id, expected, next).await
    }

    async fn compare_and_set_offer_status(
        &mut self,
        id: OfferId,
        expected: OfferStatus,
        next: OfferStatus,
    ) -> Result<bool, StoreError> {
        self.inner.compare_and_set_offer_status(id, expected, next).await
    }

    async fn revoke_sibling_offers(&mut self, shipment: ShipmentId, keep: OfferId) -> Result<u64, StoreError> {
        self.inner.revoke_sibling_offers(shipment, keep).await
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.inner.rollback().await
    }
}
