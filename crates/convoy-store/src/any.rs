//! # Runtime Backend Selection
//!
//! The HTTP layer is not generic over the store, so it holds an
//! [`AnyStore`] chosen once at startup: Postgres when a database URL is
//! configured, memory otherwise.

use convoy_core::{Capacity, DriverId, Label, OfferId, ShipmentId};
use convoy_state::{Driver, Offer, OfferStatus, Shipment, ShipmentStatus};

use crate::memory::{MemoryStore, MemoryTx};
use crate::postgres::{PgStore, PgTx};
use crate::{EntityStore, StoreError, StoreStats, StoreTx};

/// Either store backend.
#[derive(Debug, Clone)]
pub enum AnyStore {
    /// In-process tables. State is lost on restart.
    Memory(MemoryStore),
    /// PostgreSQL.
    Postgres(PgStore),
}

impl AnyStore {
    /// Connect to Postgres when `database_url` is given, otherwise start an
    /// empty in-memory store. Migrations are applied on connect.
    pub async fn open(database_url: Option<&str>) -> Result<Self, StoreError> {
        match database_url {
            Some(url) => Ok(Self::Postgres(PgStore::connect(url, true).await?)),
            None => {
                tracing::warn!(
                    "no database URL configured, running with the in-memory store. \
                     State will not survive restarts."
                );
                Ok(Self::Memory(MemoryStore::new()))
            }
        }
    }

    /// Short backend name for logs.
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }
}

impl From<MemoryStore> for AnyStore {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<PgStore> for AnyStore {
    fn from(store: PgStore) -> Self {
        Self::Postgres(store)
    }
}

macro_rules! dispatch {
    ($self:ident, $s:ident => $call:expr) => {
        match $self {
            AnyStore::Memory($s) => $call,
            AnyStore::Postgres($s) => $call,
        }
    };
}

impl EntityStore for AnyStore {
    type Tx = AnyTx;

    async fn begin(&self) -> Result<AnyTx, StoreError> {
        Ok(match self {
            Self::Memory(s) => AnyTx::Memory(s.begin().await?),
            Self::Postgres(s) => AnyTx::Postgres(s.begin().await?),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        dispatch!(self, s => s.ping().await)
    }

    async fn create_driver(&self, name: Label, capacity: Capacity) -> Result<Driver, StoreError> {
        dispatch!(self, s => s.create_driver(name, capacity).await)
    }

    async fn get_driver(&self, id: DriverId) -> Result<Option<Driver>, StoreError> {
        dispatch!(self, s => s.get_driver(id).await)
    }

    async fn get_shipment(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        dispatch!(self, s => s.get_shipment(id).await)
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        dispatch!(self, s => s.get_offer(id).await)
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>, StoreError> {
        dispatch!(self, s => s.list_drivers().await)
    }

    async fn list_shipments(&self) -> Result<Vec<Shipment>, StoreError> {
        dispatch!(self, s => s.list_shipments().await)
    }

    async fn list_offers(&self) -> Result<Vec<Offer>, StoreError> {
        dispatch!(self, s => s.list_offers().await)
    }

    async fn offers_for_shipment(
        &self,
        shipment: ShipmentId,
        status: OfferStatus,
    ) -> Result<Vec<Offer>, StoreError> {
        dispatch!(self, s => s.offers_for_shipment(shipment, status).await)
    }

    async fn actionable_offers_for_driver(&self, driver: DriverId) -> Result<Vec<Offer>, StoreError> {
        dispatch!(self, s => s.actionable_offers_for_driver(driver).await)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        dispatch!(self, s => s.stats().await)
    }
}

/// A transaction on either backend.
#[derive(Debug)]
pub enum AnyTx {
    /// In-memory transaction.
    Memory(MemoryTx),
    /// PostgreSQL transaction.
    Postgres(PgTx),
}

macro_rules! dispatch_tx {
    ($self:ident, $t:ident => $call:expr) => {
        match $self {
            AnyTx::Memory($t) => $call,
            AnyTx::Postgres($t) => $call,
        }
    };
}

impl StoreTx for AnyTx {
    async fn insert_shipment(&mut self, title: Label, capacity: Capacity) -> Result<Shipment, StoreError> {
        dispatch_tx!(self, t => t.insert_shipment(title, capacity).await)
    }

    async fn lock_shipment(&mut self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        dispatch_tx!(self, t => t.lock_shipment(id).await)
    }

    async fn lock_offer(&mut self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        dispatch_tx!(self, t => t.lock_offer(id).await)
    }

    async fn eligible_drivers(
        &mut self,
        min_capacity: Capacity,
        limit: usize,
    ) -> Result<Vec<Driver>, StoreError> {
        dispatch_tx!(self, t => t.eligible_drivers(min_capacity, limit).await)
    }

    async fn increment_offer_count(&mut self, driver: DriverId) -> Result<(), StoreError> {
        dispatch_tx!(self, t => t.increment_offer_count(driver).await)
    }

    async fn insert_offer(&mut self, shipment: ShipmentId, driver: DriverId) -> Result<Offer, StoreError> {
        dispatch_tx!(self, t => t.insert_offer(shipment, driver).await)
    }

    async fn compare_and_set_shipment_status(
        &mut self,
        id: ShipmentId,
        expected: ShipmentStatus,
        next: ShipmentStatus,
    ) -> Result<bool, StoreError> {
        dispatch_tx!(self, t => t.compare_and_set_shipment_status(id, expected, next).await)
    }

    async fn compare_and_set_offer_status(
        &mut self,
        id: OfferId,
        expected: OfferStatus,
        next: OfferStatus,
    ) -> Result<bool, StoreError> {
        dispatch_tx!(self, t => t.compare_and_set_offer_status(id, expected, next).await)
    }

    async fn revoke_sibling_offers(&mut self, shipment: ShipmentId, keep: OfferId) -> Result<u64, StoreError> {
        dispatch_tx!(self, t => t.revoke_sibling_offers(shipment, keep).await)
    }

    async fn commit(self) -> Result<(), StoreError> {
        dispatch_tx!(self, t => t.commit().await)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        dispatch_tx!(self, t => t.rollback().await)
    }
}
