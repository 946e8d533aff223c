//! # In-Memory Backend
//!
//! All three tables live behind a single `tokio::sync::RwLock`. The lock is
//! async because a [`MemoryTx`] holds the write guard across the `.await`
//! points of the dispatch recipe that owns it. While a transaction is open,
//! every other reader and writer waits, so uncommitted rows are never seen.
//!
//! Rollback replays an undo journal in reverse. Identifier sequences are not
//! rewound, matching how a database sequence behaves.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use convoy_core::{Capacity, DriverId, Label, OfferId, ShipmentId};
use convoy_state::{Driver, Offer, OfferStatus, Shipment, ShipmentStatus};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{EntityStore, StoreError, StoreStats, StoreTx};

#[derive(Debug, Default)]
struct Tables {
    drivers: BTreeMap<DriverId, Driver>,
    shipments: BTreeMap<ShipmentId, Shipment>,
    offers: BTreeMap<OfferId, Offer>,
    last_driver: i64,
    last_shipment: i64,
    last_offer: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

/// Thread-safe, cloneable in-memory entity store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntityStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let guard = Arc::clone(&self.tables).write_owned().await;
        Ok(MemoryTx {
            guard,
            journal: Vec::new(),
            finished: false,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_driver(&self, name: Label, capacity: Capacity) -> Result<Driver, StoreError> {
        let mut tables = self.tables.write().await;
        let id = DriverId::new(next(&mut tables.last_driver));
        let driver = Driver {
            id,
            name,
            capacity,
            offer_count: 0,
            registered_at: Utc::now(),
        };
        tables.drivers.insert(id, driver.clone());
        Ok(driver)
    }

    async fn get_driver(&self, id: DriverId) -> Result<Option<Driver>, StoreError> {
        Ok(self.tables.read().await.drivers.get(&id).cloned())
    }

    async fn get_shipment(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        Ok(self.tables.read().await.shipments.get(&id).cloned())
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        Ok(self.tables.read().await.offers.get(&id).cloned())
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>, StoreError> {
        Ok(self.tables.read().await.drivers.values().cloned().collect())
    }

    async fn list_shipments(&self) -> Result<Vec<Shipment>, StoreError> {
        Ok(self.tables.read().await.shipments.values().cloned().collect())
    }

    async fn list_offers(&self) -> Result<Vec<Offer>, StoreError> {
        Ok(self.tables.read().await.offers.values().cloned().collect())
    }

    async fn offers_for_shipment(
        &self,
        shipment: ShipmentId,
        status: OfferStatus,
    ) -> Result<Vec<Offer>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .offers
            .values()
            .filter(|o| o.shipment_id == shipment && o.status == status)
            .cloned()
            .collect())
    }

    async fn actionable_offers_for_driver(&self, driver: DriverId) -> Result<Vec<Offer>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .offers
            .values()
            .filter(|o| o.driver_id == driver && o.is_active())
            .filter(|o| {
                tables
                    .shipments
                    .get(&o.shipment_id)
                    .is_some_and(|s| s.status.is_open_for_offers())
            })
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let tables = self.tables.read().await;
        let mut stats = StoreStats {
            drivers: tables.drivers.len() as u64,
            ..StoreStats::default()
        };
        for s in tables.shipments.values() {
            *stats.shipments.entry(s.status).or_default() += 1;
        }
        for o in tables.offers.values() {
            *stats.offers.entry(o.status).or_default() += 1;
        }
        Ok(stats)
    }
}

// ─── Transactions ────────────────────────────────────────────────────

#[derive(Debug)]
enum Undo {
    RemoveShipment(ShipmentId),
    RemoveOffer(OfferId),
    RestoreOfferCount(DriverId, u64),
    RestoreShipmentStatus(ShipmentId, ShipmentStatus),
    RestoreOfferStatus(OfferId, OfferStatus),
}

/// An open in-memory transaction holding the store's write lock.
///
/// Dropping it without [`StoreTx::commit`] undoes every write it made.
#[derive(Debug)]
pub struct MemoryTx {
    guard: OwnedRwLockWriteGuard<Tables>,
    journal: Vec<Undo>,
    finished: bool,
}

impl MemoryTx {
    fn undo(&mut self) {
        let tables = &mut *self.guard;
        for entry in self.journal.drain(..).rev() {
            match entry {
                Undo::RemoveShipment(id) => {
                    tables.shipments.remove(&id);
                }
                Undo::RemoveOffer(id) => {
                    tables.offers.remove(&id);
                }
                Undo::RestoreOfferCount(id, count) => {
                    if let Some(d) = tables.drivers.get_mut(&id) {
                        d.offer_count = count;
                    }
                }
                Undo::RestoreShipmentStatus(id, status) => {
                    if let Some(s) = tables.shipments.get_mut(&id) {
                        s.status = status;
                    }
                }
                Undo::RestoreOfferStatus(id, status) => {
                    if let Some(o) = tables.offers.get_mut(&id) {
                        o.status = status;
                    }
                }
            }
        }
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if !self.finished && !self.journal.is_empty() {
            tracing::debug!(writes = self.journal.len(), "rolling back dropped transaction");
            self.undo();
        }
    }
}

impl StoreTx for MemoryTx {
    async fn insert_shipment(&mut self, title: Label, capacity: Capacity) -> Result<Shipment, StoreError> {
        let id = ShipmentId::new(next(&mut self.guard.last_shipment));
        let shipment = Shipment {
            id,
            title,
            capacity,
            status: ShipmentStatus::Pending,
            created_at: Utc::now(),
        };
        self.guard.shipments.insert(id, shipment.clone());
        self.journal.push(Undo::RemoveShipment(id));
        Ok(shipment)
    }

    async fn lock_shipment(&mut self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        Ok(self.guard.shipments.get(&id).cloned())
    }

    async fn lock_offer(&mut self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        Ok(self.guard.offers.get(&id).cloned())
    }

    async fn eligible_drivers(
        &mut self,
        min_capacity: Capacity,
        limit: usize,
    ) -> Result<Vec<Driver>, StoreError> {
        let mut eligible: Vec<Driver> = self
            .guard
            .drivers
            .values()
            .filter(|d| d.is_eligible_for(min_capacity))
            .cloned()
            .collect();
        eligible.sort_by_key(Driver::fairness_key);
        eligible.truncate(limit);
        Ok(eligible)
    }

    async fn increment_offer_count(&mut self, driver: DriverId) -> Result<(), StoreError> {
        let d = self
            .guard
            .drivers
            .get_mut(&driver)
            .ok_or(StoreError::MissingRow {
                entity: "driver",
                id: driver.get(),
            })?;
        self.journal.push(Undo::RestoreOfferCount(driver, d.offer_count));
        d.record_offer();
        Ok(())
    }

    async fn insert_offer(&mut self, shipment: ShipmentId, driver: DriverId) -> Result<Offer, StoreError> {
        if !self.guard.shipments.contains_key(&shipment) {
            return Err(StoreError::MissingRow {
                entity: "shipment",
                id: shipment.get(),
            });
        }
        if !self.guard.drivers.contains_key(&driver) {
            return Err(StoreError::MissingRow {
                entity: "driver",
                id: driver.get(),
            });
        }
        if self
            .guard
            .offers
            .values()
            .any(|o| o.shipment_id == shipment && o.driver_id == driver)
        {
            return Err(StoreError::Constraint(format!(
                "{shipment} already offered to {driver}"
            )));
        }

        let id = OfferId::new(next(&mut self.guard.last_offer));
        let offer = Offer {
            id,
            shipment_id: shipment,
            driver_id: driver,
            status: OfferStatus::Active,
            created_at: Utc::now(),
        };
        self.guard.offers.insert(id, offer.clone());
        self.journal.push(Undo::RemoveOffer(id));
        Ok(offer)
    }

    async fn compare_and_set_shipment_status(
        &mut self,
        id: ShipmentId,
        expected: ShipmentStatus,
        next: ShipmentStatus,
    ) -> Result<bool, StoreError> {
        match self.guard.shipments.get_mut(&id) {
            Some(s) if s.status == expected => {
                s.status = next;
                self.journal.push(Undo::RestoreShipmentStatus(id, expected));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn compare_and_set_offer_status(
        &mut self,
        id: OfferId,
        expected: OfferStatus,
        next: OfferStatus,
    ) -> Result<bool, StoreError> {
        match self.guard.offers.get_mut(&id) {
            Some(o) if o.status == expected => {
                o.status = next;
                self.journal.push(Undo::RestoreOfferStatus(id, expected));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_sibling_offers(&mut self, shipment: ShipmentId, keep: OfferId) -> Result<u64, StoreError> {
        let mut revoked = 0;
        for o in self.guard.offers.values_mut() {
            if o.shipment_id == shipment && o.id != keep && o.is_active() {
                o.status = OfferStatus::Revoked;
                self.journal.push(Undo::RestoreOfferStatus(o.id, OfferStatus::Active));
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        self.finished = true;
        self.journal.clear();
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), StoreError> {
        self.undo();
        self.finished = true;
        Ok(())
    }
}
