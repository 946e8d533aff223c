//! # convoy-store — Entity Store
//!
//! Durable mapping from identifiers to [`Driver`], [`Shipment`] and
//! [`Offer`] records, plus the transaction primitive the dispatch layer
//! composes its multi-row recipes from.
//!
//! ## Contract
//!
//! - Every method on [`EntityStore`] is individually atomic and observes
//!   committed state only.
//! - [`EntityStore::begin`] opens a [`StoreTx`]. Writes made through it are
//!   invisible to other readers until [`StoreTx::commit`]. A transaction
//!   dropped without committing rolls back.
//! - `lock_*` reads take a row lock for the rest of the transaction. Callers
//!   that lock both a shipment and one of its offers lock the shipment first.
//! - Status writes are compare-and-swap: they report `false` and change
//!   nothing when the row is not in the expected status.
//! - Identifiers come from the insert itself and ascend in insertion order.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: tables behind one async `RwLock`. A transaction owns the
//!   write guard, so transactions are serialized and readers wait for commit.
//! - [`PgStore`]: PostgreSQL via `sqlx`, row locks via `SELECT … FOR UPDATE`.
//! - [`AnyStore`]: picks one of the two at startup.

pub mod any;
pub mod memory;
pub mod postgres;

use std::collections::BTreeMap;
use std::future::Future;

use convoy_core::{Capacity, DriverId, Label, OfferId, ShipmentId};
use convoy_state::{Driver, Offer, OfferStatus, Shipment, ShipmentStatus};
use thiserror::Error;

pub use any::{AnyStore, AnyTx};
pub use memory::{MemoryStore, MemoryTx};
pub use postgres::{PgStore, PgTx};

// ─── Errors ──────────────────────────────────────────────────────────

/// Failures raised by a store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or a connection could not be taken.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Embedded schema migrations failed to apply.
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A row that the transaction relies on does not exist.
    #[error("{entity} {id} does not exist")]
    MissingRow {
        /// Table name.
        entity: &'static str,
        /// Row identifier.
        id: i64,
    },

    /// A uniqueness or referential constraint was violated.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A stored row holds a value no record type accepts.
    #[error("corrupt {entity} {id}: {detail}")]
    Corrupt {
        /// Table name.
        entity: &'static str,
        /// Row identifier.
        id: i64,
        /// What was wrong with it.
        detail: String,
    },
}

// ─── Snapshot Counts ─────────────────────────────────────────────────

/// Row counts used by the metrics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Registered drivers.
    pub drivers: u64,
    /// Shipments per status. Statuses with no rows are absent.
    pub shipments: BTreeMap<ShipmentStatus, u64>,
    /// Offers per status. Statuses with no rows are absent.
    pub offers: BTreeMap<OfferStatus, u64>,
}

// ─── Traits ──────────────────────────────────────────────────────────

/// Shared handle to a driver/shipment/offer store.
///
/// Handles are cheap to clone and every clone refers to the same data.
pub trait EntityStore: Clone + Send + Sync + 'static {
    /// The transaction type opened by [`begin`](Self::begin).
    type Tx: StoreTx;

    /// Open a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, StoreError>> + Send;

    /// Whether the backend is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Insert a driver with a zero offer count.
    fn create_driver(
        &self,
        name: Label,
        capacity: Capacity,
    ) -> impl Future<Output = Result<Driver, StoreError>> + Send;

    /// Fetch one driver.
    fn get_driver(
        &self,
        id: DriverId,
    ) -> impl Future<Output = Result<Option<Driver>, StoreError>> + Send;

    /// Fetch one shipment.
    fn get_shipment(
        &self,
        id: ShipmentId,
    ) -> impl Future<Output = Result<Option<Shipment>, StoreError>> + Send;

    /// Fetch one offer.
    fn get_offer(
        &self,
        id: OfferId,
    ) -> impl Future<Output = Result<Option<Offer>, StoreError>> + Send;

    /// All drivers, ordered by identifier.
    fn list_drivers(&self) -> impl Future<Output = Result<Vec<Driver>, StoreError>> + Send;

    /// All shipments, ordered by identifier.
    fn list_shipments(&self) -> impl Future<Output = Result<Vec<Shipment>, StoreError>> + Send;

    /// All offers, ordered by identifier.
    fn list_offers(&self) -> impl Future<Output = Result<Vec<Offer>, StoreError>> + Send;

    /// Offers of one shipment in the given status, ordered by identifier.
    fn offers_for_shipment(
        &self,
        shipment: ShipmentId,
        status: OfferStatus,
    ) -> impl Future<Output = Result<Vec<Offer>, StoreError>> + Send;

    /// `Active` offers of one driver whose shipment is still `OffersReady`,
    /// ordered by identifier.
    fn actionable_offers_for_driver(
        &self,
        driver: DriverId,
    ) -> impl Future<Output = Result<Vec<Offer>, StoreError>> + Send;

    /// Row counts for metrics.
    fn stats(&self) -> impl Future<Output = Result<StoreStats, StoreError>> + Send;
}

/// An open transaction.
///
/// Nothing written through a transaction is visible to other callers until
/// [`commit`](Self::commit) succeeds.
pub trait StoreTx: Send {
    /// Insert a `Pending` shipment and return it with its new identifier.
    fn insert_shipment(
        &mut self,
        title: Label,
        capacity: Capacity,
    ) -> impl Future<Output = Result<Shipment, StoreError>> + Send;

    /// Read a shipment and hold its row lock until the transaction ends.
    fn lock_shipment(
        &mut self,
        id: ShipmentId,
    ) -> impl Future<Output = Result<Option<Shipment>, StoreError>> + Send;

    /// Read an offer and hold its row lock until the transaction ends.
    fn lock_offer(
        &mut self,
        id: OfferId,
    ) -> impl Future<Output = Result<Option<Offer>, StoreError>> + Send;

    /// Drivers with capacity at least `min_capacity`, ordered by ascending
    /// offer count then ascending identifier, at most `limit` of them.
    fn eligible_drivers(
        &mut self,
        min_capacity: Capacity,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Driver>, StoreError>> + Send;

    /// Add exactly one to a driver's offer count.
    fn increment_offer_count(
        &mut self,
        driver: DriverId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Insert an `Active` offer of `shipment` to `driver`.
    fn insert_offer(
        &mut self,
        shipment: ShipmentId,
        driver: DriverId,
    ) -> impl Future<Output = Result<Offer, StoreError>> + Send;

    /// Set a shipment's status to `next` if it is currently `expected`.
    fn compare_and_set_shipment_status(
        &mut self,
        id: ShipmentId,
        expected: ShipmentStatus,
        next: ShipmentStatus,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Set an offer's status to `next` if it is currently `expected`.
    fn compare_and_set_offer_status(
        &mut self,
        id: OfferId,
        expected: OfferStatus,
        next: OfferStatus,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Revoke every `Active` offer of `shipment` except `keep`. Returns how
    /// many offers were revoked.
    fn revoke_sibling_offers(
        &mut self,
        shipment: ShipmentId,
        keep: OfferId,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Make every write of this transaction visible.
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Discard every write of this transaction.
    fn rollback(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}
