//! # PostgreSQL Backend
//!
//! Runtime-checked `sqlx` queries over the schema in `migrations/`.
//! Statuses are stored as their canonical upper-snake names; a row holding
//! any other value is reported as [`StoreError::Corrupt`] rather than
//! coerced.
//!
//! Acceptance serializes on `SELECT … FOR UPDATE` of the shipment row and
//! then the offer row. Status writes carry the expected status in their
//! `WHERE` clause, so a write that lost a race affects zero rows.

use std::time::Duration;

use chrono::{DateTime, Utc};
use convoy_core::{Capacity, DriverId, Label, OfferId, ShipmentId};
use convoy_state::{Driver, Offer, OfferStatus, Shipment, ShipmentStatus};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use crate::{EntityStore, StoreError, StoreStats, StoreTx};

const DRIVER_COLUMNS: &str = "id, name, capacity, offer_count, registered_at";
const SHIPMENT_COLUMNS: &str = "id, title, capacity, status, created_at";
const OFFER_COLUMNS: &str = "id, shipment_id, driver_id, status, created_at";

/// Entity store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool. The schema must already be migrated.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` and, if `migrate` is set, apply the embedded
    /// migrations before returning.
    pub async fn connect(url: &str, migrate: bool) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tracing::info!("Connected to PostgreSQL");

        let store = Self { pool };
        if migrate {
            store.migrate().await?;
        }
        Ok(store)
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl EntityStore for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(PgTx { tx })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn create_driver(&self, name: Label, capacity: Capacity) -> Result<Driver, StoreError> {
        let row = sqlx::query_as::<_, DriverRow>(&format!(
            "INSERT INTO drivers (name, capacity, offer_count, registered_at)
             VALUES ($1, $2, 0, $3) RETURNING {DRIVER_COLUMNS}"
        ))
        .bind(name.as_str())
        .bind(capacity.get())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        row.into_record()
    }

    async fn get_driver(&self, id: DriverId) -> Result<Option<Driver>, StoreError> {
        sqlx::query_as::<_, DriverRow>(&format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .map(DriverRow::into_record)
            .transpose()
    }

    async fn get_shipment(&self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        sqlx::query_as::<_, ShipmentRow>(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .map(ShipmentRow::into_record)
        .transpose()
    }

    async fn get_offer(&self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        sqlx::query_as::<_, OfferRow>(&format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .map(OfferRow::into_record)
            .transpose()
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>, StoreError> {
        sqlx::query_as::<_, DriverRow>(&format!("SELECT {DRIVER_COLUMNS} FROM drivers ORDER BY id"))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(DriverRow::into_record)
            .collect()
    }

    async fn list_shipments(&self) -> Result<Vec<Shipment>, StoreError> {
        sqlx::query_as::<_, ShipmentRow>(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ShipmentRow::into_record)
        .collect()
    }

    async fn list_offers(&self) -> Result<Vec<Offer>, StoreError> {
        sqlx::query_as::<_, OfferRow>(&format!("SELECT {OFFER_COLUMNS} FROM offers ORDER BY id"))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(OfferRow::into_record)
            .collect()
    }

    async fn offers_for_shipment(
        &self,
        shipment: ShipmentId,
        status: OfferStatus,
    ) -> Result<Vec<Offer>, StoreError> {
        sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers
             WHERE shipment_id = $1 AND status = $2 ORDER BY id"
        ))
        .bind(shipment.get())
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(OfferRow::into_record)
        .collect()
    }

    async fn actionable_offers_for_driver(&self, driver: DriverId) -> Result<Vec<Offer>, StoreError> {
        sqlx::query_as::<_, OfferRow>(
            "SELECT o.id, o.shipment_id, o.driver_id, o.status, o.created_at
             FROM offers o JOIN shipments s ON s.id = o.shipment_id
             WHERE o.driver_id = $1 AND o.status = $2 AND s.status = $3
             ORDER BY o.id",
        )
        .bind(driver.get())
        .bind(OfferStatus::Active.as_str())
        .bind(ShipmentStatus::OffersReady.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(OfferRow::into_record)
        .collect()
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let drivers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM drivers")
            .fetch_one(&self.pool)
            .await?;
        let mut stats = StoreStats {
            drivers: drivers.max(0) as u64,
            ..StoreStats::default()
        };

        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM shipments GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        for (status, count) in rows {
            let status = ShipmentStatus::from_name(&status)
                .ok_or_else(|| corrupt("shipment", 0, format!("unknown status {status:?}")))?;
            stats.shipments.insert(status, count.max(0) as u64);
        }

        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM offers GROUP BY status")
                .fetch_all(&self.pool)
                .await?;
        for (status, count) in rows {
            let status = OfferStatus::from_name(&status)
                .ok_or_else(|| corrupt("offer", 0, format!("unknown status {status:?}")))?;
            stats.offers.insert(status, count.max(0) as u64);
        }

        Ok(stats)
    }
}

// ─── Transactions ────────────────────────────────────────────────────

/// An open PostgreSQL transaction. Dropping it rolls back.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PgTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgTx").finish_non_exhaustive()
    }
}

impl StoreTx for PgTx {
    async fn insert_shipment(&mut self, title: Label, capacity: Capacity) -> Result<Shipment, StoreError> {
        let row = sqlx::query_as::<_, ShipmentRow>(&format!(
            "INSERT INTO shipments (title, capacity, status, created_at)
             VALUES ($1, $2, $3, $4) RETURNING {SHIPMENT_COLUMNS}"
        ))
        .bind(title.as_str())
        .bind(capacity.get())
        .bind(ShipmentStatus::Pending.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;
        row.into_record()
    }

    async fn lock_shipment(&mut self, id: ShipmentId) -> Result<Option<Shipment>, StoreError> {
        sqlx::query_as::<_, ShipmentRow>(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(ShipmentRow::into_record)
        .transpose()
    }

    async fn lock_offer(&mut self, id: OfferId) -> Result<Option<Offer>, StoreError> {
        sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {OFFER_COLUMNS} FROM offers WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.get())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(OfferRow::into_record)
        .transpose()
    }

    async fn eligible_drivers(
        &mut self,
        min_capacity: Capacity,
        limit: usize,
    ) -> Result<Vec<Driver>, StoreError> {
        sqlx::query_as::<_, DriverRow>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers
             WHERE capacity >= $1 ORDER BY offer_count, id LIMIT $2"
        ))
        .bind(min_capacity.get())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&mut *self.tx)
        .await?
        .into_iter()
        .map(DriverRow::into_record)
        .collect()
    }

    async fn increment_offer_count(&mut self, driver: DriverId) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE drivers SET offer_count = offer_count + 1 WHERE id = $1")
            .bind(driver.get())
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow {
                entity: "driver",
                id: driver.get(),
            });
        }
        Ok(())
    }

    async fn insert_offer(&mut self, shipment: ShipmentId, driver: DriverId) -> Result<Offer, StoreError> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "INSERT INTO offers (shipment_id, driver_id, status, created_at)
             VALUES ($1, $2, $3, $4) RETURNING {OFFER_COLUMNS}"
        ))
        .bind(shipment.get())
        .bind(driver.get())
        .bind(OfferStatus::Active.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(constraint_or_database)?;
        row.into_record()
    }

    async fn compare_and_set_shipment_status(
        &mut self,
        id: ShipmentId,
        expected: ShipmentStatus,
        next: ShipmentStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE shipments SET status = $1 WHERE id = $2 AND status = $3")
            .bind(next.as_str())
            .bind(id.get())
            .bind(expected.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn compare_and_set_offer_status(
        &mut self,
        id: OfferId,
        expected: OfferStatus,
        next: OfferStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE offers SET status = $1 WHERE id = $2 AND status = $3")
            .bind(next.as_str())
            .bind(id.get())
            .bind(expected.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn revoke_sibling_offers(&mut self, shipment: ShipmentId, keep: OfferId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE offers SET status = $1
             WHERE shipment_id = $2 AND id <> $3 AND status = $4",
        )
        .bind(OfferStatus::Revoked.as_str())
        .bind(shipment.get())
        .bind(keep.get())
        .bind(OfferStatus::Active.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn constraint_or_database(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            StoreError::Constraint(db.message().to_string())
        }
        _ => StoreError::Database(err),
    }
}

fn corrupt(entity: &'static str, id: i64, detail: impl ToString) -> StoreError {
    StoreError::Corrupt {
        entity,
        id,
        detail: detail.to_string(),
    }
}

// ─── Row Mapping ─────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct DriverRow {
    id: i64,
    name: String,
    capacity: i64,
    offer_count: i64,
    registered_at: DateTime<Utc>,
}

impl DriverRow {
    fn into_record(self) -> Result<Driver, StoreError> {
        Ok(Driver {
            id: DriverId::new(self.id),
            name: Label::new("name", &self.name).map_err(|e| corrupt("driver", self.id, e))?,
            capacity: Capacity::new(self.capacity).map_err(|e| corrupt("driver", self.id, e))?,
            offer_count: u64::try_from(self.offer_count)
                .map_err(|_| corrupt("driver", self.id, format!("negative offer_count {}", self.offer_count)))?,
            registered_at: self.registered_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ShipmentRow {
    id: i64,
    title: String,
    capacity: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl ShipmentRow {
    fn into_record(self) -> Result<Shipment, StoreError> {
        Ok(Shipment {
            id: ShipmentId::new(self.id),
            title: Label::new("title", &self.title).map_err(|e| corrupt("shipment", self.id, e))?,
            capacity: Capacity::new(self.capacity).map_err(|e| corrupt("shipment", self.id, e))?,
            status: self
                .status
                .parse()
                .map_err(|e| corrupt("shipment", self.id, e))?,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: i64,
    shipment_id: i64,
    driver_id: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl OfferRow {
    fn into_record(self) -> Result<Offer, StoreError> {
        Ok(Offer {
            id: OfferId::new(self.id),
            shipment_id: ShipmentId::new(self.shipment_id),
            driver_id: DriverId::new(self.driver_id),
            status: self.status.parse().map_err(|e| corrupt("offer", self.id, e))?,
            created_at: self.created_at,
        })
    }
}
