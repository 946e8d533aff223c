//! # Response Records
//!
//! Wire shapes for drivers, shipments and offers. Identifiers are bare
//! integers and statuses their canonical upper-case names, so the JSON
//! matches what existing dispatch clients already parse.

use chrono::{DateTime, Utc};
use convoy_dispatch::{Allocation, ShipmentOffers};
use convoy_state::{Driver, Offer, Shipment};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A registered driver.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverResponse {
    pub id: i64,
    pub name: String,
    pub capacity: i64,
    /// Offers ever extended to this driver.
    pub offer_count: u64,
    pub registered_at: DateTime<Utc>,
}

impl From<Driver> for DriverResponse {
    fn from(d: Driver) -> Self {
        Self {
            id: d.id.get(),
            name: d.name.into(),
            capacity: d.capacity.get(),
            offer_count: d.offer_count,
            registered_at: d.registered_at,
        }
    }
}

/// A shipment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShipmentResponse {
    pub id: i64,
    pub title: String,
    /// Weight the carrying truck must support.
    pub capacity: i64,
    /// One of `PENDING`, `OFFERS_READY`, `PENDING_ACCEPT`, `ACCEPTED`,
    /// `IN_PROGRESS`, `COMPLETE`.
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Shipment> for ShipmentResponse {
    fn from(s: Shipment) -> Self {
        Self {
            id: s.id.get(),
            title: s.title.into(),
            capacity: s.capacity.get(),
            status: s.status.as_str().to_string(),
            created_at: s.created_at,
        }
    }
}

/// An offer of one shipment to one driver.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfferResponse {
    pub id: i64,
    pub shipment_id: i64,
    pub driver_id: i64,
    /// One of `ACTIVE`, `ACCEPTED`, `PASSED`, `REVOKED`.
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Offer> for OfferResponse {
    fn from(o: Offer) -> Self {
        Self {
            id: o.id.get(),
            shipment_id: o.shipment_id.get(),
            driver_id: o.driver_id.get(),
            status: o.status.as_str().to_string(),
            created_at: o.created_at,
        }
    }
}

/// A new shipment and the offers extended for it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllocationResponse {
    pub shipment: ShipmentResponse,
    /// In selection order. Empty when no driver could carry the load.
    pub offers: Vec<OfferResponse>,
}

impl From<Allocation> for AllocationResponse {
    fn from(a: Allocation) -> Self {
        Self {
            shipment: a.shipment.into(),
            offers: a.offers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Offers visible for a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShipmentOffersResponse {
    /// Whether an acceptance has been recorded.
    pub accepted: bool,
    /// The accepted offer when `accepted`, otherwise the active offers.
    pub offers: Vec<OfferResponse>,
}

impl From<ShipmentOffers> for ShipmentOffersResponse {
    fn from(v: ShipmentOffers) -> Self {
        Self {
            accepted: v.accepted,
            offers: v.offers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Convert a list of domain records.
pub(crate) fn convert<T, R: From<T>>(items: Vec<T>) -> Vec<R> {
    items.into_iter().map(R::from).collect()
}
