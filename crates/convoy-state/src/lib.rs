//! # convoy-state — Shipment and Offer State Machines
//!
//! Status enums for shipments and offers, each with an exhaustive
//! transition table, plus the three persisted record types.
//!
//! ## State Machines
//!
//! - **Shipment** (`status.rs`, `shipment.rs`):
//!   `Pending → OffersReady → PendingAccept → Accepted → InProgress → Complete`.
//!   The last two stages belong to fulfillment and are never entered by the
//!   allocation or acceptance logic.
//!
//! - **Offer** (`status.rs`, `offer.rs`): `Active` followed by exactly one of
//!   the terminal states `Accepted`, `Passed`, `Revoked`.
//!
//! ## Design
//!
//! Statuses are runtime enums with validated transitions rather than
//! typestate types because records round-trip through the entity store and
//! are loaded with whatever status was last committed. Every write goes
//! through `can_transition_to()`; no caller assigns a status field directly.
//! Unknown wire names are rejected by `from_name()`, never defaulted.

pub mod driver;
pub mod offer;
pub mod shipment;
pub mod status;

pub use driver::Driver;
pub use offer::Offer;
pub use shipment::Shipment;
pub use status::{Decision, OfferStatus, ShipmentStatus, TransitionError, UnknownStatus};
