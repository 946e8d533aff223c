//! # convoy-dispatch — Offer Allocation and Acceptance
//!
//! The core of convoy: matching shipments to drivers and recording exactly
//! one binding acceptance per shipment.
//!
//! ## Components
//!
//! - [`Allocator`] (`allocator.rs`): inserts a shipment, picks up to
//!   `window` eligible drivers in fairness order, creates their offers and
//!   bumps their counters in one transaction.
//! - [`AcceptanceMachine`] (`acceptance.rs`): applies accept/pass decisions.
//!   Concurrent accepts for one shipment are linearized by the shipment row
//!   lock and a status compare-and-swap; exactly one wins.
//! - [`QueryService`] (`query.rs`): read-only projections.
//! - [`Dispatcher`] (`dispatcher.rs`): the three above over one store handle,
//!   plus driver registration.
//!
//! Every component is generic over [`convoy_store::EntityStore`] and takes
//! its store handle at construction. Nothing is retried internally; errors
//! carry a stable [`ErrorKind`] for the transport to map.

pub mod acceptance;
pub mod allocator;
pub mod dispatcher;
pub mod error;
pub mod query;

pub use acceptance::AcceptanceMachine;
pub use allocator::{Allocation, Allocator};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, ErrorKind};
pub use query::{QueryService, ShipmentOffers};
