//! # API Route Modules
//!
//! - `drivers`: registration and per-driver actionable offers.
//! - `shipments`: shipment creation (allocation) and per-shipment offers.
//! - `offers`: accept/pass decisions.
//! - `debug`: full table dumps.
//!
//! Handlers parse and validate input, call the dispatcher, and convert the
//! result. Dispatch rules live in `convoy-dispatch`.

pub mod debug;
pub mod drivers;
pub mod offers;
pub mod shipments;
