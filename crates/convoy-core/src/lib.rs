//! # convoy-core — Foundational Types for Convoy Dispatch
//!
//! This crate is the leaf of the convoy workspace. It defines the primitives
//! every other crate agrees on: identifier newtypes, validated capacities and
//! display strings, and the allocation configuration. It depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `DriverId`, `ShipmentId` and
//!    `OfferId` are distinct types. You cannot pass a driver identifier where
//!    an offer identifier is expected.
//!
//! 2. **Validated constructors.** `Capacity::new()` rejects non-positive
//!    values and `Label::new()` rejects blank strings, so malformed input is
//!    refused before any store access.
//!
//! 3. **Configuration is a value.** The allocation window is carried by
//!    [`AllocationConfig`] instead of a hard-coded constant.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `convoy-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod capacity;
pub mod config;
pub mod error;
pub mod identity;

pub use capacity::{Capacity, Label};
pub use config::{AllocationConfig, DEFAULT_ALLOCATION_WINDOW};
pub use error::ValidationError;
pub use identity::{DriverId, OfferId, ShipmentId};
