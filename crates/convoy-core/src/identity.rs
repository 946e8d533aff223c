//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the three record identifiers. Identifiers are
//! assigned by the entity store in insertion order, so their numeric order
//! is the registration order. The allocator relies on that order as the
//! fairness tie-breaker.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap a raw store-assigned identifier.
            pub fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// The raw numeric value.
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            /// Parse either the bare number (`"7"`) or the prefixed display
            /// form (`"driver:7"`).
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                let digits = trimmed
                    .strip_prefix(concat!($prefix, ":"))
                    .unwrap_or(trimmed);
                digits
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidIdentifier {
                        kind: $prefix,
                        value: s.to_string(),
                    })
            }
        }
    };
}

record_id!(
    /// Unique identifier for a registered driver (one driver, one truck).
    DriverId,
    "driver"
);

record_id!(
    /// Unique identifier for a shipment.
    ShipmentId,
    "shipment"
);

record_id!(
    /// Unique identifier for an offer of one shipment to one driver.
    OfferId,
    "offer"
);
