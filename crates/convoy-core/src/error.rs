//! # Validation Errors
//!
//! Rejections of caller-supplied values. These surface as `InvalidInput`
//! at the dispatch layer and are always raised before any store access.

use thiserror::Error;

/// A malformed or out-of-range input value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Capacity must be a positive integer.
    #[error("capacity must be positive, got {0}")]
    NonPositiveCapacity(i64),

    /// A required text field was empty or whitespace.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A text field exceeded its length limit.
    #[error("{field} must be at most {max} characters, got {actual}")]
    FieldTooLong {
        /// Field name.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// An identifier could not be parsed.
    #[error("invalid {kind} identifier: {value:?}")]
    InvalidIdentifier {
        /// Identifier namespace (`driver`, `shipment`, `offer`).
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// The allocation window must admit at least one driver.
    #[error("allocation window must be at least 1, got {0}")]
    InvalidWindow(usize),
}
