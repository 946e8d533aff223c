//! # Dispatch Errors
//!
//! Every failure a dispatch operation can report, each with a stable
//! [`ErrorKind`] code that transports map to their own status codes.

use convoy_core::{ShipmentId, ValidationError};
use convoy_state::TransitionError;
use convoy_store::StoreError;
use thiserror::Error;

/// Failures of allocation, acceptance and query operations.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A caller-supplied value was rejected before any store access.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The named record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The offer is already in a state the decision cannot leave.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Another driver's acceptance closed the shipment first.
    #[error("{shipment} is no longer open for offers: {reason}")]
    Conflict {
        /// The contended shipment.
        shipment: ShipmentId,
        /// What the losing caller observed.
        reason: &'static str,
    },

    /// The store could not be reached or a transaction could not commit.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// Allocation aborted and was rolled back.
    #[error("allocation failed: {0}")]
    AllocationFailed(#[source] StoreError),
}

/// Stable classification of a [`DispatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    InvalidTransition,
    Conflict,
    StoreUnavailable,
    AllocationFailed,
}

impl ErrorKind {
    /// Machine-readable code, distinct per kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::Conflict => "CONFLICT",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::AllocationFailed => "ALLOCATION_FAILED",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl DispatchError {
    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidTransition(_) => ErrorKind::InvalidTransition,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::AllocationFailed(_) => ErrorKind::AllocationFailed,
        }
    }

    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use convoy_core::OfferId;
    use convoy_state::OfferStatus;

    use super::*;

    #[test]
    fn codes_are_distinct() {
        let kinds = [
            ErrorKind::InvalidInput,
            ErrorKind::NotFound,
            ErrorKind::InvalidTransition,
            ErrorKind::Conflict,
            ErrorKind::StoreUnavailable,
            ErrorKind::AllocationFailed,
        ];
        let codes: HashSet<&str> = kinds.iter().map(ErrorKind::code).collect();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn messages_name_the_record() {
        assert_eq!(
            DispatchError::not_found(OfferId::new(9)).to_string(),
            "offer:9 not found"
        );
        let err = DispatchError::from(TransitionError::Offer {
            from: OfferStatus::Passed,
            to: OfferStatus::Passed,
        });
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(err.to_string(), "invalid offer transition: PASSED -> PASSED");
    }

    #[test]
    fn validation_maps_to_invalid_input() {
        let err = DispatchError::from(ValidationError::NonPositiveCapacity(0));
        assert_eq!(err.kind().code(), "INVALID_INPUT");
    }
}
