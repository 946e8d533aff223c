//! # Offer Record

use chrono::{DateTime, Utc};
use convoy_core::{DriverId, OfferId, ShipmentId};
use serde::{Deserialize, Serialize};

use crate::status::{OfferStatus, TransitionError};

/// A proposal of one shipment to one driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Store-assigned identifier.
    pub id: OfferId,
    /// The shipment on offer.
    pub shipment_id: ShipmentId,
    /// The driver it was offered to.
    pub driver_id: DriverId,
    /// Current status.
    pub status: OfferStatus,
    /// When the allocator created the offer.
    pub created_at: DateTime<Utc>,
}

impl Offer {
    /// Move to `to` if the transition table allows it.
    pub fn resolve(&mut self, to: OfferStatus) -> Result<(), TransitionError> {
        self.status = self.status.transition_to(to)?;
        Ok(())
    }

    /// Whether the driver can still respond.
    pub fn is_active(&self) -> bool {
        self.status == OfferStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> Offer {
        Offer {
            id: OfferId::new(1),
            shipment_id: ShipmentId::new(1),
            driver_id: DriverId::new(1),
            status: OfferStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn resolve_once() {
        let mut o = active();
        o.resolve(OfferStatus::Passed).unwrap();
        assert!(!o.is_active());
        let err = o.resolve(OfferStatus::Accepted).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Offer {
                from: OfferStatus::Passed,
                to: OfferStatus::Accepted,
            }
        );
        assert_eq!(o.status, OfferStatus::Passed);
    }
}
