//! # Shipment Record

use chrono::{DateTime, Utc};
use convoy_core::{Capacity, Label, ShipmentId};
use serde::{Deserialize, Serialize};

use crate::status::{ShipmentStatus, TransitionError};

/// A load that needs one driver with enough capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    /// Store-assigned identifier.
    pub id: ShipmentId,
    /// Display title.
    pub title: Label,
    /// Minimum truck capacity needed to carry the load.
    pub capacity: Capacity,
    /// Current lifecycle status.
    pub status: ShipmentStatus,
    /// When the shipment was created.
    pub created_at: DateTime<Utc>,
}

impl Shipment {
    /// Move to `to` if the transition table allows it.
    pub fn advance(&mut self, to: ShipmentStatus) -> Result<(), TransitionError> {
        self.status = self.status.transition_to(to)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Shipment {
        Shipment {
            id: ShipmentId::new(1),
            title: Label::new("title", "Pallets to Dock 4").unwrap(),
            capacity: Capacity::new(80).unwrap(),
            status: ShipmentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn advance_walks_the_table() {
        let mut s = pending();
        s.advance(ShipmentStatus::OffersReady).unwrap();
        s.advance(ShipmentStatus::PendingAccept).unwrap();
        s.advance(ShipmentStatus::Accepted).unwrap();
        assert_eq!(s.status, ShipmentStatus::Accepted);
    }

    #[test]
    fn rejected_advance_leaves_status_unchanged() {
        let mut s = pending();
        assert!(s.advance(ShipmentStatus::Accepted).is_err());
        assert_eq!(s.status, ShipmentStatus::Pending);
    }

    #[test]
    fn serializes_status_by_name() {
        let json = serde_json::to_value(pending()).unwrap();
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["capacity"], 80);
        assert_eq!(json["id"], 1);
    }
}
