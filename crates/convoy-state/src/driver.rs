//! # Driver Record

use chrono::{DateTime, Utc};
use convoy_core::{Capacity, DriverId, Label};
use serde::{Deserialize, Serialize};

/// A registered driver and their single truck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    /// Store-assigned identifier.
    pub id: DriverId,
    /// Display name.
    pub name: Label,
    /// Maximum weight the driver's truck can carry.
    pub capacity: Capacity,
    /// Fairness counter: offers ever extended to this driver.
    pub offer_count: u64,
    /// When the driver registered.
    pub registered_at: DateTime<Utc>,
}

impl Driver {
    /// Whether this driver may be offered a shipment requiring `required`.
    pub fn is_eligible_for(&self, required: Capacity) -> bool {
        self.capacity.can_carry(required)
    }

    /// Count one more offer against this driver. Never decremented.
    pub fn record_offer(&mut self) {
        self.offer_count = self.offer_count.saturating_add(1);
    }

    /// Fairness sort key: fewest offers first, then oldest registration.
    pub fn fairness_key(&self) -> (u64, DriverId) {
        (self.offer_count, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(id: i64, capacity: i64, offer_count: u64) -> Driver {
        Driver {
            id: DriverId::new(id),
            name: Label::new("name", "Flatbed Annie").unwrap(),
            capacity: Capacity::new(capacity).unwrap(),
            offer_count,
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn eligibility_follows_capacity() {
        let d = driver(1, 50, 0);
        assert!(d.is_eligible_for(Capacity::new(50).unwrap()));
        assert!(!d.is_eligible_for(Capacity::new(51).unwrap()));
    }

    #[test]
    fn record_offer_increments_by_one() {
        let mut d = driver(1, 50, 4);
        d.record_offer();
        assert_eq!(d.offer_count, 5);
    }

    #[test]
    fn fairness_key_orders_by_count_then_id() {
        let mut drivers = vec![driver(3, 10, 1), driver(2, 10, 1), driver(9, 10, 0)];
        drivers.sort_by_key(Driver::fairness_key);
        let ids: Vec<i64> = drivers.iter().map(|d| d.id.get()).collect();
        assert_eq!(ids, vec![9, 2, 3]);
    }
}
