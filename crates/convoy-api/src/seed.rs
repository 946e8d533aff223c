//! # Demo Drivers
//!
//! A fixed roster registered by `--seed-demo-drivers`, so a fresh
//! in-memory instance has someone to offer shipments to.

use convoy_dispatch::{DispatchError, Dispatcher};
use convoy_store::EntityStore;

/// Name and capacity of each sample driver, in registration order.
pub const DEMO_DRIVERS: [(&str, i64); 11] = [
    ("Flatbed Annie", 42),
    ("Rubber Duck", 54),
    ("Pig Pen", 84),
    ("Spider Mike", 99),
    ("Sweetie Pie", 108),
    ("Broken Bunny", 189),
    ("Trout Stalker", 216),
    ("Road Hog", 240),
    ("Scrap King", 250),
    ("Telecaster", 300),
    ("Eleanor Rigby", 350),
];

/// Register every demo driver. Returns how many were registered.
pub async fn seed_demo_drivers<S: EntityStore>(dispatcher: &Dispatcher<S>) -> Result<usize, DispatchError> {
    for (name, capacity) in DEMO_DRIVERS {
        dispatcher.register_driver(name, capacity).await?;
    }
    tracing::info!(count = DEMO_DRIVERS.len(), "demo drivers registered");
    Ok(DEMO_DRIVERS.len())
}

#[cfg(test)]
mod tests {
    use convoy_core::AllocationConfig;
    use convoy_store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn seeds_roster_in_order() {
        let d = Dispatcher::new(MemoryStore::new(), AllocationConfig::default());
        assert_eq!(seed_demo_drivers(&d).await.unwrap(), 11);

        let drivers = d.drivers().await.unwrap();
        let names: Vec<&str> = drivers.iter().map(|d| d.name.as_str()).collect();
        let expected: Vec<&str> = DEMO_DRIVERS.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, expected);

        // Road Hog and up.
        let allocation = d.create_shipment("Grand piano", 240).await.unwrap();
        assert_eq!(allocation.offers.len(), 4);
    }
}
