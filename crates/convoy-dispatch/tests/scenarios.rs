//! End-to-end dispatch scenarios.
//!
//! Each scenario is written once against any [`EntityStore`] and run on the
//! in-memory backend. When `DATABASE_URL` is set the same scenarios also run,
//! one after another on an emptied schema, against Postgres.

mod common;

use std::sync::Arc;

use convoy_core::{AllocationConfig, DriverId, OfferId};
use convoy_dispatch::{Dispatcher, ErrorKind};
use convoy_state::{Decision, OfferStatus, ShipmentStatus};
use convoy_store::{EntityStore, MemoryStore};
use tokio::sync::Barrier;

use common::FaultyStore;

async fn offer_status<S: EntityStore>(d: &Dispatcher<S>, id: OfferId) -> OfferStatus {
    d.store().get_offer(id).await.unwrap().unwrap().status
}

async fn offer_count<S: EntityStore>(d: &Dispatcher<S>, id: DriverId) -> u64 {
    d.store().get_driver(id).await.unwrap().unwrap().offer_count
}

// ─── Scenarios ───────────────────────────────────────────────────────

async fn round_trip<S: EntityStore>(d: &Dispatcher<S>) {
    let a = d.register_driver("A", 100).await.unwrap();
    let b = d.register_driver("B", 50).await.unwrap();

    let allocation = d.create_shipment("Engine block", 80).await.unwrap();
    assert_eq!(allocation.offers.len(), 1);
    assert_eq!(allocation.offers[0].driver_id, a.id);
    assert_eq!(allocation.shipment.status, ShipmentStatus::OffersReady);
    assert!(d.driver_offers(b.id).await.unwrap().is_empty());

    let offer = allocation.offers[0].id;
    d.respond_to_offer(offer, Decision::Accept).await.unwrap();

    let view = d.shipment_offers(allocation.shipment.id).await.unwrap();
    assert!(view.accepted);
    assert_eq!(view.offers.len(), 1);
    assert_eq!(view.offers[0].id, offer);
    assert_eq!(view.offers[0].status, OfferStatus::Accepted);
    let shipment = d.store().get_shipment(allocation.shipment.id).await.unwrap().unwrap();
    assert_eq!(shipment.status, ShipmentStatus::Accepted);
    assert!(d.driver_offers(a.id).await.unwrap().is_empty());
}

async fn revocation<S: EntityStore>(d: &Dispatcher<S>) {
    let mut drivers = Vec::new();
    for name in ["one", "two", "three"] {
        drivers.push(d.register_driver(name, 100).await.unwrap());
    }

    let allocation = d.create_shipment("Lumber", 50).await.unwrap();
    assert_eq!(allocation.offers.len(), 3);
    for driver in &drivers {
        assert_eq!(offer_count(d, driver.id).await, 1);
    }

    let offers: Vec<OfferId> = allocation.offers.iter().map(|o| o.id).collect();
    d.respond_to_offer(offers[1], Decision::Accept).await.unwrap();
    assert_eq!(offer_status(d, offers[0]).await, OfferStatus::Revoked);
    assert_eq!(offer_status(d, offers[1]).await, OfferStatus::Accepted);
    assert_eq!(offer_status(d, offers[2]).await, OfferStatus::Revoked);

    let err = d.respond_to_offer(offers[0], Decision::Accept).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(offer_status(d, offers[0]).await, OfferStatus::Revoked);
}

async fn zero_eligible<S: EntityStore>(d: &Dispatcher<S>) {
    let driver = d.register_driver("small", 10).await.unwrap();
    let allocation = d.create_shipment("Locomotive", 1000).await.unwrap();
    assert!(allocation.offers.is_empty());
    assert_eq!(allocation.shipment.status, ShipmentStatus::Pending);

    let view = d.shipment_offers(allocation.shipment.id).await.unwrap();
    assert!(!view.accepted);
    assert!(view.offers.is_empty());
    assert_eq!(offer_count(d, driver.id).await, 0);
}

async fn idempotent_failure<S: EntityStore>(d: &Dispatcher<S>) {
    let a = d.register_driver("a", 100).await.unwrap();
    d.register_driver("b", 100).await.unwrap();
    let allocation = d.create_shipment("Cement", 10).await.unwrap();
    let mine = allocation.offers.iter().find(|o| o.driver_id == a.id).unwrap().id;

    d.respond_to_offer(mine, Decision::Accept).await.unwrap();
    let err = d.respond_to_offer(mine, Decision::Accept).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    let accepted: Vec<_> = d
        .offers()
        .await
        .unwrap()
        .into_iter()
        .filter(|o| o.status == OfferStatus::Accepted)
        .collect();
    assert_eq!(accepted.len(), 1);
    assert_eq!(offer_count(d, a.id).await, 1);
}

async fn pass_then_accept<S: EntityStore>(d: &Dispatcher<S>) {
    for name in ["early", "winner", "late"] {
        d.register_driver(name, 100).await.unwrap();
    }
    let allocation = d.create_shipment("Pallets", 20).await.unwrap();
    let offers: Vec<OfferId> = allocation.offers.iter().map(|o| o.id).collect();
    assert_eq!(offers.len(), 3);

    d.respond_to_offer(offers[0], Decision::Pass).await.unwrap();
    d.respond_to_offer(offers[1], Decision::Accept).await.unwrap();

    // A pass made before the acceptance stays terminal.
    assert_eq!(offer_status(d, offers[0]).await, OfferStatus::Passed);
    assert_eq!(offer_status(d, offers[1]).await, OfferStatus::Accepted);
    assert_eq!(offer_status(d, offers[2]).await, OfferStatus::Revoked);
    let shipment = d.store().get_shipment(allocation.shipment.id).await.unwrap().unwrap();
    assert_eq!(shipment.status, ShipmentStatus::Accepted);

    let view = d.shipment_offers(allocation.shipment.id).await.unwrap();
    assert!(view.accepted);
    assert_eq!(view.offers.len(), 1);
    assert_eq!(view.offers[0].id, offers[1]);

    let err = d.respond_to_offer(offers[0], Decision::Accept).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

async fn concurrent_accepts<S: EntityStore>(d: &Dispatcher<S>, contenders: usize) {
    for i in 0..contenders {
        d.register_driver(&format!("racer {i}"), 100).await.unwrap();
    }
    let allocation = d.create_shipment("Contested load", 10).await.unwrap();
    assert_eq!(allocation.offers.len(), contenders);

    let barrier = Arc::new(Barrier::new(contenders));
    let mut handles = Vec::new();
    for offer in &allocation.offers {
        let d = d.clone();
        let barrier = Arc::clone(&barrier);
        let id = offer.id;
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            d.respond_to_offer(id, Decision::Accept).await
        }));
    }

    let mut wins = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => wins += 1,
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::Conflict, "unexpected error: {e}");
                conflicts += 1;
            }
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(conflicts, contenders - 1);

    let mut accepted = 0;
    for offer in &allocation.offers {
        match offer_status(d, offer.id).await {
            OfferStatus::Accepted => accepted += 1,
            OfferStatus::Revoked => {}
            other => panic!("offer {} left in {other}", offer.id),
        }
    }
    assert_eq!(accepted, 1);
    let shipment = d.store().get_shipment(allocation.shipment.id).await.unwrap().unwrap();
    assert_eq!(shipment.status, ShipmentStatus::Accepted);
}

// ─── In-Memory ───────────────────────────────────────────────────────

#[tokio::test]
async fn round_trip_on_memory() {
    round_trip(&common::memory_dispatcher()).await;
}

#[tokio::test]
async fn revocation_on_memory() {
    revocation(&common::memory_dispatcher()).await;
}

#[tokio::test]
async fn zero_eligible_on_memory() {
    zero_eligible(&common::memory_dispatcher()).await;
}

#[tokio::test]
async fn idempotent_failure_on_memory() {
    idempotent_failure(&common::memory_dispatcher()).await;
}

#[tokio::test]
async fn pass_then_accept_on_memory() {
    pass_then_accept(&common::memory_dispatcher()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_accepts_on_memory() {
    for _ in 0..20 {
        concurrent_accepts(&common::memory_dispatcher(), 8).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_pass_and_accept_leaves_one_winner() {
    let d = common::memory_dispatcher();
    for i in 0..6 {
        d.register_driver(&format!("driver {i}"), 100).await.unwrap();
    }
    let allocation = d.create_shipment("Mixed", 10).await.unwrap();

    let barrier = Arc::new(Barrier::new(allocation.offers.len()));
    let mut handles = Vec::new();
    for (i, offer) in allocation.offers.iter().enumerate() {
        let d = d.clone();
        let barrier = Arc::clone(&barrier);
        let id = offer.id;
        let decision = if i % 2 == 0 { Decision::Accept } else { Decision::Pass };
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            (id, decision, d.respond_to_offer(id, decision).await)
        }));
    }

    let mut accept_wins = 0;
    let mut passed = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            (_, Decision::Accept, Ok(())) => accept_wins += 1,
            (_, Decision::Accept, Err(e)) => assert_eq!(e.kind(), ErrorKind::Conflict),
            // A pass either lands first or finds its offer already revoked.
            (id, Decision::Pass, Ok(())) => passed.push(id),
            (_, Decision::Pass, Err(e)) => assert_eq!(e.kind(), ErrorKind::InvalidTransition),
        }
    }
    assert_eq!(accept_wins, 1);

    let offers = d.offers().await.unwrap();
    assert_eq!(offers.iter().filter(|o| o.status == OfferStatus::Accepted).count(), 1);
    for offer in offers.iter().filter(|o| o.status != OfferStatus::Accepted) {
        let expected = if passed.contains(&offer.id) {
            OfferStatus::Passed
        } else {
            OfferStatus::Revoked
        };
        assert_eq!(offer.status, expected, "{}", offer.id);
    }
}

#[tokio::test]
async fn failed_allocation_rolls_back_everything() {
    let memory = MemoryStore::new();
    let d = Dispatcher::new(FaultyStore::new(memory.clone(), 2), AllocationConfig::default());
    for name in ["x", "y", "z"] {
        d.register_driver(name, 100).await.unwrap();
    }

    let err = d.create_shipment("Doomed", 10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailed);

    assert!(memory.list_shipments().await.unwrap().is_empty());
    assert!(memory.list_offers().await.unwrap().is_empty());
    for driver in memory.list_drivers().await.unwrap() {
        assert_eq!(driver.offer_count, 0, "{} was counted", driver.id);
    }
}

#[tokio::test]
async fn window_is_configurable() {
    let d = Dispatcher::new(MemoryStore::new(), AllocationConfig::new(3).unwrap());
    for i in 0..12 {
        d.register_driver(&format!("driver {i}"), 100).await.unwrap();
    }
    let allocation = d.create_shipment("Small batch", 10).await.unwrap();
    assert_eq!(allocation.offers.len(), 3);
    assert_eq!(d.config().window(), 3);

    let default = common::memory_dispatcher();
    for i in 0..12 {
        default.register_driver(&format!("driver {i}"), 100).await.unwrap();
    }
    assert_eq!(default.create_shipment("Batch", 10).await.unwrap().offers.len(), 10);
}

// ─── Postgres ────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn scenarios_on_postgres() {
    let Some(store) = common::postgres_store().await else {
        return;
    };
    let d = Dispatcher::new(store.clone(), AllocationConfig::default());

    round_trip(&d).await;
    common::reset(&store).await;
    revocation(&d).await;
    common::reset(&store).await;
    zero_eligible(&d).await;
    common::reset(&store).await;
    idempotent_failure(&d).await;
    common::reset(&store).await;
    pass_then_accept(&d).await;
    common::reset(&store).await;
    concurrent_accepts(&d, 8).await;
}
