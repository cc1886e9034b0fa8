//! Integration tests for event-to-namespace invalidation routing.
//!
//! The routing table under test is the default game configuration:
//! marketplace and activity events wipe their namespaces, hero and
//! essence events remove the entries named by the decoded payload.

use ember_core::cache::CacheManager;
use ember_core::events::router::InvalidationRouter;
use ember_core::events::types::{
    EventKind, EventPayload, InvalidationEvent, ZERO_ADDRESS,
};
use ember_core::CacheSettings;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

const ALICE: &str = "0x1111111111111111111111111111111111111111";
const BOB: &str = "0x2222222222222222222222222222222222222222";

fn router() -> (Arc<CacheManager>, InvalidationRouter) {
    let cache = Arc::new(CacheManager::new(CacheSettings::default()).unwrap());
    let router = InvalidationRouter::new(Arc::clone(&cache));
    (cache, router)
}

fn event(kind: EventKind, payload: EventPayload) -> InvalidationEvent {
    InvalidationEvent {
        kind,
        payload,
        block_number: 1_000,
        transaction_hash: "0xabc".to_string(),
        timestamp: 1_700_000_000,
    }
}

#[test]
fn subscription_table_follows_namespace_config_order() {
    let (_, router) = router();

    assert_eq!(
        router.subscribers(EventKind::HeroEvolved),
        ["metadata", "heroes", "stats"]
    );
    assert_eq!(
        router.subscribers(EventKind::ListingSold),
        ["listings"]
    );
    assert_eq!(
        router.subscribers(EventKind::HeroMinted),
        ["metadata", "heroes", "stats"]
    );
    assert_eq!(
        router.subscribers(EventKind::HeroStaked),
        ["heroes", "stats"]
    );
    assert_eq!(
        router.subscribers(EventKind::EssenceBurned),
        ["essence"]
    );
    assert_eq!(
        router.subscribers(EventKind::ActivityCreated),
        ["activity"]
    );
}

#[test]
fn key_scoped_event_removes_only_the_named_entry() {
    let (cache, router) = router();
    cache.set("heroes", "7", &json!({"name": "Pyra"}));
    cache.set("heroes", "8", &json!({"name": "Aqua"}));

    router.route(&event(
        EventKind::HeroTransferred,
        EventPayload {
            token_id: Some("7".to_string()),
            from: Some(ALICE.to_string()),
            to: Some(BOB.to_string()),
            ..Default::default()
        },
    ));

    assert!(cache.get_raw("heroes", "7").is_none());
    assert!(cache.get_raw("heroes", "8").is_some());
}

#[test]
fn namespace_scoped_event_clears_every_subscriber() {
    let (cache, router) = router();
    cache.set("listings", "floor-price", &json!(950));
    cache.set("listings", "recent", &json!([1, 2, 3]));
    cache.set("stats", "total-volume", &json!(12_345));
    cache.set("heroes", "7", &json!({"name": "Pyra"}));

    router.route(&event(
        EventKind::ListingSold,
        EventPayload {
            token_id: Some("7".to_string()),
            price: Some("950".to_string()),
            ..Default::default()
        },
    ));

    assert!(cache.get_raw("listings", "floor-price").is_none());
    assert!(cache.get_raw("listings", "recent").is_none());
    // Stats and heroes refresh on hero events, not marketplace sales.
    assert!(cache.get_raw("stats", "total-volume").is_some());
    assert!(cache.get_raw("heroes", "7").is_some());
}

#[test]
fn hero_transfer_refreshes_metadata_for_that_token() {
    let (cache, router) = router();
    cache.set("metadata", "42", &json!({"image": "ipfs://a"}));
    cache.set("metadata", "43", &json!({"image": "ipfs://b"}));

    router.route(&event(
        EventKind::HeroTransferred,
        EventPayload {
            token_id: Some("42".to_string()),
            from: Some(ALICE.to_string()),
            to: Some(BOB.to_string()),
            ..Default::default()
        },
    ));

    assert!(cache.get_raw("metadata", "42").is_none());
    assert!(cache.get_raw("metadata", "43").is_some());
}

#[test]
fn essence_transfer_invalidates_both_parties() {
    let (cache, router) = router();
    cache.set("essence", ALICE, &json!({"balance": "100"}));
    cache.set("essence", BOB, &json!({"balance": "50"}));

    router.route(&event(
        EventKind::EssenceTransferred,
        EventPayload {
            from: Some(ALICE.to_string()),
            to: Some(BOB.to_string()),
            amount: Some("25".to_string()),
            ..Default::default()
        },
    ));

    assert!(cache.get_raw("essence", ALICE).is_none());
    assert!(cache.get_raw("essence", BOB).is_none());
}

#[test]
fn essence_mint_skips_the_zero_address() {
    let (cache, router) = router();
    cache.set("essence", ALICE, &json!({"balance": "100"}));
    cache.set("essence", BOB, &json!({"balance": "50"}));

    router.route(&event(
        EventKind::EssenceTransferred,
        EventPayload {
            from: Some(ZERO_ADDRESS.to_string()),
            to: Some(BOB.to_string()),
            amount: Some("25".to_string()),
            ..Default::default()
        },
    ));

    assert!(cache.get_raw("essence", ALICE).is_some());
    assert!(cache.get_raw("essence", BOB).is_none());
}

#[test]
fn key_scoped_event_without_keys_clears_the_namespace() {
    let (cache, router) = router();
    cache.set("heroes", "7", &json!({"name": "Pyra"}));
    cache.set("heroes", "8", &json!({"name": "Aqua"}));

    router.route(&event(EventKind::HeroTransferred, EventPayload::default()));

    assert!(cache.get_raw("heroes", "7").is_none());
    assert!(cache.get_raw("heroes", "8").is_none());
}

#[test]
fn listener_failure_does_not_stop_invalidation() {
    let (cache, router) = router();
    cache.set("heroes", "7", &json!({"name": "Pyra"}));

    let calls = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&calls);
    router.subscribe(
        EventKind::HeroTransferred,
        Box::new(move |_| {
            *counter.lock() += 1;
            Err("listener exploded".into())
        }),
    );

    router.route(&event(
        EventKind::HeroTransferred,
        EventPayload {
            token_id: Some("7".to_string()),
            ..Default::default()
        },
    ));

    assert_eq!(*calls.lock(), 1);
    assert!(cache.get_raw("heroes", "7").is_none());
}

#[test]
fn metadata_ignores_staking_events() {
    let (cache, router) = router();
    cache.set("metadata", "7", &json!({"image": "ipfs://x"}));

    // Staking events only touch the heroes namespace.
    router.route(&event(
        EventKind::HeroStaked,
        EventPayload {
            token_id: Some("7".to_string()),
            owner: Some(ALICE.to_string()),
            ..Default::default()
        },
    ));

    assert!(cache.get_raw("metadata", "7").is_some());
}
