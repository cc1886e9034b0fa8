//! End-to-end game scenarios, from raw chain log to cache state.
//!
//! Each test wires the full pipeline (scripted chain, poller, router,
//! cache manager) with the default namespace configuration and checks
//! the cache the way API handlers would observe it. Clock-sensitive
//! tests run under tokio's paused clock.

use crate::mock_infrastructure::{
    data_word_u64, log_for, topic_address, topic_word_u64, FlakyCursorStore,
    ScriptedChainClient,
};
use ember_core::cache::CacheManager;
use ember_core::events::descriptor::{catalogue, ContractAddresses, EventDescriptor};
use ember_core::events::poller::{EventPoller, PollerConfig};
use ember_core::events::router::InvalidationRouter;
use ember_core::events::types::EventKind;
use ember_core::CacheSettings;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::{advance, Duration};

const HEROES: &str = "0x00000000000000000000000000000000000000a1";
const MARKETPLACE: &str = "0x00000000000000000000000000000000000000b2";
const ESSENCE: &str = "0x00000000000000000000000000000000000000c3";

const ALICE: &str = "0x1111111111111111111111111111111111111111";
const BOB: &str = "0x2222222222222222222222222222222222222222";

struct World {
    chain: Arc<ScriptedChainClient>,
    cache: Arc<CacheManager>,
    descriptors: Vec<EventDescriptor>,
    poller: EventPoller,
}

/// Builds the full pipeline and pins the cursor at `head`.
async fn world(head: u64) -> World {
    let chain = Arc::new(ScriptedChainClient::new(head));
    let cursor = Arc::new(FlakyCursorStore::new());
    let cache = Arc::new(CacheManager::new(CacheSettings::default()).unwrap());
    let router = Arc::new(InvalidationRouter::new(Arc::clone(&cache)));
    let descriptors = catalogue(&ContractAddresses {
        heroes: Some(HEROES.to_string()),
        marketplace: Some(MARKETPLACE.to_string()),
        essence: Some(ESSENCE.to_string()),
        activity: None,
    });
    let poller = EventPoller::new(
        Arc::clone(&chain) as Arc<dyn ember_core::chain::ChainClient>,
        cursor as Arc<dyn ember_core::cursor::CursorStore>,
        router,
        descriptors.clone(),
        PollerConfig::default(),
    );
    poller.tick().await;
    assert_eq!(poller.last_processed_block(), Some(head));
    World {
        chain,
        cache,
        descriptors,
        poller,
    }
}

fn descriptor_for(descriptors: &[EventDescriptor], kind: EventKind) -> EventDescriptor {
    descriptors
        .iter()
        .find(|d| d.kind == kind)
        .cloned()
        .unwrap_or_else(|| panic!("no descriptor for {kind}"))
}

#[tokio::test(start_paused = true)]
async fn listings_expire_at_the_ttl_boundary() {
    let cache = CacheManager::new(CacheSettings::default()).unwrap();
    cache.set("listings", "floor-price", &json!(950));

    // The listings namespace carries a 15 second ttl.
    advance(Duration::from_millis(14_999)).await;
    assert_eq!(
        cache.get::<Value>("listings", "floor-price"),
        Some(json!(950))
    );

    advance(Duration::from_millis(2)).await;
    assert_eq!(cache.get::<Value>("listings", "floor-price"), None);
}

#[tokio::test]
async fn hero_evolution_refreshes_exactly_one_hero() {
    let w = world(1_000).await;
    w.cache.set("heroes", "7", &json!({"stage": 1}));
    w.cache.set("heroes", "9", &json!({"stage": 3}));
    w.cache.set("metadata", "7", &json!({"image": "ipfs://stage1"}));
    w.cache.set("metadata", "9", &json!({"image": "ipfs://stage3"}));

    let evolved = descriptor_for(&w.descriptors, EventKind::HeroEvolved);
    w.chain.push_log(log_for(
        &evolved,
        vec![topic_word_u64(7)],
        &data_word_u64(2),
        1_001,
        0,
    ));
    w.chain.set_head(1_001);
    w.poller.tick().await;

    // Hero 7 is forgotten in both subscribed namespaces; hero 9 survives.
    assert!(w.cache.get_raw("heroes", "7").is_none());
    assert!(w.cache.get_raw("metadata", "7").is_none());
    assert!(w.cache.get_raw("heroes", "9").is_some());
    assert!(w.cache.get_raw("metadata", "9").is_some());
}

#[tokio::test]
async fn marketplace_sale_clears_the_listings_namespace() {
    let w = world(2_000).await;
    w.cache.set("listings", "recent", &json!([7, 8]));
    w.cache.set("listings", "floor-price", &json!(950));
    w.cache.set("stats", "total-volume", &json!(12_345));
    w.cache.set("heroes", "7", &json!({"stage": 2}));

    let sold = descriptor_for(&w.descriptors, EventKind::ListingSold);
    w.chain.push_log(log_for(
        &sold,
        vec![
            topic_word_u64(7),
            topic_address(ALICE),
            topic_address(BOB),
        ],
        &data_word_u64(950),
        2_001,
        0,
    ));
    w.chain.set_head(2_001);
    w.poller.tick().await;

    assert!(w.cache.get_raw("listings", "recent").is_none());
    assert!(w.cache.get_raw("listings", "floor-price").is_none());
    // Stats and hero data refresh on the Transfer that accompanies a sale.
    assert!(w.cache.get_raw("stats", "total-volume").is_some());
    assert!(w.cache.get_raw("heroes", "7").is_some());
}

#[tokio::test]
async fn essence_payment_forgets_both_balances() {
    let w = world(3_000).await;
    w.cache.set("essence", ALICE, &json!({"balance": "100"}));
    w.cache.set("essence", BOB, &json!({"balance": "50"}));
    w.cache.set("essence", "0x3333333333333333333333333333333333333333", &json!({"balance": "7"}));

    let transfer = descriptor_for(&w.descriptors, EventKind::EssenceTransferred);
    w.chain.push_log(log_for(
        &transfer,
        vec![topic_address(ALICE), topic_address(BOB)],
        &data_word_u64(25),
        3_001,
        0,
    ));
    w.chain.set_head(3_001);
    w.poller.tick().await;

    assert!(w.cache.get_raw("essence", ALICE).is_none());
    assert!(w.cache.get_raw("essence", BOB).is_none());
    assert!(w
        .cache
        .get_raw("essence", "0x3333333333333333333333333333333333333333")
        .is_some());
}

#[tokio::test]
async fn one_block_with_mixed_events_settles_consistently() {
    let w = world(4_000).await;
    w.cache.set("heroes", "7", &json!({"stage": 1, "owner": ALICE}));
    w.cache.set("listings", "recent", &json!([7]));
    w.cache.set("stats", "mint-count", &json!(41));

    let minted = descriptor_for(&w.descriptors, EventKind::HeroMinted);
    let created = descriptor_for(&w.descriptors, EventKind::ListingCreated);

    // Block 4001: hero 42 minted, then hero 7 listed for sale.
    w.chain.push_log(log_for(
        &minted,
        vec![topic_address(BOB), topic_word_u64(42)],
        "0x",
        4_001,
        0,
    ));
    w.chain.push_log(log_for(
        &created,
        vec![topic_word_u64(7), topic_address(ALICE)],
        &data_word_u64(950),
        4_001,
        1,
    ));
    w.chain.set_head(4_001);
    w.poller.tick().await;

    let status = w.poller.status();
    assert_eq!(status.events_processed, 2);
    assert_eq!(w.poller.last_processed_block(), Some(4_001));

    // The mint targets hero 42 only, so hero 7 stays cached.
    assert!(w.cache.get_raw("heroes", "7").is_some());
    // The mint wipes the stats keys it names; listing creation clears listings.
    assert!(w.cache.get_raw("listings", "recent").is_none());
    // Stats subscribe to mints by key, and nothing cached under key 42.
    assert!(w.cache.get_raw("stats", "mint-count").is_some());
}
