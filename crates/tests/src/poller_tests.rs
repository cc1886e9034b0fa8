//! Integration tests for the event poller.
//!
//! These tests verify the poller's behavioral contracts:
//! - First chain contact pins the cursor to the head instead of replaying history
//! - The cursor only advances after a fully successful tick, so partial
//!   fetch failures are retried over the same range
//! - Events are routed oldest-first across contracts
//! - Decode failures skip the log without aborting the tick
//! - Admin replays never move the cursor
//!
//! All tests drive `tick()` and `process_range()` directly against a
//! scripted chain; the interval loop is exercised separately through the
//! runtime tests in ember-core.

use crate::mock_infrastructure::{
    log_for, topic_address, topic_word_u64, FlakyCursorStore, ScriptedChainClient,
};
use ember_core::cache::CacheManager;
use ember_core::events::descriptor::{catalogue, ContractAddresses, EventDescriptor};
use ember_core::events::poller::{EventPoller, PollerConfig, PollerError};
use ember_core::events::router::InvalidationRouter;
use ember_core::events::types::{EventKind, InvalidationEvent};
use ember_core::CacheSettings;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

const HEROES: &str = "0x00000000000000000000000000000000000000a1";
const MARKETPLACE: &str = "0x00000000000000000000000000000000000000b2";

const ALICE: &str = "0x1111111111111111111111111111111111111111";
const BOB: &str = "0x2222222222222222222222222222222222222222";

fn test_contracts() -> ContractAddresses {
    ContractAddresses {
        heroes: Some(HEROES.to_string()),
        marketplace: Some(MARKETPLACE.to_string()),
        essence: None,
        activity: None,
    }
}

fn descriptor_for(descriptors: &[EventDescriptor], kind: EventKind) -> EventDescriptor {
    descriptors
        .iter()
        .find(|d| d.kind == kind)
        .cloned()
        .unwrap_or_else(|| panic!("no descriptor for {kind}"))
}

struct Fixture {
    chain: Arc<ScriptedChainClient>,
    cursor: Arc<FlakyCursorStore>,
    cache: Arc<CacheManager>,
    router: Arc<InvalidationRouter>,
    descriptors: Vec<EventDescriptor>,
    poller: EventPoller,
}

fn fixture(head: u64) -> Fixture {
    let chain = Arc::new(ScriptedChainClient::new(head));
    let cursor = Arc::new(FlakyCursorStore::new());
    let cache = Arc::new(CacheManager::new(CacheSettings::default()).unwrap());
    let router = Arc::new(InvalidationRouter::new(Arc::clone(&cache)));
    let descriptors = catalogue(&test_contracts());
    let poller = EventPoller::new(
        Arc::clone(&chain) as Arc<dyn ember_core::chain::ChainClient>,
        Arc::clone(&cursor) as Arc<dyn ember_core::cursor::CursorStore>,
        Arc::clone(&router),
        descriptors.clone(),
        PollerConfig::default(),
    );
    Fixture {
        chain,
        cursor,
        cache,
        router,
        descriptors,
        poller,
    }
}

/// Collects every routed event so ordering can be asserted.
fn record_events(router: &InvalidationRouter) -> Arc<Mutex<Vec<InvalidationEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    for kind in EventKind::all() {
        let sink = Arc::clone(&sink);
        router.subscribe(
            *kind,
            Box::new(move |event| {
                sink.lock().push(event.clone());
                Ok(())
            }),
        );
    }
    seen
}

#[tokio::test]
async fn first_tick_pins_cursor_to_head() {
    let fx = fixture(500);
    fx.poller.tick().await;

    assert_eq!(fx.poller.last_processed_block(), Some(500));
    assert_eq!(fx.cursor.saved_block(), Some(500));
    assert_eq!(fx.poller.status().events_processed, 0);
}

#[tokio::test]
async fn head_fetch_failure_skips_the_tick() {
    let fx = fixture(500);
    fx.chain.fail_next_head_fetches(1);
    fx.poller.tick().await;

    assert_eq!(fx.poller.last_processed_block(), None);
    assert_eq!(fx.poller.status().fetch_failures, 1);

    fx.poller.tick().await;
    assert_eq!(fx.poller.last_processed_block(), Some(500));
}

#[tokio::test]
async fn resumes_from_persisted_cursor_and_processes_the_gap() {
    let fx = fixture(92);
    // Rebuild the poller around a store that already holds a cursor.
    let cursor = Arc::new(FlakyCursorStore::with_block(90));
    let poller = EventPoller::new(
        Arc::clone(&fx.chain) as Arc<dyn ember_core::chain::ChainClient>,
        Arc::clone(&cursor) as Arc<dyn ember_core::cursor::CursorStore>,
        Arc::clone(&fx.router),
        fx.descriptors.clone(),
        PollerConfig::default(),
    );

    fx.cache.set("heroes", "7", &json!({"stage": 1}));
    let transfer = descriptor_for(&fx.descriptors, EventKind::HeroTransferred);
    fx.chain.push_log(log_for(
        &transfer,
        vec![
            topic_address(ALICE),
            topic_address(BOB),
            topic_word_u64(7),
        ],
        "0x",
        91,
        0,
    ));

    poller.restore_cursor().await;
    assert_eq!(poller.last_processed_block(), Some(90));

    poller.tick().await;
    assert_eq!(poller.last_processed_block(), Some(92));
    assert_eq!(poller.status().events_processed, 1);
    assert!(fx.cache.get_raw("heroes", "7").is_none());
}

#[tokio::test]
async fn events_route_oldest_first_across_contracts() {
    let fx = fixture(100);
    fx.poller.tick().await;
    let seen = record_events(&fx.router);

    let transfer = descriptor_for(&fx.descriptors, EventKind::HeroTransferred);
    let sold = descriptor_for(&fx.descriptors, EventKind::ListingSold);

    // Pushed deliberately out of chain order.
    fx.chain.push_log(log_for(
        &sold,
        vec![
            topic_word_u64(9),
            topic_address(ALICE),
            topic_address(BOB),
        ],
        &topic_word_u64(1_000),
        102,
        0,
    ));
    fx.chain.push_log(log_for(
        &transfer,
        vec![
            topic_address(ALICE),
            topic_address(BOB),
            topic_word_u64(9),
        ],
        "0x",
        101,
        3,
    ));
    fx.chain.push_log(log_for(
        &transfer,
        vec![
            topic_address(BOB),
            topic_address(ALICE),
            topic_word_u64(4),
        ],
        "0x",
        101,
        1,
    ));
    fx.chain.set_head(102);

    fx.poller.tick().await;

    let seen = seen.lock();
    let order: Vec<(u64, EventKind)> = seen
        .iter()
        .map(|event| (event.block_number, event.kind))
        .collect();
    assert_eq!(
        order,
        vec![
            (101, EventKind::HeroTransferred),
            (101, EventKind::HeroTransferred),
            (102, EventKind::ListingSold),
        ]
    );
    // Same block orders by log index.
    assert_eq!(seen[0].payload.token_id.as_deref(), Some("4"));
    assert_eq!(seen[1].payload.token_id.as_deref(), Some("9"));
}

#[tokio::test]
async fn partial_fetch_failure_holds_the_cursor_for_retry() {
    let fx = fixture(100);
    fx.poller.tick().await;

    let transfer = descriptor_for(&fx.descriptors, EventKind::HeroTransferred);
    fx.chain.push_log(log_for(
        &transfer,
        vec![
            topic_address(ALICE),
            topic_address(BOB),
            topic_word_u64(5),
        ],
        "0x",
        105,
        0,
    ));
    fx.chain.set_head(110);
    fx.chain.fail_address(MARKETPLACE);

    fx.poller.tick().await;
    // Hero events still routed, but the range stays pending.
    assert_eq!(fx.poller.last_processed_block(), Some(100));
    assert!(fx.poller.status().fetch_failures > 0);
    assert_eq!(fx.poller.status().events_processed, 1);

    fx.chain.heal_address(MARKETPLACE);
    fx.poller.tick().await;
    assert_eq!(fx.poller.last_processed_block(), Some(110));
}

#[tokio::test]
async fn decode_failure_skips_the_log_but_completes_the_tick() {
    let fx = fixture(200);
    fx.poller.tick().await;

    let transfer = descriptor_for(&fx.descriptors, EventKind::HeroTransferred);
    // Transfer with a missing token id topic cannot decode.
    fx.chain.push_log(log_for(
        &transfer,
        vec![topic_address(ALICE), topic_address(BOB)],
        "0x",
        201,
        0,
    ));
    fx.chain.push_log(log_for(
        &transfer,
        vec![
            topic_address(ALICE),
            topic_address(BOB),
            topic_word_u64(8),
        ],
        "0x",
        201,
        1,
    ));
    fx.chain.set_head(201);

    fx.poller.tick().await;

    let status = fx.poller.status();
    assert_eq!(status.decode_failures, 1);
    assert_eq!(status.events_processed, 1);
    assert_eq!(fx.poller.last_processed_block(), Some(201));
}

#[tokio::test]
async fn replay_routes_events_without_moving_the_cursor() {
    let fx = fixture(200);
    fx.poller.tick().await;
    assert_eq!(fx.poller.last_processed_block(), Some(200));

    let transfer = descriptor_for(&fx.descriptors, EventKind::HeroTransferred);
    fx.cache.set("heroes", "12", &json!({"stage": 2}));
    fx.chain.push_log(log_for(
        &transfer,
        vec![
            topic_address(ALICE),
            topic_address(BOB),
            topic_word_u64(12),
        ],
        "0x",
        155,
        0,
    ));

    let routed = fx.poller.process_range(150, 160).await.unwrap();
    assert_eq!(routed, 1);
    assert!(fx.cache.get_raw("heroes", "12").is_none());
    assert_eq!(fx.poller.last_processed_block(), Some(200));
}

#[tokio::test]
async fn replay_rejects_inverted_ranges() {
    let fx = fixture(200);
    let result = fx.poller.process_range(160, 150).await;
    assert_eq!(
        result,
        Err(PollerError::InvalidRange { from: 160, to: 150 })
    );
}

#[tokio::test]
async fn replay_surfaces_fetch_failures() {
    let fx = fixture(200);
    fx.chain.fail_address(HEROES);
    let result = fx.poller.process_range(150, 160).await;
    assert_eq!(
        result,
        Err(PollerError::RangeFetchFailed { from: 150, to: 160 })
    );
}

#[tokio::test]
async fn cursor_save_failure_is_not_fatal() {
    let fx = fixture(300);
    fx.cursor.fail_saves(true);

    fx.poller.tick().await;
    // The in-memory cursor is authoritative even when persistence fails.
    assert_eq!(fx.poller.last_processed_block(), Some(300));
    assert_eq!(fx.cursor.saved_block(), None);

    fx.cursor.fail_saves(false);
    fx.chain.set_head(301);
    fx.poller.tick().await;
    assert_eq!(fx.cursor.saved_block(), Some(301));
}

#[tokio::test]
async fn unreadable_cursor_falls_back_to_head_pinning() {
    let fx = fixture(400);
    fx.cursor.fail_loads(true);

    fx.poller.restore_cursor().await;
    assert_eq!(fx.poller.last_processed_block(), None);

    fx.poller.tick().await;
    assert_eq!(fx.poller.last_processed_block(), Some(400));
}

#[tokio::test]
async fn stop_and_resume_toggle_the_running_flag() {
    let fx = fixture(100);
    assert!(!fx.poller.is_running());

    fx.poller.resume();
    assert!(fx.poller.is_running());

    fx.poller.stop().await;
    assert!(!fx.poller.is_running());
}
