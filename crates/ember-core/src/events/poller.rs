//! Background chain poller.
//!
//! Each tick fetches the chain head, pulls logs for every descriptor
//! over the unprocessed block range, decodes them, and routes the
//! resulting events oldest-first. The cursor only advances when every
//! descriptor fetch succeeded, so a partially failed tick is retried
//! in full on the next interval.

use crate::chain::ChainClient;
use crate::cursor::CursorStore;
use crate::events::decoder::decode;
use crate::events::descriptor::EventDescriptor;
use crate::events::router::InvalidationRouter;
use crate::events::types::{InvalidationEvent, RawLog};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollerError {
    #[error("invalid block range {from}..{to}")]
    InvalidRange { from: u64, to: u64 },

    #[error("log fetch failed over blocks {from}..{to}")]
    RangeFetchFailed { from: u64, to: u64 },
}

/// Poller tuning derived from chain configuration.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub poll_interval: Duration,
    /// Per-descriptor budget for one log fetch.
    pub fetch_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

/// Admin-facing snapshot of the poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollerStatus {
    pub running: bool,
    pub last_processed_block: Option<u64>,
    pub descriptors: usize,
    pub ticks: u64,
    pub events_processed: u64,
    pub fetch_failures: u64,
    pub decode_failures: u64,
}

/// Polls the chain and feeds decoded events into the router.
pub struct EventPoller {
    chain: Arc<dyn ChainClient>,
    cursor_store: Arc<dyn CursorStore>,
    router: Arc<InvalidationRouter>,
    descriptors: Vec<EventDescriptor>,
    poll_interval: Duration,
    fetch_timeout: Duration,
    /// Last fully processed block; only meaningful once `cursor_set`.
    cursor: AtomicU64,
    cursor_set: AtomicBool,
    running: AtomicBool,
    /// Serializes ticks against each other, admin replays, and `stop`.
    tick_lock: Mutex<()>,
    ticks: AtomicU64,
    events_processed: AtomicU64,
    fetch_failures: AtomicU64,
    decode_failures: AtomicU64,
}

impl EventPoller {
    #[must_use]
    pub fn new(
        chain: Arc<dyn ChainClient>,
        cursor_store: Arc<dyn CursorStore>,
        router: Arc<InvalidationRouter>,
        descriptors: Vec<EventDescriptor>,
        config: PollerConfig,
    ) -> Self {
        Self {
            chain,
            cursor_store,
            router,
            descriptors,
            poll_interval: config.poll_interval,
            fetch_timeout: config.fetch_timeout,
            cursor: AtomicU64::new(0),
            cursor_set: AtomicBool::new(false),
            running: AtomicBool::new(false),
            tick_lock: Mutex::new(()),
            ticks: AtomicU64::new(0),
            events_processed: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
        }
    }

    /// Spawns the polling loop. The task restores the persisted cursor,
    /// then ticks until the shutdown channel fires; an in-flight tick
    /// always completes before the task exits.
    pub fn start_with_shutdown(
        self: &Arc<Self>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let poller = Arc::clone(self);
        tokio::spawn(async move {
            poller.restore_cursor().await;
            poller.running.store(true, Ordering::SeqCst);
            info!(
                descriptors = poller.descriptors.len(),
                interval_secs = poller.poll_interval.as_secs(),
                "event poller started"
            );
            let mut interval = tokio::time::interval(poller.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        info!("event poller shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if poller.running.load(Ordering::SeqCst) {
                            poller.tick().await;
                        }
                    }
                }
            }
            poller.running.store(false, Ordering::SeqCst);
        })
    }

    /// Loads the persisted cursor into memory. Called once by the
    /// polling task before its first tick; a missing or unreadable
    /// cursor leaves the poller pinning to the chain head instead.
    pub async fn restore_cursor(&self) {
        match self.cursor_store.load().await {
            Ok(Some(block)) => {
                self.cursor.store(block, Ordering::SeqCst);
                self.cursor_set.store(true, Ordering::SeqCst);
                info!(block, "resumed from persisted cursor");
            }
            Ok(None) => info!("no persisted cursor; will pin to chain head"),
            Err(error) => {
                warn!(%error, "cursor restore failed; will pin to chain head");
            }
        }
    }

    /// Re-enables ticking after [`stop`](Self::stop).
    pub fn resume(&self) {
        if !self.running.swap(true, Ordering::SeqCst) {
            info!("event poller resumed");
        }
    }

    /// Disables ticking and waits for any in-flight tick to finish.
    pub async fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            let _quiesce = self.tick_lock.lock().await;
            info!("event poller stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_processed_block(&self) -> Option<u64> {
        if self.cursor_set.load(Ordering::SeqCst) {
            Some(self.cursor.load(Ordering::SeqCst))
        } else {
            None
        }
    }

    #[must_use]
    pub fn status(&self) -> PollerStatus {
        PollerStatus {
            running: self.is_running(),
            last_processed_block: self.last_processed_block(),
            descriptors: self.descriptors.len(),
            ticks: self.ticks.load(Ordering::Relaxed),
            events_processed: self.events_processed.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
        }
    }

    /// Runs one polling cycle. Public so tests and replays can drive
    /// the poller without the interval loop.
    pub async fn tick(&self) {
        let _guard = self.tick_lock.lock().await;
        self.ticks.fetch_add(1, Ordering::Relaxed);

        let head = match self.chain.get_block_number().await {
            Ok(head) => head,
            Err(error) => {
                self.fetch_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%error, "head fetch failed; tick skipped");
                return;
            }
        };

        if !self.cursor_set.load(Ordering::SeqCst) {
            // First contact with the chain: start from the present
            // rather than replaying history.
            self.advance_cursor(head).await;
            info!(head, "cursor initialized at chain head");
            return;
        }

        let cursor = self.cursor.load(Ordering::SeqCst);
        if head <= cursor {
            trace!(head, cursor, "no new blocks");
            return;
        }

        let (events, complete) = self.collect_events(cursor + 1, head).await;
        let routed = events.len();
        for event in &events {
            self.router.route(event);
        }
        self.events_processed
            .fetch_add(routed as u64, Ordering::Relaxed);

        if complete {
            self.advance_cursor(head).await;
            debug!(from = cursor + 1, to = head, routed, "tick complete");
        } else {
            debug!(
                from = cursor + 1,
                to = head,
                routed,
                "tick incomplete; range will be retried"
            );
        }
    }

    /// Replays a block range through decode and routing without touching
    /// the cursor. Intended for backfill and debugging.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError`] on an inverted range or when any
    /// descriptor fetch fails.
    pub async fn process_range(&self, from: u64, to: u64) -> Result<usize, PollerError> {
        if from > to {
            return Err(PollerError::InvalidRange { from, to });
        }
        let _guard = self.tick_lock.lock().await;
        let (events, complete) = self.collect_events(from, to).await;
        if !complete {
            return Err(PollerError::RangeFetchFailed { from, to });
        }
        for event in &events {
            self.router.route(event);
        }
        info!(from, to, routed = events.len(), "block range replayed");
        Ok(events.len())
    }

    /// Fetches, orders and decodes all logs in the range. The second
    /// element is false when any descriptor fetch failed or timed out.
    async fn collect_events(&self, from: u64, to: u64) -> (Vec<InvalidationEvent>, bool) {
        let mut complete = true;
        let mut pending: Vec<(&EventDescriptor, RawLog)> = Vec::new();

        for descriptor in &self.descriptors {
            let topic_filter = [descriptor.topic0.to_string()];
            let fetch = self
                .chain
                .get_logs(&descriptor.address, from, to, &topic_filter);
            match tokio::time::timeout(self.fetch_timeout, fetch).await {
                Ok(Ok(logs)) => {
                    pending.extend(logs.into_iter().map(|log| (descriptor, log)));
                }
                Ok(Err(error)) => {
                    self.fetch_failures.fetch_add(1, Ordering::Relaxed);
                    complete = false;
                    warn!(event = %descriptor.kind, %error, "log fetch failed");
                }
                Err(_) => {
                    self.fetch_failures.fetch_add(1, Ordering::Relaxed);
                    complete = false;
                    warn!(
                        event = %descriptor.kind,
                        timeout_secs = self.fetch_timeout.as_secs(),
                        "log fetch timed out"
                    );
                }
            }
        }

        // Chain order: block number first, then position within block.
        pending.sort_by_key(|(_, log)| (log.block_number, log.log_index));

        let mut timestamps: HashMap<u64, u64> = HashMap::new();
        let mut events = Vec::with_capacity(pending.len());
        for (descriptor, log) in pending {
            let payload = match decode(descriptor, &log) {
                Ok(payload) => payload,
                Err(error) => {
                    self.decode_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        event = %descriptor.kind,
                        block = log.block_number,
                        tx = %log.transaction_hash,
                        %error,
                        "undecodable log skipped"
                    );
                    continue;
                }
            };
            let timestamp = match timestamps.get(&log.block_number) {
                Some(ts) => *ts,
                None => {
                    let ts = self.block_timestamp(log.block_number).await;
                    timestamps.insert(log.block_number, ts);
                    ts
                }
            };
            events.push(InvalidationEvent {
                kind: descriptor.kind,
                payload,
                block_number: log.block_number,
                transaction_hash: log.transaction_hash,
                timestamp,
            });
        }
        (events, complete)
    }

    async fn block_timestamp(&self, number: u64) -> u64 {
        match self.chain.get_block_timestamp(number).await {
            Ok(ts) => ts,
            Err(error) => {
                warn!(block = number, %error, "block timestamp unavailable; using wall clock");
                unix_now()
            }
        }
    }

    async fn advance_cursor(&self, block: u64) {
        self.cursor.store(block, Ordering::SeqCst);
        self.cursor_set.store(true, Ordering::SeqCst);
        if let Err(error) = self.cursor_store.save(block).await {
            // The in-memory cursor stays authoritative for this run.
            warn!(block, %error, "cursor persistence failed");
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

impl std::fmt::Debug for EventPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPoller")
            .field("descriptors", &self.descriptors.len())
            .field("poll_interval", &self.poll_interval)
            .field("running", &self.is_running())
            .finish()
    }
}
