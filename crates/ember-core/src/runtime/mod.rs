//! Service lifecycle.
//!
//! [`EmberRuntime`] wires the cache tier, router and poller together
//! behind a builder and owns the shutdown broadcast. Shutdown is
//! idempotent: the first call wins, later calls are no-ops.

mod builder;

pub use builder::{EmberRuntimeBuilder, RuntimeError};

use crate::cache::CacheManager;
use crate::config::AppConfig;
use crate::events::{EventPoller, InvalidationRouter};
use crate::health::{self, HealthReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct EmberRuntime {
    config: AppConfig,
    cache: Arc<CacheManager>,
    router: Arc<InvalidationRouter>,
    poller: Arc<EventPoller>,
    shutdown_tx: broadcast::Sender<()>,
    poller_task: Option<JoinHandle<()>>,
    shutdown_initiated: AtomicBool,
}

impl EmberRuntime {
    #[must_use]
    pub fn builder() -> EmberRuntimeBuilder {
        EmberRuntimeBuilder::new()
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    #[must_use]
    pub fn router(&self) -> &Arc<InvalidationRouter> {
        &self.router
    }

    #[must_use]
    pub fn poller(&self) -> &Arc<EventPoller> {
        &self.poller
    }

    /// Fresh receiver on the shutdown broadcast, for tasks that need to
    /// exit with the runtime.
    #[must_use]
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Health snapshot combining cache counters and poller state.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        health::evaluate(&self.cache, self.poller.is_running())
    }

    /// Signals every background task and waits for the poller to drain.
    /// Safe to call more than once.
    pub async fn shutdown(&mut self) {
        if self.shutdown_initiated.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("runtime shutdown initiated");
        // Receivers may already be gone if the poller was never started.
        let _ = self.shutdown_tx.send(());
        if let Some(task) = self.poller_task.take() {
            if let Err(error) = task.await {
                warn!(%error, "poller task ended abnormally");
            }
        }
        info!("runtime shutdown complete");
    }
}

impl std::fmt::Debug for EmberRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmberRuntime")
            .field("poller_running", &self.poller.is_running())
            .field(
                "shutdown_initiated",
                &self.shutdown_initiated.load(Ordering::SeqCst),
            )
            .finish()
    }
}

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<EmberRuntime>();
};
