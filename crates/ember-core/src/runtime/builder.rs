//! Runtime assembly.

use crate::cache::{CacheConfigError, CacheManager};
use crate::chain::{ChainClient, ChainClientError, HttpChainClient};
use crate::config::{AppConfig, ConfigError};
use crate::cursor::{CursorStore, FileCursorStore};
use crate::events::{catalogue, EventPoller, InvalidationRouter, PollerConfig};
use crate::runtime::EmberRuntime;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("configuration is required to build a runtime")]
    MissingConfig,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cache setup failed: {0}")]
    Cache(#[from] CacheConfigError),

    #[error("chain client setup failed: {0}")]
    Chain(#[from] ChainClientError),
}

/// Assembles an [`EmberRuntime`], with injection points for tests.
#[derive(Default)]
pub struct EmberRuntimeBuilder {
    config: Option<AppConfig>,
    chain_client: Option<Arc<dyn ChainClient>>,
    cursor_store: Option<Arc<dyn CursorStore>>,
    start_poller: bool,
}

impl EmberRuntimeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: None,
            chain_client: None,
            cursor_store: None,
            start_poller: true,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the HTTP chain client, typically with a scripted one.
    #[must_use]
    pub fn with_chain_client(mut self, client: Arc<dyn ChainClient>) -> Self {
        self.chain_client = Some(client);
        self
    }

    #[must_use]
    pub fn with_cursor_store(mut self, store: Arc<dyn CursorStore>) -> Self {
        self.cursor_store = Some(store);
        self
    }

    /// Builds everything but leaves the polling task unspawned. Used by
    /// admin-only deployments and tests that drive ticks by hand.
    #[must_use]
    pub fn without_poller_task(mut self) -> Self {
        self.start_poller = false;
        self
    }

    /// Validates the configuration and wires all components together.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] when configuration is absent or invalid,
    /// or a component fails to construct.
    pub fn build(self) -> Result<EmberRuntime, RuntimeError> {
        let config = self.config.ok_or(RuntimeError::MissingConfig)?;
        config.validate()?;

        let cache = Arc::new(CacheManager::new(config.cache.clone())?);
        let router = Arc::new(InvalidationRouter::new(Arc::clone(&cache)));

        let chain_client = match self.chain_client {
            Some(client) => client,
            None => Arc::new(HttpChainClient::new(
                &config.chain.rpc_url,
                config.request_timeout(),
            )?),
        };
        let cursor_store = self
            .cursor_store
            .unwrap_or_else(|| Arc::new(FileCursorStore::new(config.cursor.path.clone())));

        let descriptors = catalogue(&config.chain.contracts);
        if descriptors.is_empty() {
            warn!("no contracts configured; the poller will watch nothing");
        }
        let poller = Arc::new(EventPoller::new(
            chain_client,
            cursor_store,
            Arc::clone(&router),
            descriptors,
            PollerConfig {
                poll_interval: config.poll_interval(),
                fetch_timeout: config.fetch_timeout(),
            },
        ));

        let (shutdown_tx, _) = broadcast::channel(4);
        let poller_task = if self.start_poller {
            Some(poller.start_with_shutdown(shutdown_tx.subscribe()))
        } else {
            None
        };

        Ok(EmberRuntime {
            config,
            cache,
            router,
            poller,
            shutdown_tx,
            poller_task,
            shutdown_initiated: AtomicBool::new(false),
        })
    }
}
