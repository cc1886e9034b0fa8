//! Namespace registry and the typed cache API.
//!
//! [`CacheManager`] owns one [`CacheStore`] per configured namespace.
//! The namespace set is fixed at construction; referencing an unknown
//! namespace is a configuration mistake, reported as a warning and
//! treated as a miss rather than an error.

use crate::cache::namespaces::{CacheConfigError, CacheSettings, CacheStrategy};
use crate::cache::store::{CacheStore, NamespaceStats};
use crate::events::EventKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parallel fetches issued while prewarming a namespace.
const PREWARM_CONCURRENCY: usize = 8;

/// Outcome of a prewarm sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrewarmOutcome {
    pub loaded: usize,
    pub failed: usize,
}

/// Aggregate counter snapshot across every namespace.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsReport {
    pub version: u32,
    pub namespaces: Vec<(String, NamespaceStats)>,
}

/// All namespaces of the cache tier.
pub struct CacheManager {
    stores: HashMap<String, Arc<CacheStore>>,
    /// Construction order of the namespaces, for stable reporting.
    order: Vec<String>,
    settings: CacheSettings,
}

impl CacheManager {
    /// Builds every namespace declared by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConfigError`] when the settings fail validation.
    pub fn new(settings: CacheSettings) -> Result<Self, CacheConfigError> {
        settings.validate()?;
        let mut stores = HashMap::with_capacity(settings.namespaces.len());
        let mut order = Vec::with_capacity(settings.namespaces.len());
        for ns in &settings.namespaces {
            if ns.strategy != CacheStrategy::InProcess {
                info!(
                    namespace = %ns.name,
                    strategy = ns.strategy.name(),
                    "strategy noted; this process serves the namespace in memory"
                );
            }
            stores.insert(ns.name.clone(), Arc::new(CacheStore::new(ns)?));
            order.push(ns.name.clone());
        }
        info!(namespaces = order.len(), version = settings.version, "cache tier ready");
        Ok(Self {
            stores,
            order,
            settings,
        })
    }

    fn store(&self, namespace: &str) -> Option<&Arc<CacheStore>> {
        let store = self.stores.get(namespace);
        if store.is_none() {
            warn!(namespace, "unknown cache namespace");
        }
        store
    }

    #[must_use]
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.stores.contains_key(namespace)
    }

    /// Namespace names in configuration order.
    #[must_use]
    pub fn namespace_names(&self) -> &[String] {
        &self.order
    }

    #[must_use]
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Fetches and deserializes a cached value.
    ///
    /// Returns `None` on a miss, an expired entry, an unknown namespace,
    /// or a value that no longer matches the requested shape.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, namespace: &str, id: &str) -> Option<T> {
        let raw = self.get_raw(namespace, id)?;
        match serde_json::from_value(raw.as_ref().clone()) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(namespace, id, %error, "cached value does not match requested type");
                None
            }
        }
    }

    /// Fetches the raw JSON value without deserializing.
    #[must_use]
    pub fn get_raw(&self, namespace: &str, id: &str) -> Option<Arc<Value>> {
        self.store(namespace)?.get(id)
    }

    /// Serializes and stores a value. Returns `false` when the namespace
    /// is unknown or the value cannot be serialized.
    pub fn set<T: Serialize>(&self, namespace: &str, id: &str, value: &T) -> bool {
        let Some(store) = self.store(namespace) else {
            return false;
        };
        match serde_json::to_value(value) {
            Ok(json) => {
                store.set(id, json);
                true
            }
            Err(error) => {
                warn!(namespace, id, %error, "failed to serialize cache value");
                false
            }
        }
    }

    /// Removes one entry, or every entry when `id` is `None`.
    ///
    /// Returns `false` only for an unknown namespace.
    pub fn invalidate(&self, namespace: &str, id: Option<&str>) -> bool {
        let Some(store) = self.store(namespace) else {
            return false;
        };
        match id {
            Some(id) => {
                store.invalidate(id);
                debug!(namespace, id, "invalidated cache entry");
            }
            None => {
                let removed = store.invalidate_all();
                debug!(namespace, removed, "invalidated namespace");
            }
        }
        true
    }

    /// Removes every live entry whose key matches `pattern`.
    ///
    /// An unknown namespace is a no-op reported as zero removals.
    ///
    /// # Errors
    ///
    /// Returns the regex error for an invalid pattern so admin callers
    /// can surface it as client input failure.
    pub fn invalidate_pattern(
        &self,
        namespace: &str,
        pattern: &str,
    ) -> Result<usize, regex::Error> {
        let matcher = regex::Regex::new(pattern)?;
        let Some(store) = self.store(namespace) else {
            return Ok(0);
        };
        let mut removed = 0usize;
        for key in store.keys() {
            if matcher.is_match(&key) && store.invalidate(&key) {
                removed += 1;
            }
        }
        debug!(namespace, pattern, removed, "pattern invalidation complete");
        Ok(removed)
    }

    /// Clears every namespace subscribed to `kind`.
    ///
    /// This is the coarse path used when an event cannot be narrowed to
    /// specific keys. Returns the number of namespaces cleared.
    pub fn invalidate_by_event(&self, kind: EventKind) -> usize {
        let mut cleared = 0usize;
        for ns in &self.settings.namespaces {
            if ns.invalidate_on.contains(&kind) {
                if let Some(store) = self.stores.get(&ns.name) {
                    store.invalidate_all();
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Drops every entry in every namespace. Returns total removals.
    pub fn clear_all(&self) -> usize {
        let mut removed = 0usize;
        for store in self.stores.values() {
            removed += store.invalidate_all();
        }
        info!(removed, "cleared all cache namespaces");
        removed
    }

    /// Loads a batch of entries through `fetcher`, bounded to
    /// [`PREWARM_CONCURRENCY`] fetches in flight. Individual failures
    /// are logged and counted; the sweep always runs to completion.
    pub async fn prewarm<F, Fut, E>(
        &self,
        namespace: &str,
        ids: &[String],
        fetcher: F,
    ) -> PrewarmOutcome
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: std::fmt::Display,
    {
        use futures::stream::{self, StreamExt};

        let Some(store) = self.store(namespace) else {
            return PrewarmOutcome {
                loaded: 0,
                failed: ids.len(),
            };
        };

        let mut outcome = PrewarmOutcome::default();
        let mut results = stream::iter(ids.iter().cloned())
            .map(|id| {
                let fetch = fetcher(id.clone());
                async move { (id, fetch.await) }
            })
            .buffer_unordered(PREWARM_CONCURRENCY);

        while let Some((id, result)) = results.next().await {
            match result {
                Ok(value) => {
                    store.set(&id, value);
                    outcome.loaded += 1;
                }
                Err(error) => {
                    warn!(namespace, id, %error, "prewarm fetch failed");
                    outcome.failed += 1;
                }
            }
        }
        info!(
            namespace,
            loaded = outcome.loaded,
            failed = outcome.failed,
            "prewarm sweep finished"
        );
        outcome
    }

    /// Per-namespace counters in configuration order.
    #[must_use]
    pub fn stats(&self) -> CacheStatsReport {
        let namespaces = self
            .order
            .iter()
            .filter_map(|name| {
                self.stores
                    .get(name)
                    .map(|store| (name.clone(), store.stats()))
            })
            .collect();
        CacheStatsReport {
            version: self.settings.version,
            namespaces,
        }
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("namespaces", &self.order)
            .field("version", &self.settings.version)
            .finish()
    }
}
