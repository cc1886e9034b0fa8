//! Single-namespace cache storage.
//!
//! A [`CacheStore`] owns the entries of one namespace: a concurrent map
//! of JSON values with per-entry expiry, FIFO eviction at capacity, and
//! atomic hit/miss accounting. Expired entries are dropped lazily on
//! access, so no sweeper task is needed.

use crate::cache::namespaces::{CacheConfigError, NamespaceConfig};
use ahash::RandomState;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// One cached value plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Arc<Value>,
    pub created_at: Instant,
    pub expires_at: Instant,
    /// Monotonic per-store insertion sequence. Doubles as FIFO age: a
    /// rewrite takes a fresh, larger value and moves the entry to the
    /// back of the eviction order.
    pub sequence: u64,
}

/// Counter snapshot for one namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NamespaceStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub invalidations: u64,
    pub evictions: u64,
    pub size: usize,
}

impl NamespaceStats {
    /// Hit percentage over all gets, `0.0` when nothing was fetched yet.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        (self.hits as f64 / total as f64) * 100.0
    }
}

/// Entries for a single namespace.
pub struct CacheStore {
    name: String,
    ttl: Duration,
    max_size: Option<usize>,
    entries: DashMap<String, CacheEntry, RandomState>,
    sequence: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    invalidations: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStore {
    /// Builds a store from a validated namespace config.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConfigError`] when the TTL or capacity is zero.
    pub fn new(config: &NamespaceConfig) -> Result<Self, CacheConfigError> {
        if config.ttl_ms == 0 {
            return Err(CacheConfigError::ZeroTtl(config.name.clone()));
        }
        if config.max_size == Some(0) {
            return Err(CacheConfigError::ZeroMaxSize(config.name.clone()));
        }
        let capacity = config.max_size.unwrap_or(64).min(1024);
        Ok(Self {
            name: config.name.clone(),
            ttl: Duration::from_millis(config.ttl_ms),
            max_size: config.max_size,
            entries: DashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            sequence: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetches a live entry, counting a hit or miss.
    ///
    /// An entry strictly past its deadline is removed and reported as a
    /// miss; an entry exactly at the deadline still serves.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Value>> {
        let now = Instant::now();
        if self
            .entries
            .remove_if(id, |_, entry| now > entry.expires_at)
            .is_some()
        {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(namespace = %self.name, id, "cache entry expired");
            return None;
        }
        match self.entries.get(id) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.data))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Inserts or replaces an entry with a fresh TTL window.
    ///
    /// When a new key would push the store past its capacity, the oldest
    /// entries by insertion order are evicted first.
    pub fn set(&self, id: &str, data: Value) {
        let now = Instant::now();
        if let Some(max) = self.max_size {
            if !self.entries.contains_key(id) && self.entries.len() >= max {
                self.evict_oldest(self.entries.len() + 1 - max);
            }
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.entries.insert(
            id.to_string(),
            CacheEntry {
                data: Arc::new(data),
                created_at: now,
                expires_at: now + self.ttl,
                sequence,
            },
        );
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    fn evict_oldest(&self, surplus: usize) {
        let mut by_age: Vec<(u64, String)> = self
            .entries
            .iter()
            .map(|entry| (entry.value().sequence, entry.key().clone()))
            .collect();
        by_age.sort_unstable_by_key(|(sequence, _)| *sequence);
        let mut evicted = 0usize;
        for (_, key) in by_age.into_iter().take(surplus) {
            if self.entries.remove(&key).is_some() {
                evicted += 1;
            }
        }
        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(namespace = %self.name, evicted, "evicted oldest cache entries");
        }
    }

    /// Removes one entry. The invalidation counter advances whether or
    /// not the key was present.
    pub fn invalidate(&self, id: &str) -> bool {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        self.entries.remove(id).is_some()
    }

    /// Drops every entry, returning how many were removed.
    pub fn invalidate_all(&self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        debug!(namespace = %self.name, removed, "cleared namespace");
        removed
    }

    /// Live (unexpired) keys, for pattern invalidation.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| now <= entry.value().expires_at)
            .map(|entry| entry.key().clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> NamespaceStats {
        NamespaceStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: self.entries.len(),
        }
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("max_size", &self.max_size)
            .field("len", &self.entries.len())
            .finish()
    }
}
