//! Routes decoded events into cache invalidations and listeners.

use crate::cache::CacheManager;
use crate::events::types::{EventKind, InvalidationEvent, InvalidationScope};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Callback fired for every routed event of a subscribed kind.
/// Listener failures are logged and never interrupt routing.
pub type EventListener =
    Box<dyn Fn(&InvalidationEvent) -> Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + Sync>;

/// Fans decoded chain events out to the cache tier and to registered
/// listeners.
///
/// The event-to-namespace table is derived from the cache settings at
/// construction and never changes afterwards.
pub struct InvalidationRouter {
    cache: Arc<CacheManager>,
    subscriptions: HashMap<EventKind, Vec<String>>,
    listeners: RwLock<HashMap<EventKind, Vec<EventListener>>>,
}

impl InvalidationRouter {
    #[must_use]
    pub fn new(cache: Arc<CacheManager>) -> Self {
        let mut subscriptions: HashMap<EventKind, Vec<String>> = HashMap::new();
        for ns in &cache.settings().namespaces {
            for kind in &ns.invalidate_on {
                subscriptions
                    .entry(*kind)
                    .or_default()
                    .push(ns.name.clone());
            }
        }
        Self {
            cache,
            subscriptions,
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Namespaces subscribed to `kind`, in configuration order.
    #[must_use]
    pub fn subscribers(&self, kind: EventKind) -> &[String] {
        self.subscriptions
            .get(&kind)
            .map_or(&[], Vec::as_slice)
    }

    /// Registers a listener for one event kind.
    pub fn subscribe(&self, kind: EventKind, listener: EventListener) {
        self.listeners.write().entry(kind).or_default().push(listener);
    }

    /// Applies one event: listeners first, then cache invalidation.
    pub fn route(&self, event: &InvalidationEvent) {
        self.notify(event);

        let Some(namespaces) = self.subscriptions.get(&event.kind) else {
            trace!(kind = %event.kind, "no namespaces subscribe to event");
            return;
        };

        match event.kind.scope() {
            InvalidationScope::Namespace => {
                for namespace in namespaces {
                    self.cache.invalidate(namespace, None);
                }
                debug!(
                    kind = %event.kind,
                    block = event.block_number,
                    namespaces = namespaces.len(),
                    "event cleared subscribed namespaces"
                );
            }
            InvalidationScope::Key => {
                let keys = event.payload.invalidation_keys(event.kind);
                if keys.is_empty() {
                    // Over-forgetting is safe; serving stale data is not.
                    warn!(
                        kind = %event.kind,
                        block = event.block_number,
                        "key-scoped event without keys; clearing subscribed namespaces"
                    );
                    for namespace in namespaces {
                        self.cache.invalidate(namespace, None);
                    }
                    return;
                }
                for namespace in namespaces {
                    for key in &keys {
                        self.cache.invalidate(namespace, Some(key));
                    }
                }
                debug!(
                    kind = %event.kind,
                    block = event.block_number,
                    keys = keys.len(),
                    "event invalidated targeted keys"
                );
            }
        }
    }

    fn notify(&self, event: &InvalidationEvent) {
        let listeners = self.listeners.read();
        let Some(for_kind) = listeners.get(&event.kind) else {
            return;
        };
        for listener in for_kind {
            if let Err(error) = listener(event) {
                warn!(kind = %event.kind, %error, "event listener failed");
            }
        }
    }
}

impl std::fmt::Debug for InvalidationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationRouter")
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}
