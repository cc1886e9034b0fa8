//! Multi-namespace in-memory cache tier.
//!
//! Layout:
//! - [`namespaces`]: the configuration model, including the built-in
//!   namespace set for the game's read paths.
//! - [`store`]: per-namespace storage with TTL expiry, FIFO eviction
//!   and hit/miss accounting.
//! - [`manager`]: the typed API the rest of the service talks to, plus
//!   event-driven and pattern invalidation.
//!
//! Conventions: `Option` means a cache miss (including unknown
//! namespaces, which are logged); `Result` is reserved for construction
//! and for operator input such as invalidation patterns.

pub mod manager;
pub mod namespaces;
pub mod store;

pub use manager::{CacheManager, CacheStatsReport, PrewarmOutcome};
pub use namespaces::{
    CacheConfigError, CacheSettings, CacheStrategy, NamespaceConfig, SETTINGS_VERSION,
};
pub use store::{CacheEntry, CacheStore, NamespaceStats};
