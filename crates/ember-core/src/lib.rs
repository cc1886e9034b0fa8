//! Core library of the Ember cache service.
//!
//! Ember keeps hot game reads (hero sheets, marketplace floors, essence
//! balances) in a multi-namespace in-memory cache and uses on-chain
//! events, not guesswork, to decide when cached data is stale.
//!
//! ```text
//!   EVM node
//!      |  eth_getLogs / eth_blockNumber
//!      v
//!  EventPoller ---> decoder ---> InvalidationRouter ---> CacheManager
//!      |                                                     ^
//!  CursorStore (resume point)                 typed get/set  |
//!                                                     application
//! ```
//!
//! Construction goes through [`runtime::EmberRuntime::builder`], which
//! validates configuration, wires the components and owns shutdown.

pub mod cache;
pub mod chain;
pub mod config;
pub mod cursor;
pub mod events;
pub mod health;
pub mod runtime;
pub mod utils;

pub use cache::{CacheManager, CacheSettings};
pub use config::AppConfig;
pub use events::{EventKind, EventPoller, InvalidationEvent, InvalidationRouter};
pub use runtime::{EmberRuntime, EmberRuntimeBuilder};
