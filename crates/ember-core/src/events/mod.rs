//! Chain event pipeline: descriptors, decoding, polling and routing.
//!
//! Flow per poll tick:
//!
//! ```text
//! ChainClient::get_logs  -> decoder::decode -> InvalidationEvent
//!         (per descriptor)        |                  |
//!                                 v                  v
//!                           EventPayload    InvalidationRouter
//!                                                    |
//!                                              CacheManager
//! ```

pub mod decoder;
pub mod descriptor;
pub mod poller;
pub mod router;
pub mod types;

pub use decoder::{decode, DecodeError};
pub use descriptor::{catalogue, ContractAddresses, EventDescriptor};
pub use poller::{EventPoller, PollerConfig, PollerError, PollerStatus};
pub use router::{EventListener, InvalidationRouter};
pub use types::{
    EventKind, EventPayload, InvalidationEvent, InvalidationScope, RawLog, UnknownEventKind,
    ZERO_ADDRESS,
};
