//! Event identities and decoded payloads.
//!
//! An [`EventKind`] names one on-chain event the service reacts to. The
//! kebab-case serde form (`hero-evolved`, `listing-sold`, ...) is the
//! spelling used in configuration files and admin responses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// All untyped zeroes, used as the mint/burn counterparty in transfers.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// On-chain events with cache-invalidation consequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    HeroMinted,
    HeroTransferred,
    HeroEvolved,
    HeroStaked,
    HeroUnstaked,
    ListingCreated,
    ListingSold,
    ListingCancelled,
    EssenceTransferred,
    EssenceMinted,
    EssenceBurned,
    ActivityCreated,
}

impl EventKind {
    /// Stable kebab-case name, matching the serde representation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HeroMinted => "hero-minted",
            Self::HeroTransferred => "hero-transferred",
            Self::HeroEvolved => "hero-evolved",
            Self::HeroStaked => "hero-staked",
            Self::HeroUnstaked => "hero-unstaked",
            Self::ListingCreated => "listing-created",
            Self::ListingSold => "listing-sold",
            Self::ListingCancelled => "listing-cancelled",
            Self::EssenceTransferred => "essence-transferred",
            Self::EssenceMinted => "essence-minted",
            Self::EssenceBurned => "essence-burned",
            Self::ActivityCreated => "activity-created",
        }
    }

    /// Every kind, in declaration order.
    #[must_use]
    pub const fn all() -> &'static [EventKind] {
        &[
            Self::HeroMinted,
            Self::HeroTransferred,
            Self::HeroEvolved,
            Self::HeroStaked,
            Self::HeroUnstaked,
            Self::ListingCreated,
            Self::ListingSold,
            Self::ListingCancelled,
            Self::EssenceTransferred,
            Self::EssenceMinted,
            Self::EssenceBurned,
            Self::ActivityCreated,
        ]
    }

    /// How an event of this kind invalidates a subscribed namespace.
    ///
    /// Marketplace and activity namespaces key their entries by query
    /// shape rather than by entity, so those events wipe the whole
    /// namespace. Hero and essence events carry enough to target
    /// individual entries.
    #[must_use]
    pub const fn scope(self) -> InvalidationScope {
        match self {
            Self::ListingCreated
            | Self::ListingSold
            | Self::ListingCancelled
            | Self::ActivityCreated => InvalidationScope::Namespace,
            Self::HeroMinted
            | Self::HeroTransferred
            | Self::HeroEvolved
            | Self::HeroStaked
            | Self::HeroUnstaked
            | Self::EssenceTransferred
            | Self::EssenceMinted
            | Self::EssenceBurned => InvalidationScope::Key,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

/// Blast radius of an invalidation triggered by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationScope {
    /// Clear every entry in each subscribed namespace.
    Namespace,
    /// Remove only the entries named by the payload keys.
    Key,
}

/// A log exactly as the node returned it, hex fields still encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub log_index: u32,
}

/// Fields pulled out of a decoded log. Which ones are populated depends
/// on the event kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Decimal token identifier (256-bit, so carried as a string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    /// Sender address, lowercase hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Recipient address, lowercase hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Acting or owning address for single-party events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Decimal token amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Decimal listing price in wei.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Evolution stage a hero reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<u8>,
    /// Discriminant of the recorded activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_kind: Option<u8>,
}

impl EventPayload {
    /// Cache keys a key-scoped event should invalidate.
    ///
    /// An empty result for a key-scoped kind means the payload is
    /// missing its identifying field; the router falls back to clearing
    /// the namespace in that case.
    #[must_use]
    pub fn invalidation_keys(&self, kind: EventKind) -> Vec<String> {
        match kind {
            EventKind::HeroMinted
            | EventKind::HeroTransferred
            | EventKind::HeroEvolved
            | EventKind::HeroStaked
            | EventKind::HeroUnstaked => self.token_id.iter().cloned().collect(),
            EventKind::EssenceTransferred => {
                let mut keys: Vec<String> = [self.from.as_deref(), self.to.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(|addr| *addr != ZERO_ADDRESS)
                    .map(str::to_string)
                    .collect();
                keys.dedup();
                keys
            }
            EventKind::EssenceMinted | EventKind::EssenceBurned => {
                self.owner.iter().cloned().collect()
            }
            EventKind::ListingCreated
            | EventKind::ListingSold
            | EventKind::ListingCancelled
            | EventKind::ActivityCreated => Vec::new(),
        }
    }
}

/// A fully decoded on-chain event ready for routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationEvent {
    pub kind: EventKind,
    pub payload: EventPayload,
    pub block_number: u64,
    pub transaction_hash: String,
    /// Block timestamp in unix seconds.
    pub timestamp: u64,
}
