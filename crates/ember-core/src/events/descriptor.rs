//! The catalogue of watched contract events.
//!
//! A descriptor binds an [`EventKind`] to the contract address and
//! `topic0` hash the poller filters logs by. The hero and essence
//! contracts both emit the standard `Transfer` topic; the contract
//! address is what tells them apart.

use crate::events::types::EventKind;
use crate::utils::hex::normalize_address;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// keccak-256 hashes of the watched event signatures.
mod topics {
    pub const TRANSFER: &str =
        "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
    pub const HERO_MINTED: &str =
        "0x1a77ef0da851027ed860b014e3edfa7d65f67328e9c0a9b9da4054f2006dd438";
    pub const HERO_EVOLVED: &str =
        "0xe9465290754152423c9552507a7021b770b9f8d3e8bc8e0f29b4d034fd84cb39";
    pub const HERO_STAKED: &str =
        "0x4e71b8f6d8499caa96397209c7c7dc35ce1a99c1621ea10d4d20958c8bb54a6c";
    pub const HERO_UNSTAKED: &str =
        "0x16d38b7a099a527a65552ca118765a5a493b789eb46f3d7cdb4ac2cc010e1586";
    pub const LISTING_CREATED: &str =
        "0x9adf89188ff96bbe0e772b6a9345d935a240c2bd656be8db63db0d091e92cb9d";
    pub const LISTING_SOLD: &str =
        "0x390181b94203e6a571a4a2125c19b547e2eea81bec83cbee4d3911cfcee6d9fa";
    pub const LISTING_CANCELLED: &str =
        "0x8e25282255ab31897df2b0456bb993ac7f84d376861aefd84901d2d63a7428a2";
    pub const ESSENCE_MINTED: &str =
        "0xe559f941e666683d61cf0eae2d3d50af72caec09824372f63c13bb8fdd4b933f";
    pub const ESSENCE_BURNED: &str =
        "0xa6282d00a0e34ac9b6cc8d9f06d5cce2958b7570c72cee8c90eff4f8e905ee12";
    pub const ACTIVITY_RECORDED: &str =
        "0x05c5376fa19f975cd6348a53b2542274a99f8761799bd3e3236fc7585e856a64";
}

/// One watched event on one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDescriptor {
    pub kind: EventKind,
    /// Solidity signature the topic hash derives from.
    pub signature: &'static str,
    /// Contract address the filter targets, lowercase hex.
    pub address: String,
    /// keccak-256 of `signature`, matched against log `topics[0]`.
    pub topic0: &'static str,
}

/// Deployed contract addresses. Any unset contract simply goes
/// unwatched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    #[serde(default)]
    pub heroes: Option<String>,
    #[serde(default)]
    pub marketplace: Option<String>,
    #[serde(default)]
    pub essence: Option<String>,
    #[serde(default)]
    pub activity: Option<String>,
}

impl ContractAddresses {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heroes.is_none()
            && self.marketplace.is_none()
            && self.essence.is_none()
            && self.activity.is_none()
    }
}

const HERO_EVENTS: &[(EventKind, &str, &str)] = &[
    (
        EventKind::HeroTransferred,
        "Transfer(address,address,uint256)",
        topics::TRANSFER,
    ),
    (
        EventKind::HeroMinted,
        "HeroMinted(address,uint256)",
        topics::HERO_MINTED,
    ),
    (
        EventKind::HeroEvolved,
        "HeroEvolved(uint256,uint8)",
        topics::HERO_EVOLVED,
    ),
    (
        EventKind::HeroStaked,
        "HeroStaked(address,uint256)",
        topics::HERO_STAKED,
    ),
    (
        EventKind::HeroUnstaked,
        "HeroUnstaked(address,uint256)",
        topics::HERO_UNSTAKED,
    ),
];

const MARKETPLACE_EVENTS: &[(EventKind, &str, &str)] = &[
    (
        EventKind::ListingCreated,
        "ListingCreated(uint256,address,uint256)",
        topics::LISTING_CREATED,
    ),
    (
        EventKind::ListingSold,
        "ListingSold(uint256,address,address,uint256)",
        topics::LISTING_SOLD,
    ),
    (
        EventKind::ListingCancelled,
        "ListingCancelled(uint256,address)",
        topics::LISTING_CANCELLED,
    ),
];

const ESSENCE_EVENTS: &[(EventKind, &str, &str)] = &[
    (
        EventKind::EssenceTransferred,
        "Transfer(address,address,uint256)",
        topics::TRANSFER,
    ),
    (
        EventKind::EssenceMinted,
        "EssenceMinted(address,uint256)",
        topics::ESSENCE_MINTED,
    ),
    (
        EventKind::EssenceBurned,
        "EssenceBurned(address,uint256)",
        topics::ESSENCE_BURNED,
    ),
];

const ACTIVITY_EVENTS: &[(EventKind, &str, &str)] = &[(
    EventKind::ActivityCreated,
    "ActivityRecorded(address,uint8,uint256)",
    topics::ACTIVITY_RECORDED,
)];

/// Builds the descriptor list for every configured contract.
///
/// A missing or malformed address drops that contract's descriptors
/// with a warning; polling proceeds with whatever remains.
#[must_use]
pub fn catalogue(contracts: &ContractAddresses) -> Vec<EventDescriptor> {
    let mut descriptors = Vec::new();
    let groups: [(&str, &Option<String>, &[(EventKind, &str, &str)]); 4] = [
        ("heroes", &contracts.heroes, HERO_EVENTS),
        ("marketplace", &contracts.marketplace, MARKETPLACE_EVENTS),
        ("essence", &contracts.essence, ESSENCE_EVENTS),
        ("activity", &contracts.activity, ACTIVITY_EVENTS),
    ];
    for (contract, address, events) in groups {
        let Some(address) = address else {
            continue;
        };
        let address = match normalize_address(address) {
            Ok(address) => address,
            Err(error) => {
                warn!(contract, %error, "invalid contract address; contract left unwatched");
                continue;
            }
        };
        for &(kind, signature, topic0) in events {
            descriptors.push(EventDescriptor {
                kind,
                signature,
                address: address.clone(),
                topic0,
            });
        }
    }
    descriptors
}
