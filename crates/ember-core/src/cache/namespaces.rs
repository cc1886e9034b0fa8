//! Namespace configuration.
//!
//! Every cache namespace declares its TTL, capacity and the chain events
//! that invalidate it. The built-in set covers the game's read paths;
//! deployments can override or extend it from the config file.

use crate::events::EventKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bumped when defaults change shape so operators can spot stale
/// overrides in their config files.
pub const SETTINGS_VERSION: u32 = 1;

/// Storage strategy a namespace asks for.
///
/// This process serves every namespace from local memory; the strategy
/// is parsed and surfaced so configs stay portable across deployments
/// that do offer a durable tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStrategy {
    #[default]
    InProcess,
    Durable,
    Hybrid,
}

impl CacheStrategy {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InProcess => "in-process",
            Self::Durable => "durable",
            Self::Hybrid => "hybrid",
        }
    }
}

/// One namespace's tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    pub name: String,
    /// Entry lifetime in milliseconds.
    pub ttl_ms: u64,
    /// Entry cap; unlimited when absent.
    #[serde(default)]
    pub max_size: Option<usize>,
    #[serde(default)]
    pub strategy: CacheStrategy,
    /// Events whose arrival invalidates this namespace.
    #[serde(default)]
    pub invalidate_on: Vec<EventKind>,
}

impl NamespaceConfig {
    fn new(
        name: &str,
        ttl_ms: u64,
        max_size: usize,
        strategy: CacheStrategy,
        invalidate_on: &[EventKind],
    ) -> Self {
        Self {
            name: name.to_string(),
            ttl_ms,
            max_size: Some(max_size),
            strategy,
            invalidate_on: invalidate_on.to_vec(),
        }
    }
}

/// The full cache layout: version stamp plus namespace list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<NamespaceConfig>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            namespaces: default_namespaces(),
        }
    }
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_namespaces() -> Vec<NamespaceConfig> {
    use EventKind::*;
    vec![
        NamespaceConfig::new(
            "metadata",
            30 * 60 * 1000,
            500,
            CacheStrategy::Hybrid,
            &[HeroEvolved, HeroTransferred, HeroMinted],
        ),
        NamespaceConfig::new(
            "listings",
            15 * 1000,
            200,
            CacheStrategy::InProcess,
            &[ListingCreated, ListingSold, ListingCancelled],
        ),
        NamespaceConfig::new(
            "heroes",
            5 * 60 * 1000,
            100,
            CacheStrategy::InProcess,
            &[HeroMinted, HeroTransferred, HeroEvolved, HeroStaked, HeroUnstaked],
        ),
        NamespaceConfig::new(
            "stats",
            2 * 60 * 1000,
            50,
            CacheStrategy::InProcess,
            &[HeroEvolved, HeroTransferred, HeroMinted, HeroStaked, HeroUnstaked],
        ),
        NamespaceConfig::new(
            "activity",
            60 * 1000,
            100,
            CacheStrategy::InProcess,
            &[ActivityCreated],
        ),
        NamespaceConfig::new(
            "essence",
            30 * 1000,
            20,
            CacheStrategy::InProcess,
            &[EssenceTransferred, EssenceMinted, EssenceBurned],
        ),
    ]
}

/// Rejections raised while validating [`CacheSettings`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheConfigError {
    #[error("no cache namespaces configured")]
    Empty,

    #[error("namespace name must not be empty")]
    UnnamedNamespace,

    #[error("duplicate namespace: {0}")]
    DuplicateNamespace(String),

    #[error("namespace {0} has a zero ttl")]
    ZeroTtl(String),

    #[error("namespace {0} has a zero max_size")]
    ZeroMaxSize(String),
}

impl CacheSettings {
    /// Checks structural soundness of the namespace list.
    ///
    /// # Errors
    ///
    /// Returns the first [`CacheConfigError`] found.
    pub fn validate(&self) -> Result<(), CacheConfigError> {
        if self.namespaces.is_empty() {
            return Err(CacheConfigError::Empty);
        }
        let mut seen = std::collections::HashSet::new();
        for ns in &self.namespaces {
            if ns.name.is_empty() {
                return Err(CacheConfigError::UnnamedNamespace);
            }
            if !seen.insert(ns.name.as_str()) {
                return Err(CacheConfigError::DuplicateNamespace(ns.name.clone()));
            }
            if ns.ttl_ms == 0 {
                return Err(CacheConfigError::ZeroTtl(ns.name.clone()));
            }
            if ns.max_size == Some(0) {
                return Err(CacheConfigError::ZeroMaxSize(ns.name.clone()));
            }
        }
        Ok(())
    }

    /// Looks up one namespace's config by name.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&NamespaceConfig> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }
}
