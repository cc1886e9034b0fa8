//! Cache health scoring.
//!
//! The score starts at 100 and loses 10 points per namespace with a hit
//! rate under 50%, plus 20 points when the poller is not running. The
//! penalty applies to cold namespaces too, so a freshly started process
//! reports unhealthy until traffic warms it up.

use crate::cache::CacheManager;
use serde::Serialize;

const LOW_HIT_RATE_THRESHOLD: f64 = 50.0;
const LOW_HIT_RATE_PENALTY: i32 = 10;
const POLLER_DOWN_PENALTY: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Unhealthy,
}

impl HealthStatus {
    fn from_score(score: u32) -> Self {
        match score {
            80..=100 => Self::Healthy,
            60..=79 => Self::Warning,
            _ => Self::Unhealthy,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One namespace's contribution to the health report.
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceHealth {
    pub name: String,
    pub hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub score: u32,
    pub poller_running: bool,
    pub namespaces: Vec<NamespaceHealth>,
}

/// Scores the cache tier from its counters and the poller state.
#[must_use]
pub fn evaluate(cache: &CacheManager, poller_running: bool) -> HealthReport {
    let mut score: i32 = 100;
    let mut namespaces = Vec::new();

    for (name, stats) in cache.stats().namespaces {
        let hit_rate = stats.hit_rate();
        if hit_rate < LOW_HIT_RATE_THRESHOLD {
            score -= LOW_HIT_RATE_PENALTY;
        }
        namespaces.push(NamespaceHealth {
            name,
            hit_rate,
            hits: stats.hits,
            misses: stats.misses,
            size: stats.size,
        });
    }
    if !poller_running {
        score -= POLLER_DOWN_PENALTY;
    }

    let score = score.max(0) as u32;
    HealthReport {
        status: HealthStatus::from_score(score),
        score,
        poller_running,
        namespaces,
    }
}
