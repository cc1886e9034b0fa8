//! Admin API request and response types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ember_core::cache::NamespaceStats;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Uniform success wrapper for every admin response body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Error returned by admin handlers. Client mistakes carry their
/// message; internal failures stay opaque.
#[derive(Debug)]
pub struct AdminError {
    status: StatusCode,
    message: String,
}

impl AdminError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.message,
        }));
        (self.status, body).into_response()
    }
}

/// One namespace's counters plus derived hit rate.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NamespaceStatsEntry {
    pub name: String,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub invalidations: u64,
    pub evictions: u64,
    pub size: usize,
    pub hit_rate: f64,
}

impl NamespaceStatsEntry {
    pub fn from_stats(name: String, stats: &NamespaceStats) -> Self {
        Self {
            name,
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            invalidations: stats.invalidations,
            evictions: stats.evictions,
            size: stats.size,
            hit_rate: stats.hit_rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CacheStatsResponse {
    pub version: u32,
    pub namespaces: Vec<NamespaceStatsEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClearResponse {
    pub removed: usize,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InvalidateRequest {
    /// Entry key to remove.
    pub id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvalidateResponse {
    pub namespace: String,
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InvalidatePatternRequest {
    /// Regular expression matched against entry keys.
    pub pattern: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReplayRequest {
    pub from_block: u64,
    pub to_block: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReplayResponse {
    pub from_block: u64,
    pub to_block: u64,
    pub events_routed: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollerStatusResponse {
    pub running: bool,
    pub last_processed_block: Option<u64>,
    pub descriptors: usize,
    pub ticks: u64,
    pub events_processed: u64,
    pub fetch_failures: u64,
    pub decode_failures: u64,
}

impl From<ember_core::events::PollerStatus> for PollerStatusResponse {
    fn from(status: ember_core::events::PollerStatus) -> Self {
        Self {
            running: status.running,
            last_processed_block: status.last_processed_block,
            descriptors: status.descriptors,
            ticks: status.ticks,
            events_processed: status.events_processed,
            fetch_failures: status.fetch_failures,
            decode_failures: status.decode_failures,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NamespaceHealthEntry {
    pub name: String,
    pub hit_rate: f64,
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy`, `warning` or `unhealthy`.
    pub status: String,
    pub score: u32,
    pub poller_running: bool,
    pub namespaces: Vec<NamespaceHealthEntry>,
}

impl From<ember_core::health::HealthReport> for HealthResponse {
    fn from(report: ember_core::health::HealthReport) -> Self {
        Self {
            status: report.status.name().to_string(),
            score: report.score,
            poller_running: report.poller_running,
            namespaces: report
                .namespaces
                .into_iter()
                .map(|ns| NamespaceHealthEntry {
                    name: ns.name,
                    hit_rate: ns.hit_rate,
                    hits: ns.hits,
                    misses: ns.misses,
                    size: ns.size,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SystemInfoResponse {
    pub name: String,
    pub version: String,
    pub uptime: String,
    /// RFC3339 wall-clock time the server started.
    pub started_at: String,
    pub namespaces: usize,
    pub watched_events: usize,
    pub poll_interval_seconds: u64,
}
