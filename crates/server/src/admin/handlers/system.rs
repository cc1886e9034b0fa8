//! Health and system information endpoints.

use crate::admin::types::{Envelope, HealthResponse, SystemInfoResponse};
use crate::admin::AdminState;
use axum::extract::State;
use axum::Json;
use ember_core::health;

/// Scores the cache tier and poller.
#[utoipa::path(
    get,
    path = "/admin/health",
    tag = "System",
    responses(
        (status = 200, description = "Health report", body = Envelope<HealthResponse>)
    )
)]
pub async fn get_health(State(state): State<AdminState>) -> Json<Envelope<HealthResponse>> {
    let report = health::evaluate(&state.cache, state.poller.is_running());
    Envelope::ok(report.into())
}

/// Static process information.
#[utoipa::path(
    get,
    path = "/admin/system/info",
    tag = "System",
    responses(
        (status = 200, description = "System info", body = Envelope<SystemInfoResponse>)
    )
)]
pub async fn get_info(State(state): State<AdminState>) -> Json<Envelope<SystemInfoResponse>> {
    Envelope::ok(SystemInfoResponse {
        name: "ember".to_string(),
        version: state.version.to_string(),
        uptime: state.uptime_string(),
        started_at: state.started_at.to_rfc3339(),
        namespaces: state.cache.namespace_names().len(),
        watched_events: state.poller.status().descriptors,
        poll_interval_seconds: state.config.chain.poll_interval_seconds,
    })
}
