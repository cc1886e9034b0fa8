//! Poller control endpoints.

use crate::admin::types::{
    AdminError, Envelope, PollerStatusResponse, ReplayRequest, ReplayResponse,
};
use crate::admin::AdminState;
use axum::extract::State;
use axum::Json;
use ember_core::events::PollerError;
use tracing::info;

/// Returns the poller's current state and counters.
#[utoipa::path(
    get,
    path = "/admin/poller/status",
    tag = "Poller",
    responses(
        (status = 200, description = "Poller status", body = Envelope<PollerStatusResponse>)
    )
)]
pub async fn get_status(State(state): State<AdminState>) -> Json<Envelope<PollerStatusResponse>> {
    Envelope::ok(state.poller.status().into())
}

/// Re-enables polling after a stop.
#[utoipa::path(
    post,
    path = "/admin/poller/start",
    tag = "Poller",
    responses(
        (status = 200, description = "Poller running", body = Envelope<PollerStatusResponse>)
    )
)]
pub async fn start(State(state): State<AdminState>) -> Json<Envelope<PollerStatusResponse>> {
    state.poller.resume();
    info!("admin started poller");
    Envelope::ok(state.poller.status().into())
}

/// Disables polling; waits for any in-flight tick to finish.
#[utoipa::path(
    post,
    path = "/admin/poller/stop",
    tag = "Poller",
    responses(
        (status = 200, description = "Poller stopped", body = Envelope<PollerStatusResponse>)
    )
)]
pub async fn stop(State(state): State<AdminState>) -> Json<Envelope<PollerStatusResponse>> {
    state.poller.stop().await;
    info!("admin stopped poller");
    Envelope::ok(state.poller.status().into())
}

/// Replays a block range through decoding and routing. Does not move
/// the cursor.
#[utoipa::path(
    post,
    path = "/admin/poller/replay",
    tag = "Poller",
    request_body = ReplayRequest,
    responses(
        (status = 200, description = "Range replayed", body = Envelope<ReplayResponse>),
        (status = 400, description = "Invalid block range"),
        (status = 502, description = "Log fetch failed")
    )
)]
pub async fn replay(
    State(state): State<AdminState>,
    Json(request): Json<ReplayRequest>,
) -> Result<Json<Envelope<ReplayResponse>>, AdminError> {
    let events_routed = state
        .poller
        .process_range(request.from_block, request.to_block)
        .await
        .map_err(|error| match error {
            PollerError::InvalidRange { .. } => AdminError::bad_request(error.to_string()),
            PollerError::RangeFetchFailed { .. } => AdminError::bad_gateway(error.to_string()),
        })?;
    info!(
        from_block = request.from_block,
        to_block = request.to_block,
        events_routed,
        "admin replayed block range"
    );
    Ok(Envelope::ok(ReplayResponse {
        from_block: request.from_block,
        to_block: request.to_block,
        events_routed,
    }))
}
