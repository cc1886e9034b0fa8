//! Cache statistics and invalidation endpoints.

use crate::admin::types::{
    AdminError, CacheStatsResponse, ClearResponse, Envelope, InvalidatePatternRequest,
    InvalidateRequest, InvalidateResponse, NamespaceStatsEntry,
};
use crate::admin::AdminState;
use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

/// Returns per-namespace cache counters.
#[utoipa::path(
    get,
    path = "/admin/cache/stats",
    tag = "Cache",
    responses(
        (status = 200, description = "Cache statistics", body = Envelope<CacheStatsResponse>)
    )
)]
pub async fn get_stats(State(state): State<AdminState>) -> Json<Envelope<CacheStatsResponse>> {
    let report = state.cache.stats();
    let namespaces = report
        .namespaces
        .iter()
        .map(|(name, stats)| NamespaceStatsEntry::from_stats(name.clone(), stats))
        .collect();
    Envelope::ok(CacheStatsResponse {
        version: report.version,
        namespaces,
    })
}

/// Clears every namespace.
#[utoipa::path(
    post,
    path = "/admin/cache/clear",
    tag = "Cache",
    responses(
        (status = 200, description = "All namespaces cleared", body = Envelope<ClearResponse>)
    )
)]
pub async fn clear_all(State(state): State<AdminState>) -> Json<Envelope<ClearResponse>> {
    let removed = state.cache.clear_all();
    info!(removed, "admin cleared all caches");
    Envelope::ok(ClearResponse { removed })
}

/// Clears a single namespace.
#[utoipa::path(
    post,
    path = "/admin/cache/{namespace}/clear",
    tag = "Cache",
    params(("namespace" = String, Path, description = "Cache namespace")),
    responses(
        (status = 200, description = "Namespace cleared", body = Envelope<ClearResponse>),
        (status = 400, description = "Unknown namespace")
    )
)]
pub async fn clear_namespace(
    State(state): State<AdminState>,
    Path(namespace): Path<String>,
) -> Result<Json<Envelope<ClearResponse>>, AdminError> {
    let store_size = require_namespace(&state, &namespace)?;
    state.cache.invalidate(&namespace, None);
    info!(namespace, "admin cleared namespace");
    Ok(Envelope::ok(ClearResponse {
        removed: store_size,
    }))
}

/// Removes one entry from a namespace.
#[utoipa::path(
    post,
    path = "/admin/cache/{namespace}/invalidate",
    tag = "Cache",
    params(("namespace" = String, Path, description = "Cache namespace")),
    request_body = InvalidateRequest,
    responses(
        (status = 200, description = "Entry invalidated", body = Envelope<InvalidateResponse>),
        (status = 400, description = "Unknown namespace")
    )
)]
pub async fn invalidate_entry(
    State(state): State<AdminState>,
    Path(namespace): Path<String>,
    Json(request): Json<InvalidateRequest>,
) -> Result<Json<Envelope<InvalidateResponse>>, AdminError> {
    require_namespace(&state, &namespace)?;
    state.cache.invalidate(&namespace, Some(&request.id));
    info!(namespace, id = %request.id, "admin invalidated entry");
    Ok(Envelope::ok(InvalidateResponse {
        namespace,
        id: request.id,
    }))
}

/// Removes every entry whose key matches a regular expression.
#[utoipa::path(
    post,
    path = "/admin/cache/{namespace}/invalidate-pattern",
    tag = "Cache",
    params(("namespace" = String, Path, description = "Cache namespace")),
    request_body = InvalidatePatternRequest,
    responses(
        (status = 200, description = "Matching entries removed", body = Envelope<ClearResponse>),
        (status = 400, description = "Unknown namespace or invalid pattern")
    )
)]
pub async fn invalidate_pattern(
    State(state): State<AdminState>,
    Path(namespace): Path<String>,
    Json(request): Json<InvalidatePatternRequest>,
) -> Result<Json<Envelope<ClearResponse>>, AdminError> {
    require_namespace(&state, &namespace)?;
    let removed = state
        .cache
        .invalidate_pattern(&namespace, &request.pattern)
        .map_err(|error| AdminError::bad_request(format!("invalid pattern: {error}")))?;
    info!(namespace, pattern = %request.pattern, removed, "admin pattern invalidation");
    Ok(Envelope::ok(ClearResponse { removed }))
}

/// Validates the namespace and returns its current entry count.
fn require_namespace(state: &AdminState, namespace: &str) -> Result<usize, AdminError> {
    state
        .cache
        .stats()
        .namespaces
        .iter()
        .find(|(name, _)| name == namespace)
        .map(|(_, stats)| stats.size)
        .ok_or_else(|| AdminError::bad_request(format!("unknown namespace: {namespace}")))
}
