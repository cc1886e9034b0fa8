//! Admin API module.
//!
//! Monitoring and control surface for the cache service: statistics,
//! manual invalidation, poller control and health. Shares process state
//! with the runtime through `Arc` references.

pub mod handlers;
pub mod types;

use axum::routing::{get, post};
use axum::{Json, Router};
use ember_core::cache::CacheManager;
use ember_core::config::AppConfig;
use ember_core::events::EventPoller;
use ember_core::runtime::EmberRuntime;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub cache: Arc<CacheManager>,
    pub poller: Arc<EventPoller>,
    pub config: Arc<AppConfig>,
    /// Server start time for uptime reporting.
    pub start_time: Instant,
    /// Wall-clock start time, reported as RFC3339.
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Application version from `Cargo.toml`.
    pub version: &'static str,
}

impl AdminState {
    #[must_use]
    pub fn new(cache: Arc<CacheManager>, poller: Arc<EventPoller>, config: Arc<AppConfig>) -> Self {
        Self {
            cache,
            poller,
            config,
            start_time: Instant::now(),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Builds admin state from a constructed runtime.
    #[must_use]
    pub fn from_runtime(runtime: &EmberRuntime) -> Self {
        Self::new(
            Arc::clone(runtime.cache()),
            Arc::clone(runtime.poller()),
            Arc::new(runtime.config().clone()),
        )
    }

    /// Returns a human-readable uptime string.
    #[must_use]
    pub fn uptime_string(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let days = secs / 86400;
        let hours = (secs % 86400) / 3600;
        let mins = (secs % 3600) / 60;
        format!("{days}d {hours}h {mins}m")
    }
}

/// `OpenAPI` documentation for the Ember Admin API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ember Admin API",
        version = "1.0.0",
        description = "Admin API for monitoring and managing the Ember cache service"
    ),
    paths(
        handlers::cache::get_stats,
        handlers::cache::clear_all,
        handlers::cache::clear_namespace,
        handlers::cache::invalidate_entry,
        handlers::cache::invalidate_pattern,
        handlers::poller::get_status,
        handlers::poller::start,
        handlers::poller::stop,
        handlers::poller::replay,
        handlers::system::get_health,
        handlers::system::get_info,
    ),
    components(schemas(
        types::NamespaceStatsEntry,
        types::CacheStatsResponse,
        types::ClearResponse,
        types::InvalidateRequest,
        types::InvalidateResponse,
        types::InvalidatePatternRequest,
        types::ReplayRequest,
        types::ReplayResponse,
        types::PollerStatusResponse,
        types::NamespaceHealthEntry,
        types::HealthResponse,
        types::SystemInfoResponse,
        types::Envelope<types::CacheStatsResponse>,
        types::Envelope<types::ClearResponse>,
        types::Envelope<types::InvalidateResponse>,
        types::Envelope<types::ReplayResponse>,
        types::Envelope<types::PollerStatusResponse>,
        types::Envelope<types::HealthResponse>,
        types::Envelope<types::SystemInfoResponse>,
    )),
    tags(
        (name = "Cache", description = "Cache statistics and invalidation"),
        (name = "Poller", description = "Chain poller control"),
        (name = "System", description = "Health and process information")
    )
)]
pub struct ApiDoc;

/// Creates the admin API router with all endpoints.
pub fn create_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/cache/stats", get(handlers::cache::get_stats))
        .route("/admin/cache/clear", post(handlers::cache::clear_all))
        .route(
            "/admin/cache/{namespace}/clear",
            post(handlers::cache::clear_namespace),
        )
        .route(
            "/admin/cache/{namespace}/invalidate",
            post(handlers::cache::invalidate_entry),
        )
        .route(
            "/admin/cache/{namespace}/invalidate-pattern",
            post(handlers::cache::invalidate_pattern),
        )
        .route("/admin/poller/status", get(handlers::poller::get_status))
        .route("/admin/poller/start", post(handlers::poller::start))
        .route("/admin/poller/stop", post(handlers::poller::stop))
        .route("/admin/poller/replay", post(handlers::poller::replay))
        .route("/admin/health", get(handlers::system::get_health))
        .route("/admin/system/info", get(handlers::system::get_info))
        .route(
            "/admin/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
