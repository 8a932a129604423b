//! Admin API endpoints for cache maintenance

pub mod cache;

use axum::{
    routing::{delete, get},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/cache/stats", get(cache::cache_stats))
        .route("/cache", delete(cache::purge_cache))
        .route("/cache/reports", delete(cache::invalidate_reports))
        .route("/cache/reports/{id}", delete(cache::invalidate_report))
}
