//! Cache maintenance admin endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::report::parse_report_id;

/// Cache statistics response
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub backend: String,
    pub entries: usize,
}

/// Number of entries removed by an eviction
#[derive(Debug, Clone, Serialize)]
pub struct EvictionResponse {
    pub deleted: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurgeQuery {
    /// Glob over cache keys; everything when absent
    pub pattern: Option<String>,
}

/// GET /admin/cache/stats
pub async fn cache_stats(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<CacheStatsResponse>, ApiError> {
    let entries = state.cache.size().await?;

    Ok(Json(CacheStatsResponse {
        backend: state.cache_backend.to_string(),
        entries,
    }))
}

/// DELETE /admin/cache?pattern=<glob>
pub async fn purge_cache(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<PurgeQuery>,
) -> Result<Json<EvictionResponse>, ApiError> {
    let pattern = query.pattern.unwrap_or_else(|| "*".to_string());
    let deleted = state.cache.delete_pattern(&pattern).await?;

    info!(pattern = %pattern, deleted = deleted, "Purged cache entries");
    Ok(Json(EvictionResponse { deleted }))
}

/// DELETE /admin/cache/reports - drop the cached report list
pub async fn invalidate_reports(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<EvictionResponse>, ApiError> {
    let deleted = state.report_service.invalidate_list().await?;

    Ok(Json(EvictionResponse { deleted }))
}

/// DELETE /admin/cache/reports/{id}
pub async fn invalidate_report(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EvictionResponse>, ApiError> {
    let id = parse_report_id(&id).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let deleted = state.report_service.invalidate_report(id).await?;

    Ok(Json(EvictionResponse { deleted }))
}
