//! Mountain conditions report endpoints

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::report::parse_report_id;
use crate::domain::FormattedReport;

pub fn create_reports_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reports))
        .route("/{id}", get(get_report))
}

/// GET /reports - recent reports, newest first
pub async fn list_reports(
    State(state): State<AppState>,
) -> Result<Json<Vec<FormattedReport>>, ApiError> {
    let reports = state.report_service.get_list().await?;

    debug!(count = reports.len(), "Listing reports");
    Ok(Json(reports))
}

/// GET /reports/{id}
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FormattedReport>, ApiError> {
    let id = parse_report_id(&id)?;
    let report = state.report_service.get_item(id).await?;

    Ok(Json(report))
}
