//! Avalanche forecast endpoints

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::forecast::Region;

const ALL_REGIONS: &str = "ALL";

pub fn create_forecasts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_regions))
        .route("/{region}", get(get_forecast))
        .route("/{region}/danger-rating-icon.svg", get(region_danger_icon))
        .route(
            "/graphics/{alp}/{tln}/{btl}/danger-rating-icon.svg",
            get(danger_icon),
        )
}

/// GET /forecasts - the region catalog
pub async fn list_regions(State(state): State<AppState>) -> Json<Vec<Region>> {
    Json(state.forecast_service.catalog().regions().to_vec())
}

/// GET /forecasts/{region}.{format}
///
/// `ALL.json` answers every upstream-backed region at once.
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let (region, format) = file
        .rsplit_once('.')
        .ok_or_else(|| ApiError::not_found(format!("Unknown forecast '{}'", file)))?;

    match format {
        "json" if region == ALL_REGIONS => {
            let all: BTreeMap<String, Value> = state.forecast_service.all_forecasts().await?;
            Ok(Json(all).into_response())
        }
        "json" => {
            let forecast = state.forecast_service.region_forecast(region).await?;
            Ok(Json(forecast).into_response())
        }
        "xml" => Err(ApiError::not_found("XML forecasts are no longer supported")),
        other => Err(ApiError::not_found(format!(
            "Unsupported forecast format '{}'",
            other
        ))),
    }
}

/// GET /forecasts/{region}/danger-rating-icon.svg
pub async fn region_danger_icon(
    State(state): State<AppState>,
    Path(region): Path<String>,
) -> Result<Response, ApiError> {
    let svg = state.forecast_service.region_danger_icon(&region).await?;
    Ok(svg_response(svg))
}

/// GET /forecasts/graphics/{alp}/{tln}/{btl}/danger-rating-icon.svg
pub async fn danger_icon(
    State(state): State<AppState>,
    Path((alp, tln, btl)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let svg = state.forecast_service.danger_icon(&alp, &tln, &btl).await?;
    Ok(svg_response(svg))
}

fn svg_response(svg: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        svg,
    )
        .into_response()
}
