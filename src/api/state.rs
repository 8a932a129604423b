//! Application state for shared services

use std::sync::Arc;

use crate::domain::Cache;
use crate::infrastructure::cache::CacheType;
use crate::infrastructure::services::{ForecastService, ReportService};

use super::middleware::AdminToken;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub report_service: Arc<ReportService>,
    pub forecast_service: Arc<ForecastService>,
    pub cache: Arc<dyn Cache>,
    pub cache_backend: CacheType,
    /// Admin routes are disabled when unset
    pub admin_token: Option<AdminToken>,
}

impl AppState {
    pub fn new(
        report_service: Arc<ReportService>,
        forecast_service: Arc<ForecastService>,
        cache: Arc<dyn Cache>,
        cache_backend: CacheType,
    ) -> Self {
        Self {
            report_service,
            forecast_service,
            cache,
            cache_backend,
            admin_token: None,
        }
    }

    pub fn with_admin_token(mut self, token: AdminToken) -> Self {
        self.admin_token = Some(token);
        self
    }
}
