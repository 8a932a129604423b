//! Infrastructure services

mod forecast_service;
mod report_service;

pub use forecast_service::ForecastService;
pub use report_service::{ReportService, ReportServiceConfig};
