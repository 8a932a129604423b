//! Observability infrastructure - Tracing, Metrics, and Logging

mod metrics;
mod tracing_setup;

pub use metrics::{
    create_metrics_router, init_metrics, record_http_request, record_upstream_request,
    sanitize_path, PrometheusMetrics,
};
pub use tracing_setup::{init_tracing, shutdown_tracing};
