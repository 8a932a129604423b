//! Application configuration

mod app_config;

pub use app_config::{
    AdminSettings, AppConfig, CacheSettings, ForecastSettings, LogFormat, LoggingConfig,
    MetricsSettings, ObservabilitySettings, ReportSettings, ServerConfig, TracingSettings,
    UpstreamSettings,
};
