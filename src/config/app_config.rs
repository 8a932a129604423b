use std::time::Duration;

use serde::Deserialize;

use crate::domain::forecast::Region;
use crate::domain::TtlPolicy;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub observability: ObservabilitySettings,
    pub cache: CacheSettings,
    pub upstream: UpstreamSettings,
    pub reports: ReportSettings,
    pub forecast: ForecastSettings,
    pub admin: AdminSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ObservabilitySettings {
    pub tracing: TracingSettings,
    pub metrics: MetricsSettings,
}

/// OpenTelemetry span export; log output is configured under `[logging]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingSettings {
    pub enabled: bool,
    pub otlp_endpoint: String,
    pub service_name: String,
    /// Share of traces exported; values outside `0.0..=1.0` saturate
    pub sampling_ratio: f64,
}

/// Prometheus endpoint served beside the portal routes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// `in_memory` or `redis`
    pub backend: String,
    pub redis_url: Option<String>,
    pub key_prefix: Option<String>,
    pub max_capacity: u64,
    /// Applied when a write does not name a TTL class
    pub default_ttl_secs: u64,
    pub list_ttl_secs: u64,
    pub item_ttl_secs: u64,
    /// Unset means rendered fragments never expire
    pub fragment_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    pub mcr_base_url: String,
    pub forecast_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Reports whose first date is older than this many days are left out of the list
    pub limit_days: i64,
    /// Report/user pairs fetched concurrently while building the list
    pub fetch_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ForecastSettings {
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AdminSettings {
    /// Bearer token for `/admin`; the admin routes are disabled when unset
    pub token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: "avalanche-gateway".to_string(),
            sampling_ratio: 1.0,
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsSettings {
    /// Route of the metrics endpoint, rooted even when configured as `metrics`
    pub fn route(&self) -> String {
        let path = self.path.trim().trim_start_matches('/');
        format!("/{}", path)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: "in_memory".to_string(),
            redis_url: None,
            key_prefix: None,
            max_capacity: 10_000,
            default_ttl_secs: 300,
            list_ttl_secs: 300,
            item_ttl_secs: 3600,
            fragment_ttl_secs: None,
        }
    }
}

impl CacheSettings {
    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            list: Duration::from_secs(self.list_ttl_secs),
            item: Duration::from_secs(self.item_ttl_secs),
            fragment: self.fragment_ttl_secs.map(Duration::from_secs),
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            mcr_base_url: "https://www.mountainconditions.com/sapi/public".to_string(),
            forecast_base_url: "https://www.avalanche.ca/api/forecasts".to_string(),
            timeout_secs: 10,
        }
    }
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            limit_days: 7,
            fetch_concurrency: 8,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
