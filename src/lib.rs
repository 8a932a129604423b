//! Avalanche Gateway
//!
//! Server-side caching layer for the avalanche portal:
//! - Mountain conditions reports aggregated from the MCR upstream
//! - Regional avalanche forecasts and danger-rating icons
//! - Pluggable cache backends (in-memory or Redis) with per-class lifetimes

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::middleware::AdminToken;
use api::state::AppState;
use domain::RegionCatalog;
use infrastructure::{
    cache::{CacheConfig, CacheFactory},
    services::{ForecastService, ReportService, ReportServiceConfig},
    upstream::{HttpUpstreamClient, HttpUpstreamConfig},
};
use tracing::{info, warn};

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache_config = CacheConfig::from_settings(&config.cache)?;
    let cache = CacheFactory::new().create(&cache_config).await?;

    info!(backend = %cache_config.cache_type, "Cache backend ready");

    let mcr = HttpUpstreamClient::new(
        HttpUpstreamConfig::new("mcr", config.upstream.mcr_base_url.clone())
            .with_timeout(config.upstream.timeout()),
    )?;
    let forecast = HttpUpstreamClient::new(
        HttpUpstreamConfig::new("forecast", config.upstream.forecast_base_url.clone())
            .with_timeout(config.upstream.timeout()),
    )?;

    let ttl = config.cache.ttl_policy();

    let report_service = ReportService::new(
        cache.clone(),
        Arc::new(mcr),
        ReportServiceConfig {
            limit_days: config.reports.limit_days,
            fetch_concurrency: config.reports.fetch_concurrency.max(1),
            ttl,
        },
    );

    let catalog = RegionCatalog::new(config.forecast.regions.clone());
    info!(regions = catalog.regions().len(), "Forecast regions loaded");

    let forecast_service = ForecastService::new(cache.clone(), Arc::new(forecast), Arc::new(catalog), ttl);

    let state = AppState::new(
        Arc::new(report_service),
        Arc::new(forecast_service),
        cache,
        cache_config.cache_type,
    );

    match config.admin.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => {
            info!("Admin API enabled");
            Ok(state.with_admin_token(AdminToken::new(token)))
        }
        Some(_) => {
            warn!("Admin token is empty, admin API disabled");
            Ok(state)
        }
        None => Ok(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdminSettings;

    #[tokio::test]
    async fn test_create_app_state_defaults() {
        let state = create_app_state().await.unwrap();

        assert!(state.admin_token.is_none());
        assert_eq!(state.cache.size().await.unwrap(), 0);
        assert!(state.forecast_service.catalog().regions().is_empty());
    }

    #[tokio::test]
    async fn test_create_app_state_with_admin_token() {
        let config = AppConfig {
            admin: AdminSettings {
                token: Some("s3cret".to_string()),
            },
            ..Default::default()
        };

        let state = create_app_state_with_config(&config).await.unwrap();
        assert!(state.admin_token.unwrap().verify("s3cret"));
    }

    #[tokio::test]
    async fn test_blank_admin_token_disables_admin() {
        let config = AppConfig {
            admin: AdminSettings {
                token: Some("  ".to_string()),
            },
            ..Default::default()
        };

        let state = create_app_state_with_config(&config).await.unwrap();
        assert!(state.admin_token.is_none());
    }

    #[tokio::test]
    async fn test_unknown_cache_backend_fails() {
        let mut config = AppConfig::default();
        config.cache.backend = "memcached".to_string();

        assert!(create_app_state_with_config(&config).await.is_err());
    }
}
