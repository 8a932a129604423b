use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::upstream::{Query, UpstreamClient};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_upstream_request;

/// Configuration for one upstream provider
#[derive(Debug, Clone)]
pub struct HttpUpstreamConfig {
    /// Name used in logs, errors and metrics
    pub name: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpUpstreamConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// JSON-over-HTTP upstream using reqwest
#[derive(Debug, Clone)]
pub struct HttpUpstreamClient {
    client: reqwest::Client,
    config: HttpUpstreamConfig,
}

impl HttpUpstreamClient {
    pub fn new(config: HttpUpstreamConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("avalanche-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                DomainError::configuration(format!(
                    "Failed to build HTTP client for '{}': {}",
                    config.name, e
                ))
            })?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn transport_error(&self, e: reqwest::Error) -> DomainError {
        let message = if e.is_timeout() {
            format!("Request timed out after {:?}", self.config.timeout)
        } else if e.is_connect() {
            format!("Connection failed: {}", e)
        } else {
            format!("Request failed: {}", e)
        };

        DomainError::transport(&self.config.name, message)
    }

    async fn request(&self, path: &str, query: Query<'_>) -> (Result<Value, DomainError>, &'static str) {
        let response = match self.client.get(self.url(path)).query(query).send().await {
            Ok(response) => response,
            Err(e) => return (Err(self.transport_error(e)), "transport"),
        };

        let status = response.status();
        if !status.is_success() {
            return (
                Err(DomainError::upstream_status(&self.config.name, status.as_u16())),
                "status",
            );
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return (Err(self.transport_error(e)), "transport"),
        };

        match serde_json::from_slice(&body) {
            Ok(value) => (Ok(value), "ok"),
            Err(e) => (
                Err(DomainError::parse(format!(
                    "Invalid JSON from {} {}: {}",
                    self.config.name, path, e
                ))),
                "parse",
            ),
        }
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch_json(&self, path: &str, query: Query<'_>) -> Result<Value, DomainError> {
        let started = Instant::now();
        let (result, outcome) = self.request(path, query).await;
        let elapsed = started.elapsed();

        record_upstream_request(&self.config.name, outcome, elapsed);

        match &result {
            Ok(_) => debug!(
                upstream = %self.config.name,
                path = %path,
                elapsed_ms = elapsed.as_millis() as u64,
                "Upstream request succeeded"
            ),
            Err(e) => warn!(
                upstream = %self.config.name,
                path = %path,
                outcome = outcome,
                error = %e,
                "Upstream request failed"
            ),
        }

        result
    }
}
