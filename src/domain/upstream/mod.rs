//! Upstream provider abstraction

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::DomainError;

/// Query string parameters, passed through to the upstream untouched
pub type Query<'a> = &'a [(&'a str, String)];

/// JSON-over-HTTP access to an external data provider
///
/// Implementations never cache; memoization is the caller's job.
#[async_trait]
pub trait UpstreamClient: Send + Sync + std::fmt::Debug {
    /// Name used in logs and metrics (e.g. `mcr`, `forecast`)
    fn name(&self) -> &str;

    /// Issues a GET for `path` relative to the upstream base URL
    ///
    /// Fails with `Transport` on network errors and timeouts, `UpstreamStatus`
    /// for non-success responses and `Parse` when the body is not JSON.
    async fn fetch_json(&self, path: &str, query: Query<'_>) -> Result<Value, DomainError>;
}
