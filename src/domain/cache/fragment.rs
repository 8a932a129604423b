//! Cache for rendered fragments (SVG markup and the like)

use std::sync::Arc;

use tracing::debug;

use super::key::CacheKey;
use super::repository::{Cache, CacheExt};
use super::ttl::Ttl;
use crate::domain::DomainError;

/// Memoizes deterministic render output under a stable descriptor key
///
/// The render closure runs at most once per miss and is never retried; a
/// failed render stores nothing and its error is returned as-is.
#[derive(Debug, Clone)]
pub struct FragmentCache {
    cache: Arc<dyn Cache>,
    ttl: Ttl,
}

impl FragmentCache {
    pub fn new(cache: Arc<dyn Cache>, ttl: Ttl) -> Self {
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub async fn wrap<F>(&self, key: &CacheKey, render: F) -> Result<String, DomainError>
    where
        F: FnOnce() -> Result<String, DomainError> + Send,
    {
        self.cache
            .wrap(key.as_str(), self.ttl, || async move {
                debug!(key = %key, "Rendering fragment");
                render()
            })
            .await
    }
}
