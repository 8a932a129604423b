//! Cache trait definition

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::key::key_label;
use super::ttl::{Ttl, Validity};
use crate::domain::DomainError;

/// Generic cache trait for key-value operations with TTL support
///
/// This trait uses JSON strings internally to be dyn-compatible.
/// Use the helper methods of [`CacheExt`] for typed access and `wrap`.
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Lifetime applied when a write asks for [`Ttl::Default`] (`None` = never expires)
    fn default_ttl(&self) -> Option<Duration>;

    /// Gets a raw JSON value; expired entries are reported as absent
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a raw JSON value, replacing any previous entry (`ttl: None` = never expires)
    async fn set_raw(&self, key: &str, value: &str, ttl: Option<Duration>)
        -> Result<(), DomainError>;

    /// Deletes a value from the cache, returning whether a live entry existed
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Deletes every key matching a glob pattern (`*` matches any run of characters)
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError>;

    /// Checks if a live entry exists for the key
    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    /// Reports the remaining validity of a key
    async fn ttl(&self, key: &str) -> Result<Validity, DomainError>;

    /// Clears all entries from the cache
    async fn clear(&self) -> Result<(), DomainError>;

    /// Returns approximate number of entries in the cache
    async fn size(&self) -> Result<usize, DomainError>;
}

/// Extension trait providing typed get/set and get-or-populate
pub trait CacheExt: Cache {
    /// Gets a typed value from the cache
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl Future<Output = Result<Option<V>, DomainError>> + Send + 'a
    where
        V: DeserializeOwned + Send + 'a,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::cache(format!("Failed to deserialize cache value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Sets a typed value in the cache
    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Ttl,
    ) -> impl Future<Output = Result<(), DomainError>> + Send + 'a
    where
        V: Serialize + Send + Sync + 'a,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, &data, ttl.resolve(self.default_ttl()))
                .await
        }
    }

    /// Returns the live value for `key`, or runs `populate` and stores its result
    ///
    /// A populate failure is returned unchanged and nothing is stored. Store
    /// failures are converted into `E` and returned; they never fall back to
    /// a stale value. Concurrent misses on the same key may each run
    /// `populate`; the last write wins.
    fn wrap<'a, V, E, F, Fut>(
        &'a self,
        key: &'a str,
        ttl: Ttl,
        populate: F,
    ) -> impl Future<Output = Result<V, E>> + Send + 'a
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'a,
        E: From<DomainError> + Send + 'a,
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<V, E>> + Send + 'a,
    {
        async move {
            let label = key_label(key).to_string();

            if let Some(data) = self.get_raw(key).await? {
                match serde_json::from_str::<V>(&data) {
                    Ok(value) => {
                        metrics::counter!(
                            "cache_lookups_total",
                            "namespace" => label,
                            "result" => "hit"
                        )
                        .increment(1);
                        return Ok(value);
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                    }
                }
            }

            metrics::counter!("cache_lookups_total", "namespace" => label, "result" => "miss")
                .increment(1);
            debug!(key = %key, "Cache miss, populating");

            let value = populate().await?;
            self.set(key, &value, ttl).await?;

            Ok(value)
        }
    }
}

// Blanket implementation for all types implementing Cache
impl<T: Cache + ?Sized> CacheExt for T {}

/// Converts a glob (`*` wildcard) into an anchored regex
pub(crate) fn glob_to_regex(pattern: &str) -> Result<regex::Regex, DomainError> {
    let escaped: Vec<String> = pattern.split('*').map(regex::escape).collect();
    let source = format!("^{}$", escaped.join(".*"));

    regex::Regex::new(&source).map_err(|e| DomainError::cache(format!("Invalid pattern: {}", e)))
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock cache for testing
    ///
    /// Entries never expire on their own; the requested lifetime is recorded
    /// so tests can assert which TTL class a write used.
    #[derive(Debug)]
    pub struct MockCache {
        entries: Mutex<HashMap<String, (String, Option<Duration>)>>,
        error: Mutex<Option<String>>,
        write_error: Mutex<Option<String>>,
        default_ttl: Option<Duration>,
    }

    impl Default for MockCache {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockCache {
        pub fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                error: Mutex::new(None),
                write_error: Mutex::new(None),
                default_ttl: Some(Duration::from_secs(3600)),
            }
        }

        pub fn with_entry<V: Serialize>(self, key: &str, value: &V, ttl: Option<Duration>) -> Self {
            let json = serde_json::to_string(value).unwrap();
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (json, ttl));
            self
        }

        pub fn with_raw_entry(self, key: &str, raw: &str) -> Self {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (raw.to_string(), None));
            self
        }

        /// Every operation fails
        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self
        }

        /// Reads succeed, writes fail
        pub fn with_write_error(self, error: impl Into<String>) -> Self {
            *self.write_error.lock().unwrap() = Some(error.into());
            self
        }

        pub fn keys(&self) -> Vec<String> {
            let mut keys: Vec<String> = self.entries.lock().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        }

        pub fn stored_ttl(&self, key: &str) -> Option<Option<Duration>> {
            self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
        }

        fn check_error(&self) -> Result<(), DomainError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::cache(error));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Cache for MockCache {
        fn default_ttl(&self) -> Option<Duration> {
            self.default_ttl
        }

        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.check_error()?;
            let entries = self.entries.lock().unwrap();

            Ok(entries.get(key).map(|(json, _)| json.clone()))
        }

        async fn set_raw(
            &self,
            key: &str,
            value: &str,
            ttl: Option<Duration>,
        ) -> Result<(), DomainError> {
            self.check_error()?;

            if let Some(error) = self.write_error.lock().unwrap().clone() {
                return Err(DomainError::cache(error));
            }

            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), ttl));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
            self.check_error()?;

            let regex = glob_to_regex(pattern)?;
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|k, _| !regex.is_match(k));

            Ok(before - entries.len())
        }

        async fn ttl(&self, key: &str) -> Result<Validity, DomainError> {
            self.check_error()?;
            let entries = self.entries.lock().unwrap();

            Ok(match entries.get(key) {
                None => Validity::Absent,
                Some((_, None)) => Validity::Persistent,
                Some((_, Some(ttl))) => Validity::Remaining(*ttl),
            })
        }

        async fn clear(&self) -> Result<(), DomainError> {
            self.check_error()?;
            self.entries.lock().unwrap().clear();
            Ok(())
        }

        async fn size(&self) -> Result<usize, DomainError> {
            self.check_error()?;
            Ok(self.entries.lock().unwrap().len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockCache;
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn counted(counter: &AtomicUsize, value: &str) -> Result<String, DomainError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(value.to_string())
    }

    #[tokio::test]
    async fn test_wrap_populates_once_within_ttl() {
        let cache = MockCache::new();
        let calls = AtomicUsize::new(0);

        let first: String = cache
            .wrap("region:whistler", Ttl::Default, || counted(&calls, "v1"))
            .await
            .unwrap();
        let second: String = cache
            .wrap("region:whistler", Ttl::Default, || counted(&calls, "v2"))
            .await
            .unwrap();

        assert_eq!(first, "v1");
        assert_eq!(second, "v1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrap_failure_stores_nothing() {
        let cache = MockCache::new();

        let result: Result<String, DomainError> = cache
            .wrap("mcr/report/1", Ttl::Default, || async {
                Err(DomainError::transport("mcr", "timed out"))
            })
            .await;

        assert!(matches!(result, Err(DomainError::Transport { .. })));
        assert!(cache.keys().is_empty());

        let calls = AtomicUsize::new(0);
        let value: String = cache
            .wrap("mcr/report/1", Ttl::Default, || counted(&calls, "ok"))
            .await
            .unwrap();

        assert_eq!(value, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[derive(Debug, PartialEq)]
    enum PopulateError {
        Upstream(&'static str),
        Store(String),
    }

    impl From<DomainError> for PopulateError {
        fn from(err: DomainError) -> Self {
            PopulateError::Store(err.to_string())
        }
    }

    #[tokio::test]
    async fn test_wrap_returns_populate_error_verbatim() {
        let cache = MockCache::new();

        let result: Result<String, PopulateError> = cache
            .wrap("k", Ttl::Default, || async {
                Err(PopulateError::Upstream("boom"))
            })
            .await;

        assert_eq!(result, Err(PopulateError::Upstream("boom")));
    }

    #[tokio::test]
    async fn test_wrap_propagates_store_read_failure() {
        let cache = MockCache::new().with_error("connection refused");
        let calls = AtomicUsize::new(0);

        let result: Result<String, DomainError> =
            cache.wrap("k", Ttl::Default, || counted(&calls, "v")).await;

        assert!(matches!(result, Err(DomainError::Cache { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrap_propagates_store_write_failure() {
        let cache = MockCache::new().with_write_error("read only replica");
        let calls = AtomicUsize::new(0);

        let result: Result<String, DomainError> =
            cache.wrap("k", Ttl::Default, || counted(&calls, "v")).await;

        assert!(matches!(result, Err(DomainError::Cache { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrap_repopulates_undecodable_entry() {
        let cache = MockCache::new().with_raw_entry("k", "not json");
        let calls = AtomicUsize::new(0);

        let value: String = cache
            .wrap("k", Ttl::Default, || counted(&calls, "fresh"))
            .await
            .unwrap();

        assert_eq!(value, "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrap_applies_requested_ttl() {
        let cache = MockCache::new();

        let _: String = cache
            .wrap("a", Ttl::After(Duration::from_secs(5)), || async {
                Ok::<_, DomainError>("x".to_string())
            })
            .await
            .unwrap();
        let _: String = cache
            .wrap("b", Ttl::Never, || async { Ok::<_, DomainError>("y".to_string()) })
            .await
            .unwrap();
        let _: String = cache
            .wrap("c", Ttl::Default, || async { Ok::<_, DomainError>("z".to_string()) })
            .await
            .unwrap();

        assert_eq!(cache.stored_ttl("a"), Some(Some(Duration::from_secs(5))));
        assert_eq!(cache.stored_ttl("b"), Some(None));
        assert_eq!(cache.stored_ttl("c"), Some(Some(Duration::from_secs(3600))));
    }

    #[tokio::test]
    async fn test_concurrent_cold_wrap_populates_at_least_once() {
        let cache = Arc::new(MockCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let run = |value: &'static str| {
            let cache = cache.clone();
            let calls = calls.clone();
            async move {
                cache
                    .wrap("region:whistler", Ttl::Default, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok::<_, DomainError>(value.to_string())
                    })
                    .await
            }
        };

        let (a, b) = tokio::join!(run("first"), run("second"));
        let a: String = a.unwrap();
        let b: String = b.unwrap();

        let n = calls.load(Ordering::SeqCst);
        assert!((1..=2).contains(&n));

        let stored: Option<String> = cache.get("region:whistler").await.unwrap();
        let stored = stored.unwrap();
        assert!(stored == a || stored == b);
    }

    #[test]
    fn test_glob_to_regex() {
        let regex = glob_to_regex("mcr/report/*").unwrap();
        assert!(regex.is_match("mcr/report/42"));
        assert!(!regex.is_match("mcr/user/42"));
        assert!(!regex.is_match("xmcr/report/42"));

        let literal = glob_to_regex("fragment/danger-icon:alp=1.0").unwrap();
        assert!(!literal.is_match("fragment/danger-icon:alp=100"));
    }

    #[tokio::test]
    async fn test_mock_cache_delete_pattern() {
        let cache = MockCache::new()
            .with_entry("mcr/report/1", &"a", None)
            .with_entry("mcr/report/2", &"b", None)
            .with_entry("mcr/user/1", &"c", None);

        let deleted = cache.delete_pattern("mcr/report/*").await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(cache.keys(), vec!["mcr/user/1".to_string()]);
    }
}
