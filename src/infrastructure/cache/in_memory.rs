//! In-memory cache implementation using moka

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::Expiry;

use crate::domain::cache::{glob_to_regex, Cache, Validity};
use crate::domain::DomainError;

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Lifetime for writes that do not ask for one (`None` = never expires)
    pub default_ttl: Option<Duration>,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            default_ttl: Some(Duration::from_secs(300)),
        }
    }
}

impl InMemoryCacheConfig {
    /// Creates a new configuration with specified max capacity
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Sets the default TTL
    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// Cache entry stored in moka
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized JSON value
    data: Arc<str>,
    /// Requested lifetime, `None` for persistent entries
    ttl: Option<Duration>,
    /// Monotonic deadline derived from `ttl`
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: &str, ttl: Option<Duration>) -> Self {
        Self {
            data: Arc::from(data),
            ttl,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn validity(&self, now: Instant) -> Validity {
        match self.expires_at {
            None => Validity::Persistent,
            Some(deadline) if deadline > now => Validity::Remaining(deadline - now),
            Some(_) => Validity::Absent,
        }
    }
}

/// Lets every entry carry its own lifetime
struct PerEntryExpiry;

impl Expiry<String, CacheEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// Thread-safe in-memory cache implementation using moka
///
/// Entries expire individually; capacity overflow evicts the least
/// recently used entries.
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    config: InMemoryCacheConfig,
}

impl InMemoryCache {
    /// Creates a new in-memory cache with default configuration
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    /// Creates a new in-memory cache with the given configuration
    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryExpiry)
            .build();

        Self { cache, config }
    }

    async fn live_entry(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.cache.get(key).await?;

        if entry.validity(Instant::now()).is_live() {
            Some(entry)
        } else {
            self.cache.remove(key).await;
            None
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    fn default_ttl(&self) -> Option<Duration> {
        self.config.default_ttl
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.live_entry(key).await.map(|e| e.data.to_string()))
    }

    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        self.cache
            .insert(key.to_string(), CacheEntry::new(value, ttl))
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let removed = self.cache.remove(key).await;
        Ok(removed.is_some_and(|e| e.validity(Instant::now()).is_live()))
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let regex = glob_to_regex(pattern)?;

        self.cache.run_pending_tasks().await;

        let cache_clone = self.cache.clone();
        let keys_to_delete: Vec<String> = tokio::task::spawn_blocking(move || {
            cache_clone
                .iter()
                .filter(|(k, _)| regex.is_match(k.as_str()))
                .map(|(k, _)| String::clone(&k))
                .collect()
        })
        .await
        .map_err(|e| DomainError::cache(format!("Failed to iterate cache: {}", e)))?;

        let mut deleted = 0;
        for key in keys_to_delete {
            if self.cache.remove(&key).await.is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    async fn ttl(&self, key: &str) -> Result<Validity, DomainError> {
        Ok(match self.live_entry(key).await {
            Some(entry) => entry.validity(Instant::now()),
            None => Validity::Absent,
        })
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{CacheExt, Ttl};

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Ttl::After(Duration::from_secs(60)))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = InMemoryCache::new();

        let result: Option<String> = cache.get("missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();

        cache.set("key1", &"value1", Ttl::Default).await.unwrap();

        assert!(cache.delete("key1").await.unwrap());
        assert!(!cache.exists("key1").await.unwrap());
        assert!(!cache.delete("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Ttl::After(Duration::from_millis(50)))
            .await
            .unwrap();

        assert!(cache.exists("key1").await.unwrap());

        tokio::time::sleep(Duration::from_millis(100)).await;

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert!(result.is_none());
        assert_eq!(cache.ttl("key1").await.unwrap(), Validity::Absent);
    }

    #[tokio::test]
    async fn test_entries_keep_their_own_lifetime() {
        let cache = InMemoryCache::with_config(
            InMemoryCacheConfig::default().with_default_ttl(Some(Duration::from_millis(50))),
        );

        cache.set("short", &1, Ttl::Default).await.unwrap();
        cache
            .set("long", &2, Ttl::After(Duration::from_secs(60)))
            .await
            .unwrap();
        cache.set("forever", &3, Ttl::Never).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(!cache.exists("short").await.unwrap());
        assert!(cache.exists("long").await.unwrap());
        assert_eq!(cache.ttl("forever").await.unwrap(), Validity::Persistent);
    }

    #[tokio::test]
    async fn test_ttl_remaining() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"value1", Ttl::After(Duration::from_secs(60)))
            .await
            .unwrap();

        match cache.ttl("key1").await.unwrap() {
            Validity::Remaining(remaining) => {
                assert!(remaining.as_secs() > 50 && remaining.as_secs() <= 60)
            }
            other => panic!("unexpected validity {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_overwrite_replaces_lifetime() {
        let cache = InMemoryCache::new();

        cache
            .set("key1", &"a", Ttl::After(Duration::from_millis(50)))
            .await
            .unwrap();
        cache.set("key1", &"b", Ttl::Never).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = InMemoryCache::new();

        cache.set("key1", &"value1", Ttl::Default).await.unwrap();
        cache.set("key2", &"value2", Ttl::Default).await.unwrap();

        cache.clear().await.unwrap();

        assert_eq!(cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = InMemoryCache::new();

        cache.set("mcr/report/1", &"r1", Ttl::Default).await.unwrap();
        cache
            .set("mcr/report_full/1", &"f1", Ttl::Default)
            .await
            .unwrap();
        cache.set("mcr/report/10", &"r10", Ttl::Default).await.unwrap();
        cache.set("mcr/user/1", &"u1", Ttl::Default).await.unwrap();

        let deleted = cache.delete_pattern("mcr/report*/1").await.unwrap();
        assert_eq!(deleted, 2);

        assert!(cache.exists("mcr/report/10").await.unwrap());
        assert!(cache.exists("mcr/user/1").await.unwrap());
        assert_eq!(cache.size().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_wrap_populates_once() {
        let cache = InMemoryCache::new();
        let calls = std::sync::atomic::AtomicUsize::new(0);

        for _ in 0..3 {
            let value: u32 = cache
                .wrap("mcr/node_list", Ttl::Default, || async {
                    calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok::<_, DomainError>(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_config() {
        let config = InMemoryCacheConfig::default()
            .with_max_capacity(100)
            .with_default_ttl(None);

        let cache = InMemoryCache::with_config(config);

        assert_eq!(cache.config.max_capacity, 100);
        assert_eq!(cache.default_ttl(), None);
    }
}
