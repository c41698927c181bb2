//! In-process cache used when Redis is disabled or unreachable
//!
//! Backed by a moka concurrent map with no capacity bound and no expiry
//! policy: entries stay until they are deleted, the cache is cleared, or the
//! process exits. TTLs are accepted and ignored.

use crate::error::CacheResult;
use crate::traits::cache::CacheStore;
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use serde_json::Value;
use std::time::Duration;

/// In-memory fallback store
///
/// Safe to share between tasks; reads are lock-free.
///
/// # Example
///
/// ```rust,ignore
/// use failsoft::cache::InMemoryCache;
/// use failsoft::traits::cache::CacheStore;
///
/// let cache = InMemoryCache::new();
/// cache.set("user:123", json!({"name": "Ada"}), Duration::from_secs(60)).await?;
///
/// // Still there after the TTL: the fallback never expires entries
/// let user = cache.get("user:123").await?;
/// ```
#[derive(Clone)]
pub struct InMemoryCache {
    inner: MokaCache<String, Value>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            inner: MokaCache::builder().build(),
        }
    }

    /// Run pending maintenance tasks so `entry_count` is accurate.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Get the current number of entries in the cache
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        Ok(self.inner.get(key).await)
    }

    async fn set(&self, key: &str, value: Value, _ttl: Duration) -> CacheResult<()> {
        self.inner.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.inner.contains_key(key))
    }

    async fn clear(&self) -> CacheResult<()> {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_get_set() {
        let cache = InMemoryCache::new();
        cache.set("key1", json!("value1"), TTL).await.unwrap();

        assert_eq!(cache.get("key1").await.unwrap(), Some(json!("value1")));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_stored_as_is() {
        let cache = InMemoryCache::new();
        let value = json!({"id": 7, "tags": ["a", "b"], "active": true});
        cache.set("doc", value.clone(), TTL).await.unwrap();

        assert_eq!(cache.get("doc").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn test_ttl_is_not_enforced() {
        let cache = InMemoryCache::new();
        cache
            .set("short", json!(1), Duration::from_millis(1))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.run_pending_tasks().await;

        assert_eq!(cache.get("short").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_delete_and_exists() {
        let cache = InMemoryCache::new();
        cache.set("key1", json!("value1"), TTL).await.unwrap();
        assert!(cache.exists("key1").await.unwrap());

        cache.delete("key1").await.unwrap();
        assert!(!cache.exists("key1").await.unwrap());
        assert_eq!(cache.get("key1").await.unwrap(), None);

        // Deleting again is fine
        cache.delete("key1").await.unwrap();
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = InMemoryCache::new();
        cache.set("key1", json!("value1"), TTL).await.unwrap();
        cache.set("key2", json!("value2"), TTL).await.unwrap();
        cache.clear().await.unwrap();

        assert!(!cache.exists("key1").await.unwrap());
        assert!(!cache.exists("key2").await.unwrap());
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        use std::sync::Arc;

        let cache = Arc::new(InMemoryCache::new());
        let mut handles = vec![];

        for i in 0..10 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for j in 0..100 {
                    let key = format!("key{}_{}", i, j);
                    cache.set(&key, json!(j), TTL).await.unwrap();
                    assert_eq!(cache.get(&key).await.unwrap(), Some(json!(j)));
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        cache.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 1000);
    }
}
