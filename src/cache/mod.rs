//! Cache facade with a Redis backend and an in-memory fallback.
//!
//! [`CacheService`] binds Redis when `REDIS_ENABLED=true`, `REDIS_URL` is set
//! and the server answers a `PING`. Otherwise it serves every call from an
//! in-process [`InMemoryCache`]. Backend failures never reach the caller:
//! reads return `None`, writes return `false`, and a warning is logged.

mod config;
mod in_memory;

#[cfg(feature = "cache-redis")]
mod redis;

pub use config::CacheConfig;
pub use in_memory::InMemoryCache;

#[cfg(feature = "cache-redis")]
pub use self::redis::RedisCache;

use crate::error::{CacheError, SetupError};
use crate::facade::{Binding, Connected, DegradedReason, FacadeLabels, FacadeMode};
use crate::traits::cache::CacheStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const LABELS: FacadeLabels = FacadeLabels {
    service: "Redis cache",
    degraded: "in-memory cache",
};

/// Key/value cache that works with or without Redis
///
/// # Example
///
/// ```rust,ignore
/// use failsoft::cache::CacheService;
///
/// let cache = CacheService::from_env().await;
/// cache.set("user:123", json!({"name": "Ada"}), None).await;
///
/// if let Some(user) = cache.get("user:123").await {
///     // ...
/// }
/// ```
#[derive(Clone)]
pub struct CacheService {
    binding: Binding<dyn CacheStore>,
    default_ttl: Duration,
}

impl CacheService {
    /// Build the cache from `REDIS_*` environment variables.
    pub async fn from_env() -> Self {
        Self::new(CacheConfig::from_env()).await
    }

    /// Build the cache from an explicit configuration. Never fails.
    pub async fn new(config: CacheConfig) -> Self {
        let attempt = if config.enabled {
            Some(connect(&config).await)
        } else {
            None
        };

        Self {
            binding: Binding::select(LABELS, attempt, fallback_store),
            default_ttl: config.default_ttl_duration(),
        }
    }

    /// An in-memory cache, without reading the environment.
    pub fn in_memory() -> Self {
        Self {
            binding: Binding::degraded(fallback_store(), DegradedReason::Disabled),
            default_ttl: CacheConfig::default().default_ttl_duration(),
        }
    }

    /// Use a custom store.
    pub fn with_store(store: Arc<dyn CacheStore>, mode: FacadeMode) -> Self {
        let binding = match mode {
            FacadeMode::Live => Binding::live(store),
            FacadeMode::Degraded => Binding::degraded(store, DegradedReason::Disabled),
        };

        Self {
            binding,
            default_ttl: CacheConfig::default().default_ttl_duration(),
        }
    }

    /// Override the TTL used when a call passes `None`.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn mode(&self) -> FacadeMode {
        self.binding.mode()
    }

    pub fn is_live(&self) -> bool {
        self.binding.is_live()
    }

    pub fn binding(&self) -> &Binding<dyn CacheStore> {
        &self.binding
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn store(&self) -> &dyn CacheStore {
        self.binding.backend().as_ref()
    }

    fn warn_failure(&self, operation: &str, key: Option<&str>, err: &CacheError) {
        tracing::warn!(
            target: "failsoft::cache",
            backend = self.store().name(),
            operation,
            key,
            error = %err,
            "Cache {} failed",
            operation
        );
    }

    /// Get a value. `None` if it is absent or the backend failed.
    pub async fn get(&self, key: &str) -> Option<Value> {
        match self.store().get(key).await {
            Ok(value) => value,
            Err(e) => {
                self.warn_failure("get", Some(key), &e);
                None
            }
        }
    }

    /// Store a value. `ttl = None` uses the configured default.
    ///
    /// The in-memory fallback accepts the TTL but never expires entries.
    pub async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl);
        match self.store().set(key, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                self.warn_failure("set", Some(key), &e);
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        match self.store().delete(key).await {
            Ok(()) => true,
            Err(e) => {
                self.warn_failure("delete", Some(key), &e);
                false
            }
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.store().exists(key).await {
            Ok(found) => found,
            Err(e) => {
                self.warn_failure("exists", Some(key), &e);
                false
            }
        }
    }

    /// Remove every entry. With Redis this flushes the whole database.
    pub async fn clear(&self) -> bool {
        match self.store().clear().await {
            Ok(()) => true,
            Err(e) => {
                self.warn_failure("clear", None, &e);
                false
            }
        }
    }

    /// Get several values. Keys that are absent, failed, or hold `null` are omitted.
    pub async fn get_many<I, K>(&self, keys: I) -> HashMap<String, Value>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut found = HashMap::new();
        for key in keys {
            let key = key.as_ref();
            match self.get(key).await {
                Some(Value::Null) | None => {}
                Some(value) => {
                    found.insert(key.to_string(), value);
                }
            }
        }
        found
    }

    /// Store several values, one `set` at a time.
    ///
    /// Keeps going after a failure; returns `true` only if every write succeeded.
    /// Not atomic.
    pub async fn set_many<I, K>(&self, entries: I, ttl: Option<Duration>) -> bool
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut all_ok = true;
        for (key, value) in entries {
            if !self.set(key.as_ref(), value, ttl).await {
                all_ok = false;
            }
        }
        all_ok
    }

    /// Get a value and deserialize it.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                self.warn_failure("get", Some(key), &CacheError::from(e));
                None
            }
        }
    }

    /// Serialize a value and store it.
    pub async fn set_as<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => self.set(key, value, ttl).await,
            Err(e) => {
                self.warn_failure("set", Some(key), &CacheError::from(e));
                false
            }
        }
    }
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("mode", &self.mode())
            .field("backend", &self.store().name())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

fn fallback_store() -> Arc<dyn CacheStore> {
    Arc::new(InMemoryCache::new())
}

#[cfg(feature = "cache-redis")]
async fn connect(config: &CacheConfig) -> Result<Connected<dyn CacheStore>, SetupError> {
    let url = config
        .redis_url
        .as_deref()
        .ok_or(SetupError::missing("REDIS_URL", "REDIS_ENABLED"))?;

    let store: Arc<dyn CacheStore> = Arc::new(RedisCache::connect(url).await?);
    Ok(Connected::new(store))
}

#[cfg(not(feature = "cache-redis"))]
async fn connect(config: &CacheConfig) -> Result<Connected<dyn CacheStore>, SetupError> {
    if config.redis_url.is_none() {
        return Err(SetupError::missing("REDIS_URL", "REDIS_ENABLED"));
    }
    Err(SetupError::feature_unavailable("Redis", "cache-redis"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    /// Store whose every call fails, like a Redis server that went away.
    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> crate::error::CacheResult<Option<Value>> {
            Err(CacheError::backend("connection reset"))
        }

        async fn set(&self, _key: &str, _value: Value, _ttl: Duration) -> crate::error::CacheResult<()> {
            Err(CacheError::backend("connection reset"))
        }

        async fn delete(&self, _key: &str) -> crate::error::CacheResult<()> {
            Err(CacheError::backend("connection reset"))
        }

        async fn exists(&self, _key: &str) -> crate::error::CacheResult<bool> {
            Err(CacheError::backend("connection reset"))
        }

        async fn clear(&self) -> crate::error::CacheResult<()> {
            Err(CacheError::backend("connection reset"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    /// Rejects writes to keys starting with `bad`, records the TTLs it sees.
    #[derive(Default)]
    struct PickyStore {
        inner: InMemoryCache,
        ttls: std::sync::Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl CacheStore for PickyStore {
        async fn get(&self, key: &str) -> crate::error::CacheResult<Option<Value>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Value, ttl: Duration) -> crate::error::CacheResult<()> {
            if key.starts_with("bad") {
                return Err(CacheError::backend("rejected"));
            }
            self.ttls.lock().unwrap().push(ttl);
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> crate::error::CacheResult<()> {
            self.inner.delete(key).await
        }

        async fn exists(&self, key: &str) -> crate::error::CacheResult<bool> {
            self.inner.exists(key).await
        }

        async fn clear(&self) -> crate::error::CacheResult<()> {
            self.inner.clear().await
        }

        fn name(&self) -> &'static str {
            "picky"
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        id: u64,
        name: String,
    }

    #[tokio::test]
    async fn test_disabled_uses_in_memory() {
        let cache = CacheService::new(CacheConfig::default()).await;
        assert_eq!(cache.mode(), FacadeMode::Degraded);
        assert_eq!(
            cache.binding().degraded_reason(),
            Some(&DegradedReason::Disabled)
        );

        assert!(cache.set("key", json!({"a": 1}), None).await);
        assert_eq!(cache.get("key").await, Some(json!({"a": 1})));
        assert!(cache.exists("key").await);

        assert!(cache.delete("key").await);
        assert_eq!(cache.get("key").await, None);
        assert!(!cache.exists("key").await);
    }

    #[tokio::test]
    async fn test_enabled_without_url_falls_back() {
        let cache = CacheService::new(CacheConfig::default().enabled(true)).await;
        assert_eq!(cache.mode(), FacadeMode::Degraded);
        match cache.binding().degraded_reason() {
            Some(DegradedReason::Fallback(reason)) => assert!(reason.contains("REDIS_URL")),
            other => panic!("unexpected reason: {:?}", other),
        }

        // Still fully usable
        assert!(cache.set("key", json!("value"), None).await);
        assert_eq!(cache.get("key").await, Some(json!("value")));
    }

    #[tokio::test]
    async fn test_enabled_with_malformed_url_falls_back() {
        let config = CacheConfig::default()
            .enabled(true)
            .redis_url("definitely not a url");
        let cache = CacheService::new(config).await;
        assert_eq!(cache.mode(), FacadeMode::Degraded);
        assert!(matches!(
            cache.binding().degraded_reason(),
            Some(DegradedReason::Fallback(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_removes_every_key() {
        let cache = CacheService::in_memory();
        for i in 0..5 {
            assert!(cache.set(&format!("k{}", i), json!(i), None).await);
        }

        assert!(cache.clear().await);
        for i in 0..5 {
            assert!(!cache.exists(&format!("k{}", i)).await);
        }
    }

    #[tokio::test]
    async fn test_get_many_omits_missing_keys() {
        let cache = CacheService::in_memory();
        cache.set("a", json!(1), None).await;
        cache.set("b", json!(2), None).await;

        let found = cache.get_many(["a", "b", "missing"]).await;
        assert_eq!(found.len(), 2);
        assert_eq!(found.get("a"), Some(&json!(1)));
        assert_eq!(found.get("b"), Some(&json!(2)));
        assert!(!found.contains_key("missing"));
    }

    #[tokio::test]
    async fn test_get_many_omits_null_values() {
        let cache = CacheService::in_memory();
        cache.set("empty", Value::Null, None).await;
        cache.set("zero", json!(0), None).await;

        // A single get still returns the stored null
        assert_eq!(cache.get("empty").await, Some(Value::Null));

        let found = cache.get_many(["empty", "zero"]).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("zero"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn test_set_many_continues_after_failure() {
        let store = Arc::new(PickyStore::default());
        let cache = CacheService::with_store(store.clone(), FacadeMode::Live);

        let ok = cache
            .set_many(
                vec![
                    ("first", json!(1)),
                    ("bad_one", json!(2)),
                    ("last", json!(3)),
                ],
                None,
            )
            .await;

        assert!(!ok);
        assert_eq!(cache.get("first").await, Some(json!(1)));
        assert_eq!(cache.get("last").await, Some(json!(3)));
        assert_eq!(cache.get("bad_one").await, None);
    }

    #[tokio::test]
    async fn test_set_many_all_succeed() {
        let cache = CacheService::in_memory();
        let ok = cache
            .set_many([("x", json!("1")), ("y", json!("2"))], None)
            .await;
        assert!(ok);
        assert_eq!(cache.get_many(["x", "y"]).await.len(), 2);
    }

    #[tokio::test]
    async fn test_default_ttl_applied() {
        let store = Arc::new(PickyStore::default());
        let cache = CacheService::with_store(store.clone(), FacadeMode::Live)
            .with_default_ttl(Duration::from_secs(42));

        cache.set("a", json!(1), None).await;
        cache.set("b", json!(2), Some(Duration::from_secs(5))).await;

        let ttls = store.ttls.lock().unwrap().clone();
        assert_eq!(ttls, vec![Duration::from_secs(42), Duration::from_secs(5)]);
    }

    #[tokio::test]
    async fn test_backend_failures_become_sentinels() {
        let cache = CacheService::with_store(Arc::new(FailingStore), FacadeMode::Live);
        assert!(cache.is_live());

        assert_eq!(cache.get("key").await, None);
        assert!(!cache.set("key", json!(1), None).await);
        assert!(!cache.delete("key").await);
        assert!(!cache.exists("key").await);
        assert!(!cache.clear().await);
        assert!(cache.get_many(["a", "b"]).await.is_empty());
        assert!(!cache.set_many([("a", json!(1))], None).await);
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        let cache = CacheService::in_memory();
        let profile = Profile {
            id: 7,
            name: "Ada".to_string(),
        };

        assert!(cache.set_as("profile:7", &profile, None).await);
        assert_eq!(cache.get_as::<Profile>("profile:7").await, Some(profile));

        // Wrong shape deserializes to None
        cache.set("profile:8", json!("not a profile"), None).await;
        assert_eq!(cache.get_as::<Profile>("profile:8").await, None);
    }
}
