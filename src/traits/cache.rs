//! Cache trait for key-value storage
//!
//! This trait abstracts caching backends, allowing the cache facade to swap
//! between Redis, the in-memory fallback, or custom implementations.

use crate::error::CacheResult;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Key-value store with per-entry TTL
///
/// Values are JSON documents. Stores report failures as errors; turning them
/// into `None`/`false` is the facade's job, not the store's.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value, `Ok(None)` if the key doesn't exist or has expired.
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Store a value. Stores that cannot expire entries may ignore `ttl`.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Check whether a key is present.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Remove every entry.
    async fn clear(&self) -> CacheResult<()>;

    /// Short backend name used in logs and health reports.
    fn name(&self) -> &'static str;
}
