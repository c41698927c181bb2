use crate::error::{CacheResult, SetupError};
use crate::traits::cache::CacheStore;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use serde_json::Value;
use std::time::Duration;

/// Redis cache implementation
///
/// Strings are stored as-is; any other JSON value is stored as its JSON text.
/// Reads decode JSON when they can and fall back to the raw string.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// Connect to Redis and verify the server answers `PING`.
    pub async fn connect(url: &str) -> Result<Self, SetupError> {
        let client = redis::Client::open(url)
            .map_err(|e| SetupError::invalid_credential(format!("Invalid Redis URL: {}", e)))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| SetupError::unreachable(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| SetupError::unreachable(format!("Redis PING failed: {}", e)))?;

        Ok(Self { conn })
    }
}

/// Encode a value for storage.
pub(crate) fn encode_value(value: &Value) -> CacheResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}

/// Decode a stored value, returning the raw text when it isn't JSON.
pub(crate) fn decode_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

/// SETEX rejects a zero TTL, so sub-second TTLs round up to one second.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let mut conn = self.conn.clone();

        let raw: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await?;

        Ok(raw.map(decode_value))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let encoded = encode_value(&value)?;

        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds(ttl))
            .arg(encoded)
            .query_async::<()>(&mut conn)
            .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();

        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn.clone();

        let count: i64 = redis::cmd("EXISTS")
            .arg(key)
            .query_async::<i64>(&mut conn)
            .await?;

        Ok(count > 0)
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();

        redis::cmd("FLUSHDB")
            .query_async::<()>(&mut conn)
            .await?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
