use crate::utils::{get_env_with_prefix, non_empty, parse_flag};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Use Redis instead of the in-memory store
    #[serde(default)]
    pub enabled: bool,

    /// Redis connection URL (required when enabled)
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TTL applied when a caller doesn't pass one (in seconds)
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            redis_url: None,
            default_ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl CacheConfig {
    /// Load cache configuration from environment variables
    ///
    /// - `REDIS_ENABLED`: `true` to use Redis
    /// - `REDIS_URL`: connection URL
    /// - `CACHE_DEFAULT_TTL_SECONDS`: default TTL
    pub fn from_env() -> Self {
        Self::from_lookup(get_env_with_prefix)
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(enabled) = lookup("REDIS_ENABLED") {
            config.enabled = parse_flag(&enabled);
        }

        config.redis_url = non_empty(lookup("REDIS_URL"));

        if let Some(ttl) = lookup("CACHE_DEFAULT_TTL_SECONDS") {
            if let Ok(seconds) = ttl.trim().parse() {
                config.default_ttl_seconds = seconds;
            }
        }

        config
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_seconds = ttl.as_secs();
        self
    }

    pub fn default_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

fn default_ttl_seconds() -> u64 {
    3600 // 1 hour
}
