//! Error types shared across the facades.
//!
//! Construction problems ([`SetupError`]) never reach callers: they are turned
//! into a degraded binding. Cache errors ([`CacheError`]) are returned by
//! [`CacheStore`](crate::traits::cache::CacheStore) implementations and turned
//! into sentinel values by [`CacheService`](crate::cache::CacheService).

/// Why a live backend could not be bound at construction time.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("{var} not set but {flag}=true")]
    MissingCredential {
        var: &'static str,
        flag: &'static str,
    },

    #[error("{backend} support is not compiled in (enable the `{feature}` feature)")]
    FeatureUnavailable {
        backend: &'static str,
        feature: &'static str,
    },

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Backend unreachable: {0}")]
    Unreachable(String),
}

impl SetupError {
    pub fn missing(var: &'static str, flag: &'static str) -> Self {
        Self::MissingCredential { var, flag }
    }

    pub fn feature_unavailable(backend: &'static str, feature: &'static str) -> Self {
        Self::FeatureUnavailable { backend, feature }
    }

    pub fn invalid_credential(msg: impl Into<String>) -> Self {
        Self::InvalidCredential(msg.into())
    }

    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::Unreachable(msg.into())
    }
}

/// Errors raised by cache stores.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

#[cfg(feature = "cache-redis")]
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;
