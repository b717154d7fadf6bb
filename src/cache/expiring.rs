use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// An error raised by a cache backend.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Any other backend failure.
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// A key-value store whose entries carry an explicit expiry instant.
///
/// Entries whose expiry has passed behave as absent. Writes with an expiry at
/// or before now are refused and report `Ok(false)`. Each call is atomic per
/// key; the store gives no atomicity across calls.
#[async_trait]
pub trait ExpiringCache: Send + Sync {
    /// Gets the live value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key` if the key holds no live entry.
    ///
    /// Returns `Ok(false)` when the key is already taken.
    async fn add(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, CacheError>;

    /// Replaces the live entry under `key` with `value`.
    ///
    /// Returns `Ok(false)` when the key is absent; callers treat that as a
    /// no-op.
    async fn replace(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, CacheError>;

    /// Removes the entry under `key`, if any.
    async fn remove(&self, key: &str) -> Result<(), CacheError>;
}
