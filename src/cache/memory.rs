use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::cache::expiring::{CacheError, ExpiringCache};

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// An in-memory expiring cache.
///
/// Expired entries are dropped lazily when a call touches their key; nothing
/// sweeps the map in the background.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExpiringCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Stale entry under the key: drop it, re-checking under the write
        // lock since it may have been rewritten in between.
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn add(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, CacheError> {
        let now = Utc::now();
        if expires_at <= now {
            return Ok(false);
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(true)
    }

    async fn replace(
        &self,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, CacheError> {
        let now = Utc::now();
        if expires_at <= now {
            return Ok(false);
        }

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            if entry.is_live(now) {
                entry.value = value.to_string();
                entry.expires_at = expires_at;
                return Ok(true);
            }
        } else {
            return Ok(false);
        }

        // Stale entry under the key: clear it.
        entries.remove(key);
        Ok(false)
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn in_one_hour() -> DateTime<Utc> {
        Utc::now() + Duration::hours(1)
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let cache = MemoryCache::new();

        assert!(cache.add("k", "v", in_one_hour()).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_add_refuses_taken_key() {
        let cache = MemoryCache::new();

        assert!(cache.add("k", "first", in_one_hour()).await.unwrap());
        assert!(!cache.add("k", "second", in_one_hour()).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), Some("first".to_string()));
    }

    #[tokio::test]
    async fn test_replace_requires_live_entry() {
        let cache = MemoryCache::new();

        assert!(!cache.replace("k", "v", in_one_hour()).await.unwrap());

        cache.add("k", "old", in_one_hour()).await.unwrap();
        assert!(cache.replace("k", "new", in_one_hour()).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_expired_entry_behaves_as_absent() {
        let cache = MemoryCache::new();

        cache.add("k", "v", in_one_hour()).await.unwrap();
        {
            let mut entries = cache.entries.write().await;
            entries.get_mut("k").unwrap().expires_at = Utc::now() - Duration::seconds(1);
        }

        assert_eq!(cache.get("k").await.unwrap(), None);
        // Expired slot is free for a fresh add.
        assert!(cache.add("k", "v2", in_one_hour()).await.unwrap());
    }

    #[tokio::test]
    async fn test_write_with_past_expiry_is_refused() {
        let cache = MemoryCache::new();
        let past = Utc::now() - Duration::seconds(1);

        assert!(!cache.add("k", "v", past).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);

        cache.add("k", "v", in_one_hour()).await.unwrap();
        assert!(!cache.replace("k", "v2", past).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let cache = MemoryCache::new();

        cache.add("k", "v", in_one_hour()).await.unwrap();
        cache.remove("k").await.unwrap();
        cache.remove("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
