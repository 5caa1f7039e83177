//! Key-value storage behind the proximity cache.

use crate::cache::error::CacheError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// The subset of a networked key-value store the cache relies on.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// The stored bytes, or `None` if the key is missing or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value, for `ttl`.
    async fn set_ex(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Every live key starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}

/// In-process [`CacheStore`]. Expired values are dropped when read or listed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some((value, expires_at)) if *expires_at > now => return Ok(Some(value.clone())),
                Some(_) => {}
            }
        }
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|(_, expires_at)| *expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        Ok(entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() -> Result<(), CacheError> {
        let store = MemoryStore::new();
        store.set_ex("a", vec![1, 2, 3], Duration::from_secs(60)).await?;
        assert_eq!(store.get("a").await?, Some(vec![1, 2, 3]));
        assert_eq!(store.get("b").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn expired_values_disappear() -> Result<(), CacheError> {
        let store = MemoryStore::new();
        store.set_ex("short", vec![1], Duration::from_millis(20)).await?;
        store.set_ex("long", vec![2], Duration::from_secs(60)).await?;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.get("short").await?, None);
        assert_eq!(store.get("long").await?, Some(vec![2]));
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn keys_filter_by_prefix() -> Result<(), CacheError> {
        let store = MemoryStore::new();
        store.set_ex("x:1", vec![], Duration::from_secs(60)).await?;
        store.set_ex("x:2", vec![], Duration::from_secs(60)).await?;
        store.set_ex("y:1", vec![], Duration::from_secs(60)).await?;
        let mut keys = store.keys("x:").await?;
        keys.sort();
        assert_eq!(keys, vec!["x:1".to_string(), "x:2".to_string()]);
        Ok(())
    }
}
