use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;

use super::{now_millis, CacheBackend, CacheEntry, CacheFuture};

/// Thread-safe in-process cache.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Inserts a prepared entry verbatim, keeping its timestamps.
    pub async fn insert_entry(&self, entry: CacheEntry) {
        self.inner.write().await.insert(entry.key.clone(), entry);
    }

    /// Removes expired entries and returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = now_millis();
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|_, entry| !entry.is_expired_at(now));
        before - map.len()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

impl CacheBackend for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn entry<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<CacheEntry>> {
        Box::pin(async move {
            let now = now_millis();
            {
                let map = self.inner.read().await;
                match map.get(key) {
                    None => return Ok(None),
                    Some(entry) if !entry.is_expired_at(now) => return Ok(Some(entry.clone())),
                    Some(_) => {}
                }
            }

            // Re-check under the write lock: a concurrent put may have refreshed the key.
            let mut map = self.inner.write().await;
            if map.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
                map.remove(key);
            }
            Ok(None)
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        value: Value,
        ttl: Option<Duration>,
    ) -> CacheFuture<'a, ()> {
        Box::pin(async move {
            let entry = CacheEntry::new(key, value, ttl);
            self.inner.write().await.insert(key.to_owned(), entry);
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> CacheFuture<'a, ()> {
        Box::pin(async move {
            self.inner.write().await.remove(key);
            Ok(())
        })
    }
}
