//! Shared Cache Handle
//!
//! The single process-wide content cache handed to every session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::cache::{Blob, CacheStats, ContentHash, ContentStore};

/// Cloneable, thread-safe handle over one [`ContentStore`].
///
/// Every operation holds the lock for its whole duration, so a reader sees
/// either the previous value or the complete new one, and an eviction caused
/// by one session cannot interleave with another session's lookup.
#[derive(Debug, Clone)]
pub struct ContentCache {
    inner: Arc<Mutex<ContentStore>>,
}

impl ContentCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self::from_store(ContentStore::new(max_entries, ttl))
    }

    pub fn from_store(store: ContentStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub async fn get(&self, key: &ContentHash) -> Option<Blob> {
        self.inner.lock().await.get(key)
    }

    pub async fn put(&self, key: ContentHash, value: Blob) {
        self.inner.lock().await.put(key, value);
    }

    pub async fn sweep_expired(&self) -> usize {
        self.inner.lock().await.sweep_expired()
    }

    /// Live (non-expired) entry count.
    pub async fn size(&self) -> usize {
        self.inner.lock().await.size()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_one_store() {
        let cache = ContentCache::new(10, Duration::from_secs(60));
        let other = cache.clone();

        cache.put(ContentHash::from("h"), Blob::from("shared")).await;

        assert_eq!(
            other.get(&ContentHash::from("h")).await,
            Some(Blob::from("shared"))
        );
        assert_eq!(other.size().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_puts_respect_capacity() {
        let cache = ContentCache::new(8, Duration::from_secs(60));

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    let key = ContentHash::from(format!("k{}", i % 16));
                    cache.put(key.clone(), Blob::from(format!("v{}", i))).await;
                    cache.get(&key).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.expect("task should not panic");
        }

        assert!(cache.size().await <= 8);
    }

    #[tokio::test]
    async fn test_sweep_through_handle() {
        let cache = ContentCache::new(10, Duration::from_millis(50));
        cache.put(ContentHash::from("a"), Blob::from("1")).await;

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(cache.size().await, 0);
        assert_eq!(cache.sweep_expired().await, 1);
        assert_eq!(cache.stats().await.expirations, 1);
    }
}
