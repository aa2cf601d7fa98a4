//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use finstate_core::{CorpEntry, DirectoryCache, Result};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    cached_at: chrono::DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// In-memory directory cache that lives as long as the process.
///
/// Directories are stored per provider in a `RwLock`-protected `HashMap` and are
/// cloned on get/put operations.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    directories: RwLock<HashMap<String, CacheEntry<Vec<CorpEntry>>>>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryCache for InMemoryCache {
    #[instrument(skip(self), fields(provider = %provider))]
    async fn get_directory(&self, provider: &str) -> Result<Option<Vec<CorpEntry>>> {
        let cache = self.directories.read().await;
        match cache.get(provider) {
            Some(entry) => {
                debug!("Cache hit for corporate directory");
                Ok(Some(entry.data.clone()))
            }
            None => {
                debug!("Cache miss for corporate directory");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, entries), fields(provider = %provider, count = entries.len()))]
    async fn put_directory(&self, provider: &str, entries: &[CorpEntry]) -> Result<()> {
        let mut cache = self.directories.write().await;
        cache.insert(provider.to_string(), CacheEntry::new(entries.to_vec()));
        debug!("Cached {} directory entries", entries.len());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut cache = self.directories.write().await;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_stale(ttl));
        let removed = before - cache.len();

        if removed > 0 {
            debug!("Invalidated {} stale directories", removed);
        }

        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.directories.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}
