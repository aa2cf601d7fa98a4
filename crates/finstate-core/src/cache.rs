//! Cache trait for the corporate directory.
//!
//! This module defines the [`DirectoryCache`] trait. The directory is fetched in
//! bulk once and reused for every lookup; callers own the cache object and pass
//! it to the lookup component.

use async_trait::async_trait;
use std::time::Duration;

use crate::{error::Result, types::CorpEntry};

/// Trait for caching the corporate directory.
#[async_trait]
pub trait DirectoryCache: Send + Sync {
    /// Retrieves the cached directory fetched from `provider`.
    ///
    /// Returns `Ok(Some(entries))` if cached, `Ok(None)` if not cached.
    async fn get_directory(&self, provider: &str) -> Result<Option<Vec<CorpEntry>>>;

    /// Stores the directory fetched from `provider`, replacing any previous copy.
    async fn put_directory(&self, provider: &str, entries: &[CorpEntry]) -> Result<()>;

    /// Removes cache entries older than the specified TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
