//! Rendered page cache
//!
//! Only the index page is cached. Entries are not invalidated on writes, so
//! a cached page stays stale until its TTL runs out or the cache is cleared.
use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

pub mod local;
pub mod redis_cache;

pub use local::LocalPageCache;
pub use redis_cache::RedisPageCache;

/// Default lifetime of a cached index page
pub const INDEX_CACHE_TTL_SECS: u64 = 20;

pub fn index_page_key(path_and_query: &str) -> String {
    format!("index_page:{}", path_and_query)
}

#[async_trait]
pub trait PageCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, body: &str, ttl: Duration) -> Result<()>;

    /// Drop every cached page
    async fn clear(&self) -> Result<()>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
