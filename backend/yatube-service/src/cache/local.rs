use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::PageCache;
use crate::error::Result;

/// Entry cap for a cache built with [`LocalPageCache::new`].
pub const DEFAULT_MAX_ENTRIES: usize = 300;

/// When the cache is full and nothing has expired, 1/CULL_FREQUENCY of the
/// entries (those closest to expiry) are evicted.
const CULL_FREQUENCY: usize = 3;

/// In-process page cache.
///
/// Expired entries are dropped on read and swept on write once the cache is
/// full, so the map never holds more than `max_entries` keys.
pub struct LocalPageCache {
    entries: DashMap<String, (String, Instant)>,
    max_entries: usize,
}

impl Default for LocalPageCache {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl LocalPageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Make room for one more entry.
    fn cull(&self, now: Instant) {
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);
        if self.entries.len() < self.max_entries {
            return;
        }

        let mut by_expiry: Vec<(Instant, String)> = self
            .entries
            .iter()
            .map(|entry| (entry.value().1, entry.key().clone()))
            .collect();
        by_expiry.sort();

        let evict = (by_expiry.len() / CULL_FREQUENCY).max(1);
        for (_, key) in by_expiry.into_iter().take(evict) {
            self.entries.remove(&key);
        }
        debug!(evicted = evict, "Local page cache culled");
    }
}

#[async_trait]
impl PageCache for LocalPageCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            let (body, expires_at) = entry.value();
            if *expires_at > now {
                return Ok(Some(body.clone()));
            }
        }
        self.entries.remove_if(key, |_, (_, expires_at)| *expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, body: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.cull(now);
        }
        self.entries
            .insert(key.to_string(), (body.to_string(), now + ttl));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
