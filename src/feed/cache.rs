//! Short-lived per-source entry cache.
//!
//! Every interaction re-runs the fetch-and-filter pass; the cache bounds how
//! often that reaches the network. Only successful fetches are stored, so a
//! failing source is retried on the next interaction. A zero TTL disables
//! the cache entirely.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use crate::feed::FeedEntry;

struct CachedFeed {
    fetched_at: Instant,
    entries: Arc<Vec<FeedEntry>>,
}

pub struct FeedCache {
    ttl: Duration,
    feeds: RwLock<HashMap<String, CachedFeed>>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            feeds: RwLock::new(HashMap::new()),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Returns the cached entries for `source` if they are younger than the TTL.
    pub fn get(&self, source: &str) -> Option<Arc<Vec<FeedEntry>>> {
        if !self.is_enabled() {
            return None;
        }
        let feeds = self.feeds.read().unwrap_or_else(|e| e.into_inner());
        feeds
            .get(source)
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| Arc::clone(&c.entries))
    }

    /// Stores a fresh fetch, replacing any previous value for `source`.
    ///
    /// Concurrent inserts for the same source are last-writer-wins; the values
    /// are equivalent fetches of the same feed.
    pub fn insert(&self, source: &str, entries: Vec<FeedEntry>) -> Arc<Vec<FeedEntry>> {
        let entries = Arc::new(entries);
        if !self.is_enabled() {
            return entries;
        }
        let mut feeds = self.feeds.write().unwrap_or_else(|e| e.into_inner());
        feeds.insert(
            source.to_string(),
            CachedFeed {
                fetched_at: Instant::now(),
                entries: Arc::clone(&entries),
            },
        );
        entries
    }

    pub fn invalidate(&self, source: &str) -> bool {
        let mut feeds = self.feeds.write().unwrap_or_else(|e| e.into_inner());
        feeds.remove(source).is_some()
    }

    pub fn clear(&self) {
        let mut feeds = self.feeds.write().unwrap_or_else(|e| e.into_inner());
        feeds.clear();
    }

    /// Drops expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut feeds = self.feeds.write().unwrap_or_else(|e| e.into_inner());
        let before = feeds.len();
        feeds.retain(|_, c| c.fetched_at.elapsed() < self.ttl);
        before - feeds.len()
    }

    pub fn len(&self) -> usize {
        self.feeds.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for FeedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedCache")
            .field("ttl", &self.ttl)
            .field("sources", &self.len())
            .finish()
    }
}
