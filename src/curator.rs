//! The fetch, tag and filter pipeline behind every user interaction.
//!
//! Each call re-runs the pass for the sources it touches: entries come from
//! the [`FeedCache`] when fresh, otherwise from the network, and are tagged
//! again every time. Nothing here is fatal: an unreachable source shows up
//! as an empty view with its [`FetchError`] attached.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::feed::{FeedCache, FeedEntry, FeedFetcher, FeedSource, FetchError, SourceRegistry};
use crate::filter::Filter;
use crate::tagging::{TagExtractor, TaggedEntry};

/// Sources fetched at once when computing tab statistics.
const STATS_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum CuratorError {
    #[error("Unknown feed source: {0}")]
    UnknownSource(String),
}

/// Tagged entries of one source, plus the fetch failure if there was one.
#[derive(Debug)]
pub struct SourceView {
    pub source: String,
    pub entries: Vec<TaggedEntry>,
    pub error: Option<FetchError>,
}

impl SourceView {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-source match count for the current filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabStat {
    pub source: String,
    pub count: usize,
    /// The source could not be fetched; `count` is 0.
    pub failed: bool,
}

pub struct Curator {
    registry: SourceRegistry,
    fetcher: FeedFetcher,
    extractor: TagExtractor,
    cache: FeedCache,
}

impl Curator {
    pub fn new(
        registry: SourceRegistry,
        fetcher: FeedFetcher,
        extractor: TagExtractor,
        cache: FeedCache,
    ) -> Self {
        Self {
            registry,
            fetcher,
            extractor,
            cache,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let fetcher = FeedFetcher::new(config.fetch_timeout())
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {e}")))?;
        Ok(Self::new(
            config.registry()?,
            fetcher,
            config.extractor(),
            FeedCache::new(config.cache_ttl()),
        ))
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn extractor(&self) -> &TagExtractor {
        &self.extractor
    }

    pub fn cache(&self) -> &FeedCache {
        &self.cache
    }

    /// Fetches (or reuses) and tags every entry of `source_name`.
    pub async fn load(&self, source_name: &str) -> Result<SourceView, CuratorError> {
        let source = self
            .registry
            .get(source_name)
            .ok_or_else(|| CuratorError::UnknownSource(source_name.to_string()))?;
        Ok(self.load_source(source).await)
    }

    /// [`load`](Self::load) followed by the filter, keeping only visible entries.
    pub async fn view(&self, source_name: &str, filter: &Filter) -> Result<SourceView, CuratorError> {
        let mut view = self.load(source_name).await?;
        view.entries.retain(|e| filter.matches(e));
        Ok(view)
    }

    /// Counts matching entries for every configured source, in registry order.
    ///
    /// A source that fails to fetch counts as zero and is flagged.
    pub async fn tab_statistics(&self, filter: &Filter) -> Vec<TabStat> {
        stream::iter(self.registry.iter())
            .map(|source| async move {
                let view = self.load_source(source).await;
                TabStat {
                    source: view.source.clone(),
                    count: filter.count(&view.entries),
                    failed: !view.is_ok(),
                }
            })
            .buffered(STATS_CONCURRENCY)
            .collect()
            .await
    }

    /// Drops cached entries for one source so the next load re-fetches it.
    pub fn refresh(&self, source_name: &str) -> bool {
        match self.registry.get(source_name) {
            Some(source) => self.cache.invalidate(&source.name),
            None => false,
        }
    }

    async fn load_source(&self, source: &FeedSource) -> SourceView {
        let (entries, error) = self.entries_for(source).await;
        let entries = entries
            .iter()
            .cloned()
            .map(|entry| self.extractor.tag(entry))
            .collect();
        SourceView {
            source: source.name.clone(),
            entries,
            error,
        }
    }

    async fn entries_for(&self, source: &FeedSource) -> (Arc<Vec<FeedEntry>>, Option<FetchError>) {
        if let Some(cached) = self.cache.get(&source.name) {
            tracing::debug!(source = %source.name, entries = cached.len(), "Using cached feed");
            return (cached, None);
        }

        let report = self.fetcher.fetch(source).await;
        match report.error {
            Some(e) => (Arc::new(Vec::new()), Some(e)),
            None => (self.cache.insert(&source.name, report.entries), None),
        }
    }
}

impl std::fmt::Debug for Curator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Curator")
            .field("sources", &self.registry.len())
            .field("keywords", &self.extractor.vocabulary().len())
            .field("cache", &self.cache)
            .finish()
    }
}
