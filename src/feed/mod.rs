//! Feed retrieval for the configured threat-intelligence sources.
//!
//! - **Registry**: ordered source name to feed URL mapping
//! - **Parsing**: RSS/Atom/JSON Feed bytes into [`FeedEntry`] values
//! - **Fetching**: one HTTP GET per source with an explicit timeout; failures
//!   degrade to an empty entry list plus a recorded [`FetchError`]
//! - **Caching**: optional per-source TTL cache bounding network calls
//!
//! # Architecture
//!
//! - [`registry`] - source definitions validated at construction
//! - [`parser`] - feed parsing using the `feed-rs` crate
//! - [`fetcher`] - HTTP retrieval with size limit and timeout
//! - [`cache`] - short-lived entry cache keyed by source name
//!
//! # Example
//!
//! ```ignore
//! use intel_curator::feed::{FeedFetcher, SourceRegistry};
//!
//! let registry = SourceRegistry::builtin()?;
//! let fetcher = FeedFetcher::new(std::time::Duration::from_secs(10))?;
//! let source = registry.get("DFIR").unwrap();
//! let report = fetcher.fetch(source).await;
//! println!("{} entries", report.entries.len());
//! ```

pub mod cache;
pub mod fetcher;
pub mod parser;
pub mod registry;

pub use cache::FeedCache;
pub use fetcher::{FeedFetcher, FetchError, FetchReport};
pub use parser::{parse_feed, FeedEntry};
pub use registry::{FeedSource, RegistryError, SourceRegistry};
