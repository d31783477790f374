use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::util::{validate_feed_url, FeedUrlError};

/// Research blogs tracked when no sources are configured.
pub const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("Red Canary", "https://redcanary.com/blog/feed/"),
    ("DFIR", "https://thedfirreport.com/feed/"),
    ("Mandiant", "https://www.mandiant.com/resources/blog/rss.xml"),
    ("Cisco", "http://feeds.feedburner.com/feedburner/Talos"),
    ("Google", "https://blog.google/threat-analysis-group/rss/"),
    ("Proofpoint", "https://www.proofpoint.com/us/rss.xml"),
    ("crowdstrike", "https://www.crowdstrike.com/blog/feed"),
];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No feed sources configured")]
    Empty,
    #[error("Feed source with blank name (url: {0})")]
    BlankName(String),
    #[error("Duplicate feed source name: {0}")]
    Duplicate(String),
    #[error("Invalid URL for feed source '{name}': {source}")]
    InvalidUrl {
        name: String,
        #[source]
        source: FeedUrlError,
    },
}

/// A named feed address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub url: Url,
}

/// Ordered, immutable set of feed sources.
///
/// Names are unique ignoring ASCII case, so lookups can be forgiving about
/// what the user typed.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<FeedSource>,
}

impl SourceRegistry {
    pub fn new<I, N, U>(sources: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (N, U)>,
        N: Into<String>,
        U: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for (name, url) in sources {
            let name = name.into().trim().to_string();
            if name.is_empty() {
                return Err(RegistryError::BlankName(url.as_ref().to_string()));
            }
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(RegistryError::Duplicate(name));
            }
            let url = validate_feed_url(url.as_ref()).map_err(|source| {
                RegistryError::InvalidUrl {
                    name: name.clone(),
                    source,
                }
            })?;
            out.push(FeedSource { name, url });
        }

        if out.is_empty() {
            return Err(RegistryError::Empty);
        }

        Ok(Self { sources: out })
    }

    /// Looks a source up by name, falling back to a case-insensitive match.
    pub fn get(&self, name: &str) -> Option<&FeedSource> {
        let name = name.trim();
        self.sources
            .iter()
            .find(|s| s.name == name)
            .or_else(|| self.sources.iter().find(|s| s.name.eq_ignore_ascii_case(name)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeedSource> {
        self.sources.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name.as_str())
    }

    pub fn first(&self) -> &FeedSource {
        // Construction rejects an empty registry.
        &self.sources[0]
    }

    /// The registry of [`DEFAULT_SOURCES`].
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(DEFAULT_SOURCES.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_keeps_order() {
        let registry = SourceRegistry::builtin().unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.first(), Some(&"Red Canary"));
        assert_eq!(names.last(), Some(&"crowdstrike"));
        assert_eq!(registry.len(), DEFAULT_SOURCES.len());
    }

    #[test]
    fn test_lookup_exact_then_case_insensitive() {
        let registry = SourceRegistry::builtin().unwrap();
        assert_eq!(
            registry.get("DFIR").unwrap().url.as_str(),
            "https://thedfirreport.com/feed/"
        );
        assert_eq!(registry.get("red canary").unwrap().name, "Red Canary");
        assert_eq!(registry.get(" CrowdStrike ").unwrap().name, "crowdstrike");
        assert!(registry.get("Unknown Blog").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = SourceRegistry::new([
            ("Talos", "https://a.example.com/feed"),
            ("talos", "https://b.example.com/feed"),
        ]);
        assert!(matches!(result, Err(RegistryError::Duplicate(n)) if n == "talos"));
    }

    #[test]
    fn test_invalid_url_names_the_source() {
        let err = SourceRegistry::new([("Broken", "ftp://example.com/feed")]).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUrl { ref name, .. } if name == "Broken"));
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_blank_name_and_empty_rejected() {
        assert!(matches!(
            SourceRegistry::new([("  ", "https://example.com/feed")]),
            Err(RegistryError::BlankName(_))
        ));
        let none: [(&str, &str); 0] = [];
        assert!(matches!(SourceRegistry::new(none), Err(RegistryError::Empty)));
    }
}
