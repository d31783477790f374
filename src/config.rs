//! Configuration file parser for ~/.config/intel-curator/config.toml.
//!
//! The config file is optional — a missing file yields `Config::default()`,
//! which tracks the built-in research blogs with the built-in vocabulary.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::export::DEFAULT_EXPORT_FILE;
use crate::feed::fetcher::DEFAULT_TIMEOUT;
use crate::feed::registry::DEFAULT_SOURCES;
use crate::feed::{RegistryError, SourceRegistry};
use crate::tagging::{Stopwords, TagExtractor, TagVocabulary, DEFAULT_KEYWORDS, DEFAULT_STOPWORDS};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid feed sources: {0}")]
    Sources(#[from] RegistryError),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// One `[[sources]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed sources in display order.
    pub sources: Vec<SourceConfig>,

    /// Tag vocabulary. Matched case-insensitively as whole tokens.
    pub keywords: Vec<String>,

    /// Words skipped before keyword matching.
    pub stopwords: Vec<String>,

    /// Per-fetch timeout in seconds. Must be at least 1.
    pub fetch_timeout_secs: u64,

    /// How long fetched entries are reused, in seconds. 0 = always re-fetch.
    pub cache_ttl_secs: u64,

    /// Where exports are written.
    pub export_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES
                .iter()
                .map(|(name, url)| SourceConfig {
                    name: (*name).to_string(),
                    url: (*url).to_string(),
                })
                .collect(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            stopwords: DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            fetch_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            cache_ttl_secs: 120,
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "sources",
        "keywords",
        "stopwords",
        "fetch_timeout_secs",
        "cache_ttl_secs",
        "export_path",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted, logged as warning
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to prevent memory exhaustion
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            sources = config.sources.len(),
            keywords = config.keywords.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        // Parse as a raw table first to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.export_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("export_path is empty".to_string()));
        }
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            tracing::warn!("Tag vocabulary is empty, entries will never be tagged");
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Builds the validated source registry.
    pub fn registry(&self) -> Result<SourceRegistry, ConfigError> {
        let sources = self.sources.iter().map(|s| (s.name.clone(), s.url.as_str()));
        Ok(SourceRegistry::new(sources)?)
    }

    pub fn vocabulary(&self) -> TagVocabulary {
        TagVocabulary::new(&self.keywords)
    }

    pub fn extractor(&self) -> TagExtractor {
        TagExtractor::new(self.vocabulary(), Stopwords::new(&self.stopwords))
    }
}

/// Default config file location (`~/.config/intel-curator/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("intel-curator")
            .join("config.toml"),
    )
}

// ============================================================================
// Tests
// ============================================================================
