use crate::feed::parser::{parse_feed, FeedEntry};
use crate::feed::registry::FeedSource;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to a whole fetch (connect, headers and body).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const USER_AGENT: &str = concat!("intel-curator/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while retrieving a single feed.
///
/// None of these escape [`FeedFetcher::fetch`]; they are logged and carried
/// in the [`FetchReport`] next to an empty entry list.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Fetch exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Feed body could not be parsed as RSS, Atom or JSON Feed
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Outcome of fetching one source.
///
/// `entries` is empty whenever `error` is set.
#[derive(Debug)]
pub struct FetchReport {
    pub source: String,
    pub entries: Vec<FeedEntry>,
    pub error: Option<FetchError>,
}

impl FetchReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Retrieves and parses feeds over HTTP.
///
/// One request per call: no retries, no backoff and no caching. Cloning is
/// cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl FeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(client, timeout))
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches a source, degrading any failure to an empty entry list.
    ///
    /// The failure is logged at `warn` and returned in
    /// [`FetchReport::error`] so callers can surface it; one broken source
    /// never blocks the others.
    pub async fn fetch(&self, source: &FeedSource) -> FetchReport {
        match self.try_fetch(source.url.as_str()).await {
            Ok(entries) => {
                tracing::debug!(
                    source = %source.name,
                    entries = entries.len(),
                    "Fetched feed"
                );
                FetchReport {
                    source: source.name.clone(),
                    entries,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    source = %source.name,
                    url = %source.url,
                    error = %e,
                    "Error fetching feed, treating source as empty"
                );
                FetchReport {
                    source: source.name.clone(),
                    entries: Vec::new(),
                    error: Some(e),
                }
            }
        }
    }

    /// Fetches and parses `url`, returning the typed error on failure.
    pub async fn try_fetch(&self, url: &str) -> Result<Vec<FeedEntry>, FetchError> {
        let bytes = tokio::time::timeout(self.timeout, self.fetch_bytes(url))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        parse_feed(&bytes).map_err(|e| FetchError::Parse(e.to_string()))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_FEED_SIZE).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
