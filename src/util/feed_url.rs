use thiserror::Error;
use url::Url;

/// Errors produced when a configured feed address is not usable.
#[derive(Error, Debug)]
pub enum FeedUrlError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Validates a feed address from the source registry.
///
/// Only absolute `http`/`https` URLs with a host are accepted. Loopback hosts
/// are allowed: sources are operator-configured, not user-submitted.
///
/// # Examples
///
/// ```
/// use intel_curator::util::validate_feed_url;
///
/// let url = validate_feed_url("https://redcanary.com/blog/feed/").unwrap();
/// assert_eq!(url.host_str(), Some("redcanary.com"));
///
/// assert!(validate_feed_url("file:///etc/passwd").is_err());
/// assert!(validate_feed_url("not a url").is_err());
/// ```
pub fn validate_feed_url(url_str: &str) -> Result<Url, FeedUrlError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(FeedUrlError::UnsupportedScheme(scheme.to_owned())),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(FeedUrlError::MissingHost),
    }
}
