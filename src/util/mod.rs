//! Utility functions shared by the pipeline stages.
//!
//! - **Markup stripping**: HTML-like feed descriptions to visible text
//! - **URL validation**: feed addresses must be absolute http(s) URLs
//!
//! # Examples
//!
//! ```
//! use intel_curator::util::{html_to_text, validate_feed_url};
//!
//! assert_eq!(html_to_text("use <b>phish</b> lures"), "use phish lures");
//! assert!(validate_feed_url("https://example.com/feed.xml").is_ok());
//! ```

mod feed_url;
mod text;

pub use feed_url::{validate_feed_url, FeedUrlError};
pub use text::html_to_text;
