use anyhow::Result;
use feed_rs::model::{Entry, Link};
use feed_rs::parser;
use serde::Serialize;

/// One item from a source's syndication feed.
///
/// Every field is plain text; a field the feed omits is an empty string.
/// `description` still carries the publisher's markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// RFC 2822 rendering of the published (or updated) timestamp.
    pub published: String,
    pub description: String,
}

pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedEntry>> {
    let feed = parser::parse(bytes)?;
    Ok(feed.entries.into_iter().map(to_entry).collect())
}

fn to_entry(entry: Entry) -> FeedEntry {
    let link = pick_link(&entry.links).unwrap_or_default();
    let published = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.to_rfc2822())
        .unwrap_or_default();
    let description = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();
    let title = entry.title.map(|t| t.content).unwrap_or_default();

    FeedEntry {
        title,
        link,
        published,
        description,
    }
}

/// Atom entries may list several links; the article itself is the
/// `alternate` one (or the one without a `rel`).
fn pick_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
}
