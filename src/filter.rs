//! Search and tag filtering over fetched entries.
//!
//! An entry is shown iff both predicates pass:
//!
//! - **Tag predicate**: the tag filter is empty, or the entry carries at
//!   least one of the filter tags.
//! - **Text predicate**: the query is empty, or it occurs (ignoring case) in
//!   the title or the raw description.
//!
//! Filtering is a read-only projection and is cheap enough to re-run on
//! every change of query or tag selection.

use std::collections::BTreeSet;

use crate::feed::FeedEntry;
use crate::tagging::{TagExtractor, TaggedEntry};
use crate::util::html_to_text;

/// Current search query and tag selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    tags: BTreeSet<String>,
    query: String,
    /// Lower-cased `query`, computed once per filter change.
    needle: String,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.set_query(query);
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.add_tag(tag);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.add_tag(tag.as_ref());
        }
        self
    }

    /// Sets the search query. It is matched exactly as given, ignoring case.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.needle = query.to_lowercase();
    }

    /// Adds a tag, normalized the same way extracted tags are (lower-case).
    /// Returns false if the tag was blank or already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        !tag.is_empty() && self.tags.insert(tag)
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(&tag.trim().to_lowercase())
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// True when neither a query nor tags are set.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.query.is_empty()
    }

    pub fn matches_tags(&self, tags: &[String]) -> bool {
        self.tags.is_empty() || tags.iter().any(|t| self.tags.contains(t))
    }

    pub fn matches_text(&self, entry: &FeedEntry) -> bool {
        self.needle.is_empty()
            || entry.title.to_lowercase().contains(&self.needle)
            || entry.description.to_lowercase().contains(&self.needle)
    }

    /// Combined predicate over an already-tagged entry.
    pub fn matches(&self, entry: &TaggedEntry) -> bool {
        self.matches_tags(&entry.tags) && self.matches_text(&entry.entry)
    }

    /// Combined predicate over a raw entry, extracting tags on the fly.
    pub fn matches_entry(&self, extractor: &TagExtractor, entry: &FeedEntry) -> bool {
        if !self.matches_text(entry) {
            return false;
        }
        if self.tags.is_empty() {
            return true;
        }
        let text = html_to_text(&entry.description);
        self.matches_tags(&extractor.extract_tags(&text))
    }

    /// Entries that pass the filter, in their original order.
    pub fn apply<'a>(&self, entries: &'a [TaggedEntry]) -> Vec<&'a TaggedEntry> {
        entries.iter().filter(|e| self.matches(e)).collect()
    }

    pub fn count(&self, entries: &[TaggedEntry]) -> usize {
        entries.iter().filter(|e| self.matches(e)).count()
    }
}
