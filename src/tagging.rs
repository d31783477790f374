//! Keyword tagging of feed descriptions.
//!
//! Tags are whole-token matches against a fixed [`TagVocabulary`]: the text is
//! lower-cased, split on whitespace, stopwords are dropped, and any token that
//! equals a keyword becomes a tag. Punctuation is part of the token, so
//! `"ransomware."` is not tagged, and multi-word keywords such as
//! `"kill chain"` never match a single token.

use std::collections::HashSet;

use serde::Serialize;

use crate::feed::FeedEntry;
use crate::util::html_to_text;

/// Keywords tagged out of the box.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "mitre",
    "kill chain",
    "killchain",
    "ransomware",
    "adversaries",
    "malware",
    "cloud",
    "apt",
    "dev",
    "windows",
    "unix",
    "phish",
    "trojan",
    "aitm",
    "oauth",
    "identity",
    "business email",
];

/// Tokens discarded before keyword matching.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "the", "and", "in", "of", "to", "a", "for", "with", "on", "as", "an", "at",
];

/// Ordered, deduplicated set of lowercase keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagVocabulary {
    keywords: Vec<String>,
    lookup: HashSet<String>,
}

impl TagVocabulary {
    /// Builds a vocabulary, lower-casing each keyword. Blank keywords are
    /// dropped and a repeated keyword keeps its first position.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered = Vec::new();
        let mut lookup = HashSet::new();
        for keyword in keywords {
            let normalized = keyword.as_ref().trim().to_lowercase();
            if normalized.is_empty() {
                continue;
            }
            if lookup.insert(normalized.clone()) {
                ordered.push(normalized);
            }
        }
        Self {
            keywords: ordered,
            lookup,
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.lookup.contains(word)
    }

    /// Keywords in configured order.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

/// Lowercase words ignored during tokenization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwords(HashSet<String>);

impl Stopwords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        )
    }

    /// The stock English stopword list.
    pub fn standard() -> Self {
        Self::new(DEFAULT_STOPWORDS)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }
}

/// Derives tags from free text against a fixed vocabulary.
#[derive(Debug, Clone)]
pub struct TagExtractor {
    vocabulary: TagVocabulary,
    stopwords: Stopwords,
}

impl TagExtractor {
    pub fn new(vocabulary: TagVocabulary, stopwords: Stopwords) -> Self {
        Self {
            vocabulary,
            stopwords,
        }
    }

    pub fn vocabulary(&self) -> &TagVocabulary {
        &self.vocabulary
    }

    /// Returns the vocabulary keywords found in `text`, in first-occurrence
    /// order with repeats removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use intel_curator::tagging::TagExtractor;
    ///
    /// let extractor = TagExtractor::default();
    /// let tags = extractor.extract_tags("Phish lures, more phish, then ransomware");
    /// assert_eq!(tags, vec!["phish".to_string(), "ransomware".to_string()]);
    /// ```
    pub fn extract_tags(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut tags = Vec::new();

        for token in lowered.split_whitespace() {
            if self.stopwords.contains(token) || !self.vocabulary.contains(token) {
                continue;
            }
            if seen.insert(token) {
                tags.push(token.to_string());
            }
        }

        tags
    }

    /// Strips markup from the entry description and tags the visible text.
    pub fn tag(&self, entry: FeedEntry) -> TaggedEntry {
        let text = html_to_text(&entry.description).into_owned();
        let tags = self.extract_tags(&text);
        TaggedEntry { entry, text, tags }
    }
}

impl Default for TagExtractor {
    fn default() -> Self {
        Self::new(TagVocabulary::default(), Stopwords::standard())
    }
}

/// A fetched entry together with its plain-text description and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedEntry {
    #[serde(flatten)]
    pub entry: FeedEntry,
    /// Description with markup removed.
    pub text: String,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn extractor() -> TagExtractor {
        TagExtractor::default()
    }

    #[test]
    fn test_no_keywords_yields_empty() {
        assert!(extractor()
            .extract_tags("A quiet week with nothing to report")
            .is_empty());
    }

    #[test]
    fn test_first_occurrence_order() {
        let tags = extractor().extract_tags("trojan dropped by apt after phish then trojan again");
        assert_eq!(tags, vec!["trojan", "apt", "phish"]);
    }

    #[test]
    fn test_case_insensitive_tokens() {
        let tags = extractor().extract_tags("New APT uses Windows and CLOUD");
        assert_eq!(tags, vec!["apt", "windows", "cloud"]);
    }

    #[test]
    fn test_punctuation_prevents_match() {
        let tags = extractor().extract_tags("delivers ransomware. also malware, and oauth");
        assert_eq!(tags, vec!["oauth"]);
    }

    #[test]
    fn test_multi_word_keywords_never_match() {
        let tags = extractor().extract_tags("the kill chain starts with business email compromise");
        assert!(tags.is_empty());
        // The single-token spelling still matches.
        assert_eq!(extractor().extract_tags("killchain"), vec!["killchain"]);
    }

    #[test]
    fn test_stopword_in_vocabulary_is_discarded() {
        let vocab = TagVocabulary::new(["the", "malware"]);
        let extractor = TagExtractor::new(vocab, Stopwords::standard());
        assert_eq!(extractor.extract_tags("the malware"), vec!["malware"]);
    }

    #[test]
    fn test_vocabulary_normalized_and_deduplicated() {
        let vocab = TagVocabulary::new(["APT", "DEV", "apt", "  ", "Cloud"]);
        assert_eq!(vocab.keywords(), ["apt", "dev", "cloud"]);
        assert_eq!(vocab.len(), 3);
    }

    #[test]
    fn test_scenario_markup_stripped_before_tagging() {
        let entry = FeedEntry {
            title: "New APT campaign".into(),
            link: "https://example.com/apt".into(),
            published: String::new(),
            description: "Actors use <b>phish</b> lures and ransomware".into(),
        };
        let tagged = extractor().tag(entry);
        assert_eq!(tagged.tags, vec!["phish", "ransomware"]);
        assert_eq!(tagged.text, "Actors use phish lures and ransomware");
    }

    #[test]
    fn test_untagged_entry_still_present() {
        let tagged = extractor().tag(FeedEntry::default());
        assert!(tagged.tags.is_empty());
        assert_eq!(tagged.text, "");
    }

    proptest! {
        #[test]
        fn prop_tags_always_within_vocabulary(text in "[a-zA-Z ]{0,80}") {
            let ex = extractor();
            for tag in ex.extract_tags(&text) {
                prop_assert!(ex.vocabulary().contains(&tag));
            }
        }

        #[test]
        fn prop_repeated_keyword_reported_once(
            idx in 0usize..DEFAULT_KEYWORDS.len(),
            repeats in 1usize..6,
            filler in "[x-z]{1,6}",
        ) {
            let keyword = DEFAULT_KEYWORDS[idx];
            prop_assume!(!keyword.contains(' '));
            let text = std::iter::repeat(format!("{filler} {keyword}"))
                .take(repeats)
                .collect::<Vec<_>>()
                .join(" ");
            let tags = extractor().extract_tags(&text);
            prop_assert_eq!(tags.iter().filter(|t| t.as_str() == keyword).count(), 1);
        }

        #[test]
        fn prop_text_without_keywords_is_untagged(words in prop::collection::vec("[qxz]{2,8}", 0..12)) {
            let text = words.join(" ");
            prop_assert!(extractor().extract_tags(&text).is_empty());
        }
    }
}
