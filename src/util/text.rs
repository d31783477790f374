use std::borrow::Cow;

use scraper::Html;

/// Strips markup from a feed description, returning only the visible text.
///
/// Every element tag is removed and character references are decoded; the
/// text nodes are concatenated in document order with their whitespace kept
/// as-is. Malformed markup never fails: the HTML5 parser recovers the same
/// way a browser would.
///
/// Returns `Cow::Borrowed` when the input has no `<` or `&`, which is the
/// common case for plain-text summaries.
///
/// # Examples
///
/// ```
/// use intel_curator::util::html_to_text;
///
/// assert_eq!(
///     html_to_text("Actors use <b>phish</b> lures and ransomware"),
///     "Actors use phish lures and ransomware"
/// );
/// assert_eq!(html_to_text("<p>AT&amp;T</p>"), "AT&T");
/// ```
pub fn html_to_text(markup: &str) -> Cow<'_, str> {
    if !markup.contains(['<', '&']) {
        return Cow::Borrowed(markup);
    }

    let fragment = Html::parse_fragment(markup);
    let text: String = fragment.root_element().text().collect();
    Cow::Owned(text)
}
