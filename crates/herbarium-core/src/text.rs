//! Measuring HTML-bearing form fields.
//!
//! Rich-text fields arrive as editor HTML. Limits apply to the visible text,
//! so tags are removed before counting.

use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern compiles"));

/// Remove everything between `<` and the next `>`. An unclosed `<` is kept as text.
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").into_owned()
}

/// Visible character count of an HTML fragment.
pub fn text_len(html: &str) -> usize {
    strip_tags(html).chars().count()
}

/// Plain-text excerpt for cards: tags removed, whitespace collapsed.
pub fn excerpt(html: &str) -> String {
    strip_tags(html).split_whitespace().collect::<Vec<_>>().join(" ")
}
