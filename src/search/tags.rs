//! Frequency-based keyword extraction for tag suggestions.

use crate::search::tokenizer::{count_terms, tag_terms};

/// Tags returned when the caller does not ask for a count.
pub const DEFAULT_MAX_TAGS: usize = 8;

/// Common long words that make poor tags.
pub const STOP_WORDS: &[&str] = &[
    "their", "there", "which", "these", "those", "within", "between", "while", "where", "after",
    "before", "could", "would", "about", "being",
];

/// Most frequent terms longer than four characters, minus stop words.
///
/// Ties keep first-encounter order.
pub fn extract_tags(text: &str, max: usize) -> Vec<String> {
    let mut counts = count_terms(
        tag_terms(text)
            .into_iter()
            .filter(|term| !STOP_WORDS.contains(&term.as_str())),
    );
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(max).map(|(term, _)| term).collect()
}
