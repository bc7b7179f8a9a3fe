//! Naive ASCII tokenizer
//!
//! Lowercases, maps everything outside `[a-z0-9]` and whitespace to a space,
//! then splits on whitespace. No stemming and no locale awareness: accented
//! letters become separators.

use std::collections::HashMap;

/// Indexing and query terms must be longer than two characters.
pub const INDEX_MIN_LEN: usize = 3;

/// Tag candidates must be longer than four characters.
pub const TAG_MIN_LEN: usize = 5;

/// Lowercase and blank out everything that is not ASCII alphanumeric or whitespace.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

/// Split normalized text, keeping tokens of at least `min_len` characters.
pub fn tokenize(text: &str, min_len: usize) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|token| token.len() >= min_len)
        .map(str::to_string)
        .collect()
}

/// Terms used by the lexical index and by query vectorization.
pub fn index_terms(text: &str) -> Vec<String> {
    tokenize(text, INDEX_MIN_LEN)
}

/// Terms considered by the keyword extractor.
pub fn tag_terms(text: &str) -> Vec<String> {
    tokenize(text, TAG_MIN_LEN)
}

/// Raw term counts in first-encounter order.
pub fn count_terms<I>(tokens: I) -> Vec<(String, u32)>
where
    I: IntoIterator<Item = String>,
{
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, u32)> = Vec::new();
    for token in tokens {
        if let Some(&slot) = slots.get(&token) {
            counts[slot].1 += 1;
        } else {
            slots.insert(token.clone(), counts.len());
            counts.push((token, 1));
        }
    }
    counts
}
