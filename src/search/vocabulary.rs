//! Vocabulary and per-document term counts.

use std::collections::HashMap;

/// Term → index map assigned in first-encounter order.
///
/// Indices are stable: the vocabulary only grows, it never removes or
/// renumbers a term.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    index: HashMap<String, usize>,
    terms: Vec<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Index of a known term.
    pub fn get(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// Term stored at `idx`.
    pub fn term(&self, idx: usize) -> Option<&str> {
        self.terms.get(idx).map(String::as_str)
    }

    /// Return the index for `term`, assigning the next free one if unseen.
    pub fn intern(&mut self, term: &str) -> usize {
        if let Some(idx) = self.get(term) {
            return idx;
        }
        let idx = self.terms.len();
        self.index.insert(term.to_string(), idx);
        self.terms.push(term.to_string());
        idx
    }
}

/// Dense raw term counts addressed by vocabulary index.
///
/// A vector is sized to the vocabulary at the time its document was
/// ingested, so it can be shorter than the current vocabulary. Positions
/// past the end read as zero until [`TermCounts::zero_fill`] materializes
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermCounts(Vec<u32>);

impl TermCounts {
    pub fn with_len(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count at `idx`, zero when `idx` is past the materialized length.
    pub fn get(&self, idx: usize) -> u32 {
        self.0.get(idx).copied().unwrap_or(0)
    }

    pub fn set(&mut self, idx: usize, count: u32) {
        if idx >= self.0.len() {
            self.0.resize(idx + 1, 0);
        }
        self.0[idx] = count;
    }

    /// Extend with zeros up to `len`; never shrinks.
    pub fn zero_fill(&mut self, len: usize) {
        if self.0.len() < len {
            self.0.resize(len, 0);
        }
    }

    /// TF-IDF form: `count[i] * idf[i]` for every idf slot.
    pub fn weighted(&self, idf: &[f32]) -> Vec<f32> {
        idf.iter()
            .enumerate()
            .map(|(idx, weight)| self.get(idx) as f32 * weight)
            .collect()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}
