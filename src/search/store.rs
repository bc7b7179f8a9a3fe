//! In-memory TF-IDF vector store
//!
//! Documents keep raw term counts; IDF weights are recomputed over the whole
//! corpus after every [`VectorStore::add_documents`] call and applied at
//! query time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::search::embeddings::SemanticHasher;
use crate::search::similarity::{cosine, rank_by_score};
use crate::search::tokenizer::{count_terms, index_terms};
use crate::search::types::{Document, Meta, ScoredResult};
use crate::search::vocabulary::{TermCounts, Vocabulary};

/// Results returned when the caller does not ask for a count.
pub const DEFAULT_TOP: usize = 5;

/// A stored document with its raw term counts.
#[derive(Debug, Clone)]
pub(crate) struct IndexedDocument {
    pub id: String,
    pub text: String,
    pub meta: Option<Meta>,
    pub counts: TermCounts,
}

/// TF-IDF store with an attached semantic hasher.
#[derive(Debug)]
pub struct VectorStore {
    docs: Vec<IndexedDocument>,
    ids: HashSet<String>,
    vocab: Vocabulary,
    idf: Vec<f32>,
    hasher: Arc<SemanticHasher>,
}

impl Default for VectorStore {
    fn default() -> Self {
        Self::new(Arc::new(SemanticHasher::fallback_only()))
    }
}

impl VectorStore {
    pub fn new(hasher: Arc<SemanticHasher>) -> Self {
        Self {
            docs: Vec::new(),
            ids: HashSet::new(),
            vocab: Vocabulary::new(),
            idf: Vec::new(),
            hasher,
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn vocab_len(&self) -> usize {
        self.vocab.len()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// IDF weights as of the last recompute.
    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn hasher(&self) -> &Arc<SemanticHasher> {
        &self.hasher
    }

    pub(crate) fn documents(&self) -> &[IndexedDocument] {
        &self.docs
    }

    /// Ingest a batch and recompute IDF once. Returns the batch size.
    ///
    /// IDF is rebuilt from the full corpus, so each call costs
    /// O(documents × vocabulary).
    pub fn add_documents<I>(&mut self, docs: I) -> usize
    where
        I: IntoIterator<Item = Document>,
    {
        let mut added = 0;
        for doc in docs {
            self.ingest(doc);
            added += 1;
        }

        let started = Instant::now();
        self.recompute_idf();
        debug!(
            added,
            documents = self.docs.len(),
            vocabulary = self.vocab.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "recomputed idf"
        );
        added
    }

    fn ingest(&mut self, doc: Document) {
        if !self.ids.insert(doc.id.clone()) {
            warn!(id = %doc.id, "duplicate document id; storing as a separate record");
        }

        let term_counts = count_terms(index_terms(&doc.text));
        let indices: Vec<usize> = term_counts
            .iter()
            .map(|(term, _)| self.vocab.intern(term))
            .collect();

        let mut counts = TermCounts::with_len(self.vocab.len());
        for (idx, (_, count)) in indices.into_iter().zip(term_counts) {
            counts.set(idx, count);
        }

        self.docs.push(IndexedDocument {
            id: doc.id,
            text: doc.text,
            meta: doc.meta,
            counts,
        });
    }

    /// Smoothed IDF: `ln((N + 1) / (df + 1)) + 1`, then zero-fill short
    /// count vectors to the vocabulary size.
    fn recompute_idf(&mut self) {
        let n = self.docs.len() as f32;
        let vocab_len = self.vocab.len();

        self.idf = (0..vocab_len)
            .map(|idx| {
                let df = self.docs.iter().filter(|d| d.counts.get(idx) > 0).count() as f32;
                ((n + 1.0) / (df + 1.0)).ln() + 1.0
            })
            .collect();

        for doc in &mut self.docs {
            doc.counts.zero_fill(vocab_len);
        }
    }

    /// IDF-weighted query vector; unknown terms are ignored.
    pub(crate) fn vectorize_query(&self, query: &str) -> Vec<f32> {
        let mut vec = vec![0.0; self.vocab.len()];
        for (term, count) in count_terms(index_terms(query)) {
            if let Some(idx) = self.vocab.get(&term) {
                vec[idx] = count as f32 * self.idf[idx];
            }
        }
        vec
    }

    /// Document TF-IDF vector, rebuilt on every call.
    pub(crate) fn document_tfidf(&self, doc: &IndexedDocument) -> Vec<f32> {
        doc.counts.weighted(&self.idf)
    }

    /// Lexical search: cosine between the query and every document.
    pub fn search(&self, query: &str, top: usize) -> Vec<ScoredResult> {
        let query_vec = self.vectorize_query(query);
        let mut results: Vec<ScoredResult> = self
            .docs
            .iter()
            .map(|doc| ScoredResult {
                id: doc.id.clone(),
                score: cosine(&query_vec, &self.document_tfidf(doc)),
                meta: doc.meta.clone(),
            })
            .collect();

        rank_by_score(&mut results, top, |r| r.score);
        results
    }

    /// Hashed n-gram embedding through the attached hasher.
    pub fn semantic_vector(&self, text: &str) -> Vec<f32> {
        self.hasher.semantic_vector(text)
    }
}
