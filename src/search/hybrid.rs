//! Hybrid scoring: TF-IDF cosine blended with hashed n-gram cosine.
//!
//! ```text
//! score(d) = alpha * lexical(q, d) + (1 - alpha) * semantic(q, d)
//! ```
//!
//! Document embeddings are recomputed from raw text on every call.
//!
//! [`VectorStore::hybrid_search`] only *starts* the native hasher load, so
//! queries issued before it settles are scored with the pure hasher.
//! [`VectorStore::hybrid_search_ready`] waits for the load, bounded by a
//! timeout, before scoring.

use std::time::Duration;

use crate::search::similarity::{cosine, rank_by_score};
use crate::search::store::VectorStore;
use crate::search::types::HybridResult;

/// Weight of the lexical signal when the caller does not pick one.
pub const DEFAULT_ALPHA: f32 = 0.6;

/// Linear blend of the two signals.
pub fn blend(alpha: f32, lexical: f32, semantic: f32) -> f32 {
    alpha * lexical + (1.0 - alpha) * semantic
}

impl VectorStore {
    /// Hybrid search; kicks off (but does not await) the native hasher load.
    pub fn hybrid_search(&self, query: &str, top: usize, alpha: f32) -> Vec<HybridResult> {
        self.hasher().preload();
        self.score_hybrid(query, top, alpha)
    }

    /// Hybrid search that first waits up to `wait` for the native hasher.
    pub async fn hybrid_search_ready(
        &self,
        query: &str,
        top: usize,
        alpha: f32,
        wait: Duration,
    ) -> Vec<HybridResult> {
        if wait.is_zero() {
            return self.hybrid_search(query, top, alpha);
        }
        self.hasher().load_native_within(wait).await;
        self.score_hybrid(query, top, alpha)
    }

    fn score_hybrid(&self, query: &str, top: usize, alpha: f32) -> Vec<HybridResult> {
        let query_tfidf = self.vectorize_query(query);
        let query_semantic = self.semantic_vector(query);

        let mut results: Vec<HybridResult> = self
            .documents()
            .iter()
            .map(|doc| {
                let tfidf_score = cosine(&query_tfidf, &self.document_tfidf(doc));
                let sem_score = cosine(&query_semantic, &self.semantic_vector(&doc.text));
                HybridResult {
                    id: doc.id.clone(),
                    score: blend(alpha, tfidf_score, sem_score),
                    meta: doc.meta.clone(),
                    tfidf_score,
                    sem_score,
                }
            })
            .collect();

        rank_by_score(&mut results, top, |r| r.score);
        results
    }
}
