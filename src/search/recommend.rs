//! Related-paper recommendations from shared keywords.
//!
//! Each paper becomes a keyword-frequency vector over a vocabulary built from
//! all papers; candidates are ranked by cosine similarity to the target.

use serde::{Deserialize, Serialize};

use crate::search::similarity::{cosine, rank_by_score};
use crate::search::store::DEFAULT_TOP;
use crate::search::vocabulary::{TermCounts, Vocabulary};

/// Paper metadata as published by the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Paper {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: None,
            year: None,
            keywords: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

/// A recommended paper; `reasons` lists the keywords it shares with the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub score: f32,
    pub reasons: Vec<String>,
}

/// Papers most similar to `target_id`, best first, excluding the target.
///
/// Returns nothing when `target_id` is not among `papers`. Keywords are
/// matched exactly (no normalization).
pub fn recommend(papers: &[Paper], target_id: &str, top: usize) -> Vec<Recommendation> {
    let Some(target) = papers.iter().find(|p| p.id == target_id) else {
        return Vec::new();
    };

    let mut vocab = Vocabulary::new();
    for keyword in papers.iter().flat_map(|p| &p.keywords) {
        vocab.intern(keyword);
    }

    let vectorize = |paper: &Paper| -> Vec<f32> {
        let mut counts = TermCounts::with_len(vocab.len());
        for keyword in &paper.keywords {
            if let Some(idx) = vocab.get(keyword) {
                counts.set(idx, counts.get(idx) + 1);
            }
        }
        counts.as_slice().iter().map(|c| *c as f32).collect()
    };

    let target_vec = vectorize(target);
    let mut results: Vec<Recommendation> = papers
        .iter()
        .filter(|p| p.id != target_id)
        .map(|paper| Recommendation {
            id: paper.id.clone(),
            score: cosine(&target_vec, &vectorize(paper)),
            reasons: shared_keywords(target, paper),
        })
        .collect();

    rank_by_score(&mut results, top, |r| r.score);
    results
}

/// [`recommend`] with the default result count.
pub fn recommend_default(papers: &[Paper], target_id: &str) -> Vec<Recommendation> {
    recommend(papers, target_id, DEFAULT_TOP)
}

fn shared_keywords(target: &Paper, other: &Paper) -> Vec<String> {
    let mut shared: Vec<String> = Vec::new();
    for keyword in &target.keywords {
        if other.keywords.contains(keyword) && !shared.contains(keyword) {
            shared.push(keyword.clone());
        }
    }
    shared
}
