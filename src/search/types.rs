//! Documents and result records exchanged with callers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque caller-supplied metadata carried through to results.
pub type Meta = Map<String, Value>;

/// A document as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            meta: None,
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// A lexical search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub id: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// A hybrid search hit with its per-signal breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridResult {
    pub id: String,
    /// `alpha * tfidf_score + (1 - alpha) * sem_score`
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub tfidf_score: f32,
    pub sem_score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_meta_is_optional_on_the_wire() {
        let doc: Document = serde_json::from_str(r#"{"id":"1","text":"peptide"}"#).unwrap();
        assert_eq!(doc, Document::new("1", "peptide"));
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("meta"));
    }

    #[test]
    fn hybrid_result_uses_camel_case_breakdown() {
        let result = HybridResult {
            id: "b".into(),
            score: 0.8,
            meta: None,
            tfidf_score: 1.0,
            sem_score: 0.5,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["tfidfScore"], 1.0);
        assert_eq!(json["semScore"], 0.5);
    }
}
