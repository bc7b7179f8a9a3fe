//! Worker wire protocol
//!
//! Requests and responses are closed enums tagged by a `type` field, so
//! they serialize to the same JSON objects the page sends through
//! `postMessage`:
//!
//! ```text
//! -> {"type":"search","query":"peptide","top":3}
//! <- {"type":"searchResult","query":"peptide","results":[...]}
//! ```
//!
//! Every message may carry an optional `id`. The worker echoes it on the
//! matching response; without ids, responses can only be matched by order
//! and echoed query text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SearchError;
use crate::search::{Document, HybridResult as HybridHit, ScoredResult};

/// Requests accepted by the search worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerRequest {
    /// Append documents; may be sent repeatedly.
    Init { documents: Vec<Document> },
    /// Lexical-only search.
    Search {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        top: Option<usize>,
    },
    /// Hybrid search.
    Hybrid {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        top: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alpha: Option<f32>,
    },
    /// Keyword extraction; does not need an initialized store.
    Tags {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    Ping,
}

impl WorkerRequest {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Search { .. } => "search",
            Self::Hybrid { .. } => "hybrid",
            Self::Tags { .. } => "tags",
            Self::Ping => "ping",
        }
    }
}

/// Responses emitted by the search worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerResponse {
    /// `count` is the size of the batch just added.
    Inited { count: usize },
    SearchResult {
        query: String,
        results: Vec<ScoredResult>,
    },
    HybridResult {
        query: String,
        results: Vec<HybridHit>,
    },
    TagsResult { tags: Vec<String> },
    Pong,
    Error { error: String },
}

impl WorkerResponse {
    pub fn error(err: &SearchError) -> Self {
        Self::Error {
            error: err.to_string(),
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Inited { .. } => "inited",
            Self::SearchResult { .. } => "searchResult",
            Self::HybridResult { .. } => "hybridResult",
            Self::TagsResult { .. } => "tagsResult",
            Self::Pong => "pong",
            Self::Error { .. } => "error",
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// A message plus its optional correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    /// Uncorrelated message.
    pub const fn new(body: T) -> Self {
        Self { id: None, body }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Reply carrying the same id.
    pub fn reply<U>(&self, body: U) -> Envelope<U> {
        Envelope {
            id: self.id.clone(),
            body,
        }
    }
}

/// Decode one JSON request.
///
/// On failure returns the `error` response to send back, with the id
/// echoed when the input was at least a JSON object carrying one.
pub fn decode_request(
    raw: &str,
) -> std::result::Result<Envelope<WorkerRequest>, Envelope<WorkerResponse>> {
    let value: Value = serde_json::from_str(raw).map_err(|err| {
        Envelope::new(WorkerResponse::error(&SearchError::InvalidRequest(
            err.to_string(),
        )))
    })?;
    let id = value.get("id").cloned();
    serde_json::from_value(value).map_err(|err| Envelope {
        id,
        body: WorkerResponse::error(&SearchError::InvalidRequest(err.to_string())),
    })
}
