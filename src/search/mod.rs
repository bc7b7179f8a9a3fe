//! Search core
//!
//! Implements hybrid search: TF-IDF cosine + hashed n-gram embeddings,
//! blended linearly.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        Search Query                            │
//! └────────────────────────────────────────────────────────────────┘
//!                     │                          │
//!                     ▼                          ▼
//! ┌──────────────────────────────┐  ┌──────────────────────────────┐
//! │       VectorStore            │  │       SemanticHasher         │
//! │   (vocabulary + TF-IDF)      │  │   (wasm module / pure FNV)   │
//! └──────────────────────────────┘  └──────────────────────────────┘
//!                     │                          │
//!                     └──────────┬───────────────┘
//!                                ▼
//!                ┌───────────────────────────────┐
//!                │   alpha blend (hybrid.rs)     │
//!                └───────────────────────────────┘
//!                                │
//!                                ▼
//!                     Combined ranked results
//! ```

pub mod embeddings;
pub mod hybrid;
pub mod native;
pub mod recommend;
pub mod similarity;
pub mod store;
pub mod tags;
pub mod tokenizer;
pub mod types;
pub mod vocabulary;

// Re-export main types
pub use embeddings::{DIMS, SemanticHasher, hash_ngrams};
pub use hybrid::{DEFAULT_ALPHA, blend};
pub use native::{FileSource, ModuleSource, NativeHasher, UrlSource, source_from_location};
pub use recommend::{Paper, Recommendation, recommend};
pub use similarity::cosine;
pub use store::{DEFAULT_TOP, VectorStore};
pub use tags::{DEFAULT_MAX_TAGS, extract_tags};
pub use types::{Document, HybridResult, Meta, ScoredResult};
pub use vocabulary::{TermCounts, Vocabulary};
