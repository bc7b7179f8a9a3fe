pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod search;
pub mod test_utils;
pub mod worker;

pub use error::{Result, SearchError};
pub use search::{Document, HybridResult, ScoredResult, VectorStore};
pub use worker::{SearchWorker, WorkerHandle, WorkerRequest, WorkerResponse};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
