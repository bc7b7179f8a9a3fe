//! Hashed character 4-gram embeddings
//!
//! FNV-1a over every rolling 4-character window, folded into 256 bins and
//! L2-normalized. No model, fully deterministic. A native (wasm) build of
//! the same hash can be loaded lazily through [`SemanticHasher`]; until it
//! is ready, and whenever it fails, the pure implementation is used.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::NativeConfig;
use crate::search::native::{ModuleSource, NativeHasher, source_from_location};
use crate::search::similarity::l2_normalize;

/// Embedding width.
pub const DIMS: usize = 256;

const GRAM: usize = 4;
const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// Pure n-gram embedding.
///
/// Texts shorter than four characters have no grams and yield the zero
/// vector.
pub fn hash_ngrams(text: &str) -> Vec<f32> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let mut embedding = vec![0.0; DIMS];

    for gram in chars.windows(GRAM) {
        embedding[gram_bin(gram)] += 1.0;
    }

    l2_normalize(&mut embedding);
    embedding
}

fn gram_bin(gram: &[char]) -> usize {
    let hash = gram.iter().fold(FNV_OFFSET, |hash, &c| {
        (hash ^ u32::from(c)).wrapping_mul(FNV_PRIME)
    });
    hash as usize % DIMS
}

/// Lazily loaded native hasher plus the pure fallback.
///
/// The native module is loaded at most once per hasher: concurrent callers
/// share the in-flight load and the outcome, success or failure, is kept.
pub struct SemanticHasher {
    source: Option<Box<dyn ModuleSource>>,
    native: OnceCell<Option<Arc<NativeHasher>>>,
    preload_started: AtomicBool,
}

impl std::fmt::Debug for SemanticHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticHasher")
            .field("source", &self.source.as_ref().map(|s| s.describe()))
            .field("native", &self.has_native())
            .finish()
    }
}

impl SemanticHasher {
    pub fn new(source: Box<dyn ModuleSource>) -> Self {
        Self {
            source: Some(source),
            native: OnceCell::new(),
            preload_started: AtomicBool::new(false),
        }
    }

    /// A hasher that never loads a module.
    pub fn fallback_only() -> Self {
        Self {
            source: None,
            native: OnceCell::new(),
            preload_started: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &NativeConfig) -> Self {
        if config.enabled {
            Self::new(source_from_location(&config.source))
        } else {
            Self::fallback_only()
        }
    }

    /// Whether the native module is loaded and in use.
    pub fn has_native(&self) -> bool {
        matches!(self.native.get(), Some(Some(_)))
    }

    /// Whether a load has settled, successfully or not.
    pub fn load_settled(&self) -> bool {
        self.native.initialized()
    }

    /// Load the native module once; later calls reuse the outcome.
    ///
    /// Never fails: any fetch, compile, or shape error resolves to `false`.
    pub async fn load_native(&self) -> bool {
        let native = self
            .native
            .get_or_init(|| async {
                let source = self.source.as_deref()?;
                match NativeHasher::load(source).await {
                    Ok(hasher) => Some(Arc::new(hasher)),
                    Err(err) => {
                        debug!(
                            source = %source.describe(),
                            error = %err,
                            "native hasher unavailable; using pure n-gram hashing"
                        );
                        None
                    }
                }
            })
            .await;
        native.is_some()
    }

    /// Start the load in the background without waiting for it.
    ///
    /// Does nothing outside a tokio runtime or once a load has started.
    pub fn preload(self: &Arc<Self>) {
        if self.load_settled() || self.preload_started.swap(true, Ordering::AcqRel) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let this = Arc::clone(self);
                handle.spawn(async move {
                    this.load_native().await;
                });
            }
            Err(_) => {
                self.preload_started.store(false, Ordering::Release);
                debug!("no async runtime; native hasher preload skipped");
            }
        }
    }

    /// Load in a background task and wait for it at most `wait`.
    ///
    /// The load keeps running after a timeout, so a later call can still
    /// pick it up.
    pub async fn load_native_within(self: &Arc<Self>, wait: Duration) -> bool {
        if self.load_settled() {
            return self.has_native();
        }
        let this = Arc::clone(self);
        let task = tokio::spawn(async move { this.load_native().await });
        match tokio::time::timeout(wait, task).await {
            Ok(Ok(loaded)) => loaded,
            Ok(Err(err)) => {
                warn!(error = %err, "native hasher load task failed");
                false
            }
            Err(_) => {
                debug!(?wait, "native hasher still loading; using pure n-gram hashing");
                false
            }
        }
    }

    /// Embed `text`, preferring the native module when it is loaded.
    pub fn semantic_vector(&self, text: &str) -> Vec<f32> {
        if let Some(Some(native)) = self.native.get() {
            match native.hash(text) {
                Ok(embedding) => return embedding,
                Err(err) => {
                    warn!(error = %err, "native hash failed; falling back for this call");
                }
            }
        }
        hash_ngrams(text)
    }
}

impl Default for SemanticHasher {
    fn default() -> Self {
        Self::fallback_only()
    }
}
