//! Search worker: the execution boundary around the store.
//!
//! A single tokio task owns at most one [`VectorStore`] (created on the
//! first `init`) and handles [`WorkerRequest`]s strictly in arrival order,
//! so the store needs no locking. Callers talk to it only through
//! [`WorkerHandle`].
//!
//! Handler errors and panics become `error` responses; the task keeps
//! serving until every request sender is dropped.

pub mod protocol;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{Result, SearchError};
use crate::search::{
    DEFAULT_ALPHA, DEFAULT_MAX_TAGS, DEFAULT_TOP, SemanticHasher, VectorStore, extract_tags,
};

pub use protocol::{Envelope, WorkerRequest, WorkerResponse, decode_request};

const CHANNEL_CAPACITY: usize = 64;

/// Defaults applied to requests that omit optional fields.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub default_top: usize,
    pub default_alpha: f32,
    pub default_max_tags: usize,
    /// Bounded wait for the native hasher before a hybrid query.
    pub native_wait: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            default_top: DEFAULT_TOP,
            default_alpha: DEFAULT_ALPHA,
            default_max_tags: DEFAULT_MAX_TAGS,
            native_wait: Duration::ZERO,
        }
    }
}

impl WorkerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_top: config.search.default_top,
            default_alpha: config.search.alpha,
            default_max_tags: config.tags.default_max,
            native_wait: config.native.wait,
        }
    }
}

/// Owner of the store and request dispatcher.
#[derive(Debug)]
pub struct SearchWorker {
    store: Option<VectorStore>,
    hasher: Arc<SemanticHasher>,
    settings: WorkerSettings,
}

impl SearchWorker {
    pub fn new(hasher: Arc<SemanticHasher>, settings: WorkerSettings) -> Self {
        Self {
            store: None,
            hasher,
            settings,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(SemanticHasher::from_config(&config.native)),
            WorkerSettings::from_config(config),
        )
    }

    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    pub fn hasher(&self) -> &Arc<SemanticHasher> {
        &self.hasher
    }

    /// Handle one request, waiting for the native hasher first when the
    /// request is a hybrid query and a wait is configured.
    pub async fn handle(&mut self, request: WorkerRequest) -> WorkerResponse {
        if matches!(request, WorkerRequest::Hybrid { .. })
            && self.store.is_some()
            && !self.settings.native_wait.is_zero()
        {
            self.hasher
                .load_native_within(self.settings.native_wait)
                .await;
        }
        self.handle_now(request)
    }

    /// Handle one request synchronously; errors and panics become `error`
    /// responses.
    pub fn handle_now(&mut self, request: WorkerRequest) -> WorkerResponse {
        let kind = request.kind();
        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(request))) {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                debug!(request = kind, code = %err.code(), error = %err, "request failed");
                WorkerResponse::error(&err)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(request = kind, panic = %message, "request handler panicked");
                WorkerResponse::error(&SearchError::Panicked(message))
            }
        }
    }

    fn dispatch(&mut self, request: WorkerRequest) -> Result<WorkerResponse> {
        match request {
            WorkerRequest::Init { documents } => {
                let hasher = Arc::clone(&self.hasher);
                let store = self.store.get_or_insert_with(|| VectorStore::new(hasher));
                let count = store.add_documents(documents);
                Ok(WorkerResponse::Inited { count })
            }
            WorkerRequest::Search { query, top } => {
                let store = self.store.as_ref().ok_or(SearchError::NotInitialized)?;
                let results = store.search(&query, self.top(top));
                Ok(WorkerResponse::SearchResult { query, results })
            }
            WorkerRequest::Hybrid { query, top, alpha } => {
                let store = self.store.as_ref().ok_or(SearchError::NotInitialized)?;
                let alpha = alpha.unwrap_or(self.settings.default_alpha);
                let results = store.hybrid_search(&query, self.top(top), alpha);
                Ok(WorkerResponse::HybridResult { query, results })
            }
            WorkerRequest::Tags { text, max } => {
                let max = max
                    .filter(|m| *m > 0)
                    .unwrap_or(self.settings.default_max_tags);
                Ok(WorkerResponse::TagsResult {
                    tags: extract_tags(&text, max),
                })
            }
            WorkerRequest::Ping => Ok(WorkerResponse::Pong),
        }
    }

    /// Missing or zero `top` falls back to the default.
    fn top(&self, top: Option<usize>) -> usize {
        top.filter(|t| *t > 0).unwrap_or(self.settings.default_top)
    }

    /// Move the worker onto its own task.
    ///
    /// The native hasher load is started as soon as the task runs.
    pub fn spawn(self) -> WorkerHandle {
        let (request_tx, request_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (response_tx, response_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(self.run(request_rx, response_tx));
        WorkerHandle {
            requests: request_tx,
            responses: response_rx,
            task,
        }
    }

    async fn run(
        mut self,
        mut requests: mpsc::Receiver<Envelope<WorkerRequest>>,
        responses: mpsc::Sender<Envelope<WorkerResponse>>,
    ) {
        self.hasher.preload();
        debug!("search worker started");

        while let Some(envelope) = requests.recv().await {
            let Envelope { id, body } = envelope;
            let kind = body.kind();
            let response = self.handle(body).await;
            debug!(request = kind, response = response.kind(), "handled request");
            if responses.send(Envelope { id, body: response }).await.is_err() {
                break;
            }
        }

        debug!("search worker stopped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Caller side of a spawned [`SearchWorker`].
///
/// Responses arrive in request order. [`WorkerHandle::call`] assumes it is
/// the only one posting; use correlation ids with [`WorkerHandle::post`]
/// and [`WorkerHandle::next_response`] otherwise.
#[derive(Debug)]
pub struct WorkerHandle {
    requests: mpsc::Sender<Envelope<WorkerRequest>>,
    responses: mpsc::Receiver<Envelope<WorkerResponse>>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Queue a request without waiting for its response.
    pub async fn post(&self, envelope: Envelope<WorkerRequest>) -> Result<()> {
        self.requests
            .send(envelope)
            .await
            .map_err(|_| SearchError::WorkerUnavailable("worker task has stopped".to_string()))
    }

    /// Next response in arrival order.
    pub async fn next_response(&mut self) -> Option<Envelope<WorkerResponse>> {
        self.responses.recv().await
    }

    /// Post and wait for the response.
    pub async fn call(&mut self, envelope: Envelope<WorkerRequest>) -> Result<Envelope<WorkerResponse>> {
        self.post(envelope).await?;
        self.next_response().await.ok_or_else(|| {
            SearchError::WorkerUnavailable("worker closed before responding".to_string())
        })
    }

    /// Uncorrelated [`WorkerHandle::call`].
    pub async fn request(&mut self, request: WorkerRequest) -> Result<WorkerResponse> {
        Ok(self.call(Envelope::new(request)).await?.body)
    }

    /// Another sender for posting from elsewhere.
    pub fn sender(&self) -> mpsc::Sender<Envelope<WorkerRequest>> {
        self.requests.clone()
    }

    /// Stop accepting requests and wait for the task to drain.
    pub async fn shutdown(self) {
        let Self {
            requests,
            mut responses,
            task,
        } = self;
        drop(requests);
        // drain so the worker never blocks on a full response channel
        while responses.recv().await.is_some() {}
        if let Err(err) = task.await {
            error!(error = %err, "search worker task failed");
        }
    }
}
