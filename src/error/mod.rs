//! Error handling for the search core.
//!
//! This module provides:
//! - [`SearchError`]: the error enum for every fallible operation
//! - [`ErrorCode`]: stable codes for machine parsing

mod codes;

use std::io;

use thiserror::Error;

pub use codes::ErrorCode;

/// Main error type for search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Displayed verbatim in worker `error` responses.
    #[error("not_initialized")]
    NotInitialized,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Native module error: {0}")]
    NativeModule(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Worker unavailable: {0}")]
    WorkerUnavailable(String),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}

impl SearchError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::NativeModule(_) => ErrorCode::NativeUnavailable,
            Self::Http(_) => ErrorCode::NetworkError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::WorkerUnavailable(_) => ErrorCode::WorkerUnavailable,
            Self::Panicked(_) => ErrorCode::InternalError,
        }
    }

    /// Availability errors are always recovered locally by the pure hasher.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NativeModule(_) | Self::Http(_) | Self::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
