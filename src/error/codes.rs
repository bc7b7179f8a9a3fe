//! Standardized error codes for machine-parseable output.
//!
//! Codes are grouped by category:
//! - 1xx: Protocol errors
//! - 3xx: Config errors
//! - 5xx: Native module / network errors
//! - 6xx: IO and serialization errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Stable error codes carried alongside error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// E101: search or hybrid request before any documents were loaded
    NotInitialized,
    /// E102: request could not be decoded or had invalid fields
    InvalidRequest,

    /// E301: config file has invalid syntax or values
    ConfigInvalid,
    /// E302: a required config value or directory is missing
    ConfigMissingRequired,

    /// E501: native hasher could not be fetched, compiled, or called
    NativeUnavailable,
    /// E502: HTTP fetch failed
    NetworkError,

    /// E601: filesystem read/write failed
    IoError,
    /// E602: JSON encoding or decoding failed
    SerializationError,

    /// E901: worker task is gone
    WorkerUnavailable,
    /// E902: a handler panicked while serving a request
    InternalError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `NotInitialized` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::NotInitialized => 101,
            Self::InvalidRequest => 102,
            Self::ConfigInvalid => 301,
            Self::ConfigMissingRequired => 302,
            Self::NativeUnavailable => 501,
            Self::NetworkError => 502,
            Self::IoError => 601,
            Self::SerializationError => 602,
            Self::WorkerUnavailable => 901,
            Self::InternalError => 902,
        }
    }

    /// Snake-case identifier, identical to the serialized form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::InvalidRequest => "invalid_request",
            Self::ConfigInvalid => "config_invalid",
            Self::ConfigMissingRequired => "config_missing_required",
            Self::NativeUnavailable => "native_unavailable",
            Self::NetworkError => "network_error",
            Self::IoError => "io_error",
            Self::SerializationError => "serialization_error",
            Self::WorkerUnavailable => "worker_unavailable",
            Self::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.numeric())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_numeric_code() {
        assert_eq!(ErrorCode::NotInitialized.to_string(), "E101");
        assert_eq!(ErrorCode::InternalError.to_string(), "E902");
    }

    #[test]
    fn serialized_form_matches_as_str() {
        for code in [
            ErrorCode::NotInitialized,
            ErrorCode::ConfigInvalid,
            ErrorCode::NativeUnavailable,
            ErrorCode::WorkerUnavailable,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }
}
