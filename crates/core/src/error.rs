//! Job-level error taxonomy.
//!
//! Every operation surfaces one of these at the request boundary. Module-local
//! errors (engine, fetch) convert into it with `From`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineError;

/// Errors returned by job operations.
#[derive(Debug, Error)]
pub enum JobError {
    /// The caller omitted a required source field.
    #[error("Missing source: {0}")]
    MissingSource(String),

    /// Structurally invalid request parameters.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// A source could not be fetched or decoded.
    #[error("Source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    /// The media engine exited with a failure or timed out.
    #[error("Engine failure: {0}")]
    EngineFailure(#[from] EngineError),

    /// The staging directory could not be created or written.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Unknown job or artifact.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Serializable discriminant of [`JobError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingSource,
    InvalidParameters,
    SourceUnavailable,
    EngineFailure,
    StorageUnavailable,
    NotFound,
}

impl JobError {
    pub fn missing_source(what: impl Into<String>) -> Self {
        Self::MissingSource(what.into())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameters(reason.into())
    }

    pub fn source_unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            reason: reason.into(),
        }
    }

    pub fn storage(context: &str, err: std::io::Error) -> Self {
        Self::StorageUnavailable(format!("{}: {}", context, err))
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSource(_) => ErrorKind::MissingSource,
            Self::InvalidParameters(_) => ErrorKind::InvalidParameters,
            Self::SourceUnavailable { .. } => ErrorKind::SourceUnavailable,
            Self::EngineFailure(_) => ErrorKind::EngineFailure,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Engine diagnostics (stderr tail), if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::EngineFailure(e) => e.diagnostics(),
            _ => None,
        }
    }

    /// Whether the error was caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MissingSource | ErrorKind::InvalidParameters | ErrorKind::NotFound
        )
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingSource => "missing_source",
            Self::InvalidParameters => "invalid_parameters",
            Self::SourceUnavailable => "source_unavailable",
            Self::EngineFailure => "engine_failure",
            Self::StorageUnavailable => "storage_unavailable",
            Self::NotFound => "not_found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            JobError::missing_source("video").kind(),
            ErrorKind::MissingSource
        );
        assert_eq!(JobError::invalid("bad").kind(), ErrorKind::InvalidParameters);
        assert_eq!(
            JobError::source_unavailable("404").kind(),
            ErrorKind::SourceUnavailable
        );
        assert_eq!(JobError::not_found("x").kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_engine_failure_carries_diagnostics() {
        let err: JobError = EngineError::failed(Some(1), "Invalid data found").into();
        assert_eq!(err.kind(), ErrorKind::EngineFailure);
        assert_eq!(err.diagnostics(), Some("Invalid data found"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::StorageUnavailable).unwrap();
        assert_eq!(json, "\"storage_unavailable\"");
        assert_eq!(ErrorKind::StorageUnavailable.as_str(), "storage_unavailable");
    }
}
