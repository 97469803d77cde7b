//! Error types for the engine module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the media engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine binary not found.
    #[error("Engine binary not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The process exited with a non-zero status.
    #[error("Engine exited with code {}", .exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    Failed {
        exit_code: Option<i32>,
        diagnostics: String,
    },

    /// The process was killed after exceeding its timeout.
    #[error("Engine timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: f64 },

    /// The process succeeded but wrote nothing.
    #[error("Engine produced an empty output: {path}")]
    EmptyOutput { path: PathBuf },

    /// Failed to probe media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Failed to parse ffprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// I/O error while running the engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn failed(exit_code: Option<i32>, diagnostics: impl Into<String>) -> Self {
        Self::Failed {
            exit_code,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Captured stderr tail, when the engine wrote any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Failed { diagnostics, .. } if !diagnostics.is_empty() => Some(diagnostics),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
