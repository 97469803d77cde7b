//! Operation identifiers and results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::{Artifact, JobId};

/// A job kind exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Merge,
    Concat,
    AddSubtitles,
    AddBackgroundMusic,
    Resize,
    ExtractAudio,
    Thumbnail,
    Trim,
    NormalizeAudio,
    FullPipeline,
    Probe,
}

impl Operation {
    pub const ALL: [Operation; 11] = [
        Operation::Merge,
        Operation::Concat,
        Operation::AddSubtitles,
        Operation::AddBackgroundMusic,
        Operation::Resize,
        Operation::ExtractAudio,
        Operation::Thumbnail,
        Operation::Trim,
        Operation::NormalizeAudio,
        Operation::FullPipeline,
        Operation::Probe,
    ];

    /// Name used in responses, routes and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Concat => "concat",
            Self::AddSubtitles => "add-subtitles",
            Self::AddBackgroundMusic => "add-background-music",
            Self::Resize => "resize",
            Self::ExtractAudio => "extract-audio",
            Self::Thumbnail => "thumbnail",
            Self::Trim => "trim",
            Self::NormalizeAudio => "normalize-audio",
            Self::FullPipeline => "full-pipeline",
            Self::Probe => "probe",
        }
    }

    /// Filename prefix of the operation's result artifact.
    pub fn result_prefix(&self) -> &'static str {
        match self {
            Self::Merge => "merged",
            Self::Concat => "concat",
            Self::AddSubtitles => "subtitled",
            Self::AddBackgroundMusic => "with_music",
            Self::Resize => "resized",
            Self::ExtractAudio => "audio",
            Self::Thumbnail => "thumbnail",
            Self::Trim => "trimmed",
            Self::NormalizeAudio => "normalized",
            Self::FullPipeline => "final",
            Self::Probe => "probe",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a completed operation.
#[derive(Debug, Clone)]
pub struct OperationOutput {
    pub job_id: JobId,
    pub operation: Operation,
    /// The artifact the caller downloads.
    pub artifact: Artifact,
    pub file_size: u64,
    /// Operation-specific response fields (dimensions, format, steps_completed...).
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl OperationOutput {
    pub fn new(job_id: JobId, operation: Operation, artifact: Artifact, file_size: u64) -> Self {
        Self {
            job_id,
            operation,
            artifact,
            file_size,
            details: serde_json::Map::new(),
        }
    }

    pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_match_serde() {
        for op in Operation::ALL {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
        }
    }

    #[test]
    fn test_result_prefixes_are_unique() {
        let mut prefixes: Vec<_> = Operation::ALL.iter().map(|o| o.result_prefix()).collect();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), Operation::ALL.len());
    }
}
