//! Types for the full pipeline.

use serde::{Deserialize, Serialize};

use crate::error::JobError;
use crate::filter::PlatformPreset;
use crate::job::Artifact;
use crate::operations::requests::ensure_gain;
use crate::source::SourceDescriptor;

/// What a stage failure does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    /// Failure aborts the pipeline.
    Mandatory,
    /// Failure is recorded as skipped; the current artifact is kept.
    BestEffort,
}

/// Full-pipeline request.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Primary video, usually an upstream render reference.
    pub video: SourceDescriptor,
    /// Narration merged onto the video.
    pub narration: Option<SourceDescriptor>,
    /// Fail up front when no narration is supplied.
    pub narration_required: bool,
    /// SRT text burned into the picture.
    pub subtitles: Option<String>,
    pub music: Option<SourceDescriptor>,
    pub music_volume: f64,
    pub platform: Option<PlatformPreset>,
    pub normalize: bool,
}

impl PipelineRequest {
    pub fn new(video: SourceDescriptor) -> Self {
        Self {
            video,
            narration: None,
            narration_required: false,
            subtitles: None,
            music: None,
            music_volume: 0.1,
            platform: None,
            normalize: false,
        }
    }

    pub fn validate(&self) -> Result<(), JobError> {
        if self.narration_required && self.narration.is_none() {
            return Err(JobError::missing_source(
                "narration audio required (audio_base64 or audio_url)",
            ));
        }
        ensure_gain("music_volume", self.music_volume)
    }
}

/// A best-effort stage that did not run to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedStep {
    pub step: String,
    pub reason: String,
}

/// Result of a pipeline run that reached the terminal copy.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub final_artifact: Artifact,
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<SkippedStep>,
}

/// A pipeline run that was aborted.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct PipelineFailure {
    /// Stage that aborted the run; `None` when the request never started.
    pub failed_step: Option<String>,
    pub steps_completed: Vec<String>,
    #[source]
    pub error: JobError,
}

impl PipelineFailure {
    pub fn at(step: impl Into<String>, steps_completed: Vec<String>, error: JobError) -> Self {
        Self {
            failed_step: Some(step.into()),
            steps_completed,
            error,
        }
    }
}

impl From<JobError> for PipelineFailure {
    fn from(error: JobError) -> Self {
        Self {
            failed_step: None,
            steps_completed: Vec::new(),
            error,
        }
    }
}
