//! The stage abstraction the sequencer drives.

use async_trait::async_trait;
use std::time::Duration;

use super::types::StepPolicy;
use crate::engine::MediaEngine;
use crate::error::JobError;
use crate::job::{Artifact, StagingArea};
use crate::source::SourceResolver;

/// Everything a stage may touch while it runs.
pub struct StageContext<'a> {
    pub area: &'a StagingArea,
    pub resolver: &'a SourceResolver,
    pub engine: &'a dyn MediaEngine,
    /// Timeout for every engine step of the run.
    pub timeout: Duration,
}

/// One transformation of the current artifact.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Name reported in `steps_completed`.
    fn name(&self) -> String;

    fn policy(&self) -> StepPolicy;

    /// Produces a new artifact from `current`. `current` is never modified.
    async fn run(&self, ctx: &StageContext<'_>, current: &Artifact) -> Result<Artifact, JobError>;
}
