//! Full pipeline: download, narration, music, subtitles, resize, loudness.
//!
//! The [`Sequencer`] keeps one current artifact. Each stage reads it and
//! produces a new numbered intermediate; the pointer only moves on success.
//! A failing [`StepPolicy::BestEffort`] stage is recorded as skipped, a
//! failing [`StepPolicy::Mandatory`] stage aborts the run without a final
//! artifact.

mod sequencer;
mod stage;
mod stages;
mod types;

pub use sequencer::{PipelineSpec, Sequencer, DOWNLOAD_STEP};
pub use stage::{PipelineStage, StageContext};
pub use stages::{
    BackgroundMusic, BurnSubtitles, NarrationMerge, NormalizeLoudness, PlatformResize,
    FALLBACK_DURATION_SECS,
};
pub use types::{PipelineFailure, PipelineOutcome, PipelineRequest, SkippedStep, StepPolicy};
