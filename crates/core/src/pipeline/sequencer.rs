//! Runs an ordered list of stages over a single current artifact.

use std::time::Instant;
use tracing::{error, info, warn};

use super::stage::{PipelineStage, StageContext};
use super::stages::{BackgroundMusic, BurnSubtitles, NarrationMerge, NormalizeLoudness, PlatformResize};
use super::types::{PipelineFailure, PipelineOutcome, PipelineRequest, SkippedStep, StepPolicy};
use crate::job::ArtifactRole;
use crate::metrics::PIPELINE_STAGES;
use crate::source::SourceDescriptor;

/// Name of the implicit first stage.
pub const DOWNLOAD_STEP: &str = "download_video";

/// Primary source plus the stages applied to it, in order.
pub struct PipelineSpec {
    pub primary: SourceDescriptor,
    pub stages: Vec<Box<dyn PipelineStage>>,
}

impl PipelineSpec {
    /// Stage list for a full-pipeline request.
    ///
    /// Order is fixed: narration, music, subtitles, resize, normalisation.
    /// Stages whose inputs are absent are left out entirely.
    pub fn from_request(request: &PipelineRequest) -> Self {
        let mut stages: Vec<Box<dyn PipelineStage>> = Vec::new();
        if let Some(narration) = &request.narration {
            stages.push(Box::new(NarrationMerge {
                narration: narration.clone(),
            }));
        }
        if let Some(music) = &request.music {
            stages.push(Box::new(BackgroundMusic {
                music: music.clone(),
                volume: request.music_volume,
            }));
        }
        if let Some(srt) = request.subtitles.as_ref().filter(|s| !s.trim().is_empty()) {
            stages.push(Box::new(BurnSubtitles { srt: srt.clone() }));
        }
        if let Some(preset) = request.platform {
            stages.push(Box::new(PlatformResize { preset }));
        }
        if request.normalize {
            stages.push(Box::new(NormalizeLoudness));
        }
        Self {
            primary: request.video.clone(),
            stages,
        }
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

/// Threads the current artifact through the stages of a spec.
pub struct Sequencer<'a> {
    ctx: StageContext<'a>,
}

impl<'a> Sequencer<'a> {
    pub fn new(ctx: StageContext<'a>) -> Self {
        Self { ctx }
    }

    /// Runs every stage and copies the surviving artifact to `final_<job_id>.mp4`.
    ///
    /// The current artifact only advances when a stage succeeds.
    pub async fn run(&self, spec: PipelineSpec) -> Result<PipelineOutcome, PipelineFailure> {
        let job_id = self.ctx.area.id().clone();
        let started = Instant::now();
        let mut completed = Vec::new();
        let mut skipped = Vec::new();

        let mut current = match self
            .ctx
            .resolver
            .resolve(
                &spec.primary,
                self.ctx.area.intermediate(1, "video"),
            )
            .await
        {
            Ok(mut artifact) => {
                artifact.role = ArtifactRole::InputVideo;
                artifact
            }
            Err(e) => {
                error!(job_id = %job_id, step = DOWNLOAD_STEP, error = %e, "Pipeline aborted");
                PIPELINE_STAGES
                    .with_label_values(&[DOWNLOAD_STEP, "aborted"])
                    .inc();
                return Err(PipelineFailure::at(DOWNLOAD_STEP, completed, e));
            }
        };
        PIPELINE_STAGES
            .with_label_values(&[DOWNLOAD_STEP, "completed"])
            .inc();
        completed.push(DOWNLOAD_STEP.to_string());

        for stage in &spec.stages {
            let name = stage.name();
            match stage.run(&self.ctx, &current).await {
                Ok(next) => {
                    info!(job_id = %job_id, step = %name, artifact = %next.name, "Stage completed");
                    PIPELINE_STAGES
                        .with_label_values(&[metric_stage(&name), "completed"])
                        .inc();
                    completed.push(name);
                    current = next;
                }
                Err(e) if stage.policy() == StepPolicy::BestEffort => {
                    warn!(job_id = %job_id, step = %name, error = %e, "Optional stage failed, keeping {}", current.name);
                    PIPELINE_STAGES
                        .with_label_values(&[metric_stage(&name), "skipped"])
                        .inc();
                    skipped.push(SkippedStep {
                        step: name,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(job_id = %job_id, step = %name, error = %e, "Pipeline aborted");
                    PIPELINE_STAGES
                        .with_label_values(&[metric_stage(&name), "aborted"])
                        .inc();
                    return Err(PipelineFailure::at(name, completed, e));
                }
            }
        }

        let final_artifact = match self.ctx.area.finalize(&current).await {
            Ok(artifact) => artifact,
            Err(e) => return Err(PipelineFailure::at("finalize", completed, e)),
        };

        info!(
            job_id = %job_id,
            steps = completed.len(),
            skipped = skipped.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline finished"
        );
        Ok(PipelineOutcome {
            final_artifact,
            steps_completed: completed,
            steps_skipped: skipped,
        })
    }
}

/// Collapses `resize_<platform>` so the stage label stays low-cardinality.
fn metric_stage(name: &str) -> &str {
    if name.starts_with("resize_") {
        "resize"
    } else {
        name
    }
}
