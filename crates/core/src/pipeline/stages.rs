//! Concrete pipeline stages.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::stage::{PipelineStage, StageContext};
use super::types::StepPolicy;
use crate::error::JobError;
use crate::filter::{FillColor, FitMode, PlatformPreset, SubtitleStyle};
use crate::job::{Artifact, ArtifactRole};
use crate::operations::steps::{self, MusicMix};
use crate::source::SourceDescriptor;

/// Duration assumed when the current artifact cannot be probed.
pub const FALLBACK_DURATION_SECS: f64 = 60.0;

const MUSIC_FADE_SECS: f64 = 2.0;
const TARGET_LUFS: f64 = -14.0;
const PEAK_LIMIT: f64 = -1.0;

/// Merges narration audio onto the video.
pub struct NarrationMerge {
    pub narration: SourceDescriptor,
}

#[async_trait]
impl PipelineStage for NarrationMerge {
    fn name(&self) -> String {
        "merge_tts".to_string()
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::Mandatory
    }

    async fn run(&self, ctx: &StageContext<'_>, current: &Artifact) -> Result<Artifact, JobError> {
        let audio = ctx
            .resolver
            .resolve(
                &self.narration,
                ctx.area.artifact("tts_audio.mp3", ArtifactRole::InputAudio),
            )
            .await?;
        let mut step = steps::merge(
            current,
            &audio,
            None,
            ctx.area.intermediate(2, "merged"),
            ctx.timeout,
        )?;
        step.name = self.name();
        Ok(ctx.engine.execute(&step).await?.output)
    }
}

/// Lays looped background music under the current audio.
pub struct BackgroundMusic {
    pub music: SourceDescriptor,
    pub volume: f64,
}

#[async_trait]
impl PipelineStage for BackgroundMusic {
    fn name(&self) -> String {
        "add_music".to_string()
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::BestEffort
    }

    async fn run(&self, ctx: &StageContext<'_>, current: &Artifact) -> Result<Artifact, JobError> {
        let music = ctx
            .resolver
            .resolve(
                &self.music,
                ctx.area.artifact("music.mp3", ArtifactRole::InputMusic),
            )
            .await?;

        let video_duration = match ctx.engine.probe(&current.path).await {
            Ok(probe) => probe.duration_secs.unwrap_or(FALLBACK_DURATION_SECS),
            Err(e) => {
                warn!(job_id = %ctx.area.id(), error = %e, "Probe failed, assuming {}s", FALLBACK_DURATION_SECS);
                FALLBACK_DURATION_SECS
            }
        };
        debug!(job_id = %ctx.area.id(), video_duration, "Mixing background music");

        let step = steps::add_music(
            current,
            &music,
            MusicMix {
                voice_volume: 1.0,
                music_volume: self.volume,
                looped: true,
                fade_out: MUSIC_FADE_SECS,
                video_duration,
            },
            ctx.area.intermediate(3, "with_music"),
            ctx.timeout,
        )?;
        Ok(ctx.engine.execute(&step).await?.output)
    }
}

/// Burns SRT subtitles into the picture with the default style.
pub struct BurnSubtitles {
    pub srt: String,
}

#[async_trait]
impl PipelineStage for BurnSubtitles {
    fn name(&self) -> String {
        "add_subtitles".to_string()
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::BestEffort
    }

    async fn run(&self, ctx: &StageContext<'_>, current: &Artifact) -> Result<Artifact, JobError> {
        let srt = ctx
            .resolver
            .write_text(
                &self.srt,
                ctx.area.artifact("subtitles.srt", ArtifactRole::InputSubtitles),
            )
            .await?;
        let step = steps::burn_subtitles(
            current,
            &srt,
            &SubtitleStyle::default(),
            ctx.area.intermediate(4, "subtitled"),
            ctx.timeout,
        );
        Ok(ctx.engine.execute(&step).await?.output)
    }
}

/// Letterboxes the video into a platform frame.
pub struct PlatformResize {
    pub preset: PlatformPreset,
}

#[async_trait]
impl PipelineStage for PlatformResize {
    fn name(&self) -> String {
        format!("resize_{}", self.preset)
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::BestEffort
    }

    async fn run(&self, ctx: &StageContext<'_>, current: &Artifact) -> Result<Artifact, JobError> {
        let mut step = steps::resize(
            current,
            self.preset.dimensions(),
            FitMode::Contain,
            &FillColor::black(),
            ctx.area.intermediate(5, "resized"),
            ctx.timeout,
        );
        step.name = self.name();
        Ok(ctx.engine.execute(&step).await?.output)
    }
}

/// Loudness normalisation to -14 LUFS.
pub struct NormalizeLoudness;

#[async_trait]
impl PipelineStage for NormalizeLoudness {
    fn name(&self) -> String {
        "normalize_audio".to_string()
    }

    fn policy(&self) -> StepPolicy {
        StepPolicy::BestEffort
    }

    async fn run(&self, ctx: &StageContext<'_>, current: &Artifact) -> Result<Artifact, JobError> {
        let step = steps::normalize(
            current,
            TARGET_LUFS,
            PEAK_LIMIT,
            ctx.area.intermediate(6, "normalized"),
            ctx.timeout,
        )?;
        Ok(ctx.engine.execute(&step).await?.output)
    }
}
