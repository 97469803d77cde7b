//! The media service: one method per operation.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::requests::{
    ConcatRequest, ExtractAudioRequest, MergeRequest, MusicRequest, NormalizeRequest,
    ResizeRequest, SubtitleMode, SubtitleRequest, SubtitleSource, ThumbnailRequest, TrimRequest,
};
use super::steps::{self, MusicMix};
use super::types::{Operation, OperationOutput};
use crate::config::Config;
use crate::engine::{MediaEngine, MediaProbe, StepTimeouts, TransformStep};
use crate::error::JobError;
use crate::filter::{concat_list, Transition};
use crate::job::{Artifact, ArtifactRole, JobRegistry, StagingArea};
use crate::metrics::OPERATIONS_TOTAL;
use crate::pipeline::{PipelineFailure, PipelineRequest, PipelineSpec, Sequencer, StageContext};
use crate::source::{Fetcher, SourceDescriptor, SourceResolver};

/// Entry point for every job the service runs.
///
/// Requests are validated before a staging area is created. Each call gets
/// its own job directory, which stays in place until it is cleaned up.
#[derive(Clone)]
pub struct MediaService {
    registry: JobRegistry,
    resolver: SourceResolver,
    engine: Arc<dyn MediaEngine>,
    timeouts: StepTimeouts,
}

impl MediaService {
    pub fn new(config: &Config, engine: Arc<dyn MediaEngine>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            registry: JobRegistry::new(&config.staging),
            resolver: SourceResolver::new(fetcher, &config.upstream),
            engine,
            timeouts: config.engine.timeouts(),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &Arc<dyn MediaEngine> {
        &self.engine
    }

    pub fn upstream_base(&self) -> &str {
        self.resolver.upstream_base()
    }

    pub async fn merge(&self, request: MergeRequest) -> Result<OperationOutput, JobError> {
        let result: Result<OperationOutput, JobError> = async {
            request.validate()?;
            let area = self.registry.create().await?;
            let video = self.fetch_video(&area, &request.video).await?;
            let audio = self
                .resolver
                .resolve(
                    &request.audio,
                    area.artifact("input_audio.mp3", ArtifactRole::InputAudio),
                )
                .await?;
            let step = steps::merge(
                &video,
                &audio,
                Some(request.volume),
                area.result(Operation::Merge.result_prefix(), "mp4"),
                self.timeouts.encode,
            )?;
            self.finish(&area, Operation::Merge, &step).await
        }
        .await;
        record(Operation::Merge, result)
    }

    pub async fn concat(&self, request: ConcatRequest) -> Result<OperationOutput, JobError> {
        let result: Result<OperationOutput, JobError> = async {
            request.validate()?;
            let area = self.registry.create().await?;

            let mut clips = Vec::with_capacity(request.clips.len());
            for (i, source) in request.clips.iter().enumerate() {
                let slot = area.artifact(format!("input_{}.mp4", i), ArtifactRole::Clip(i));
                let clip = self.resolver.resolve(source, slot).await.map_err(|e| match e {
                    JobError::SourceUnavailable { reason } => JobError::source_unavailable(
                        format!("video at index {}: {}", i, reason),
                    ),
                    other => other,
                })?;
                clips.push(clip);
            }

            let output = area.result(Operation::Concat.result_prefix(), "mp4");
            let step = match request.transition {
                Transition::None => {
                    let list = area.artifact("inputs.txt", ArtifactRole::Intermediate(0));
                    let paths: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();
                    area.write(&list, concat_list(&paths).as_bytes()).await?;
                    steps::concat_copy(&list, output, self.timeouts.long)
                }
                transition => {
                    let durations = self.clip_durations(&clips).await;
                    steps::concat_crossfade(
                        &clips,
                        transition,
                        request.transition_duration,
                        &durations,
                        output,
                        self.timeouts.long,
                    )?
                }
            };
            Ok(self
                .finish(&area, Operation::Concat, &step)
                .await?
                .detail("video_count", clips.len())
                .detail("transition", request.transition.as_str()))
        }
        .await;
        record(Operation::Concat, result)
    }

    pub async fn add_subtitles(&self, request: SubtitleRequest) -> Result<OperationOutput, JobError> {
        let result: Result<OperationOutput, JobError> = async {
            request.validate()?;
            let area = self.registry.create().await?;
            let video = self.fetch_video(&area, &request.video).await?;
            let slot = area.artifact("subtitles.srt", ArtifactRole::InputSubtitles);
            let srt = match &request.subtitles {
                SubtitleSource::Text(text) => self.resolver.write_text(text, slot).await?,
                SubtitleSource::Remote(source) => self.resolver.resolve(source, slot).await?,
            };

            let output = area.result(Operation::AddSubtitles.result_prefix(), "mp4");
            let step = match request.mode {
                SubtitleMode::Hardcoded => steps::burn_subtitles(
                    &video,
                    &srt,
                    &request.style,
                    output,
                    self.timeouts.encode,
                ),
                SubtitleMode::Soft => steps::mux_subtitles(&video, &srt, output, self.timeouts.encode),
            };
            Ok(self
                .finish(&area, Operation::AddSubtitles, &step)
                .await?
                .detail("style", request.mode.as_str()))
        }
        .await;
        record(Operation::AddSubtitles, result)
    }

    pub async fn add_background_music(
        &self,
        request: MusicRequest,
    ) -> Result<OperationOutput, JobError> {
        let result: Result<OperationOutput, JobError> = async {
            request.validate()?;
            let area = self.registry.create().await?;
            let video = self.fetch_video(&area, &request.video).await?;
            let music = self
                .resolver
                .resolve(
                    &request.music,
                    area.artifact("music.mp3", ArtifactRole::InputMusic),
                )
                .await?;
            let video_duration = self.duration_or_fallback(&area, &video).await;

            let step = steps::add_music(
                &video,
                &music,
                MusicMix {
                    voice_volume: request.voice_volume,
                    music_volume: request.music_volume,
                    looped: request.loop_music,
                    fade_out: request.fade_out,
                    video_duration,
                },
                area.result(Operation::AddBackgroundMusic.result_prefix(), "mp4"),
                self.timeouts.encode,
            )?;
            self.finish(&area, Operation::AddBackgroundMusic, &step).await
        }
        .await;
        record(Operation::AddBackgroundMusic, result)
    }

    pub async fn resize(&self, request: ResizeRequest) -> Result<OperationOutput, JobError> {
        let result: Result<OperationOutput, JobError> = async {
            let area = self.registry.create().await?;
            let video = self.fetch_video(&area, &request.video).await?;
            let target = request.target();
            let step = steps::resize(
                &video,
                target,
                request.fit,
                &request.fill,
                area.result(Operation::Resize.result_prefix(), "mp4"),
                self.timeouts.encode,
            );
            let mut output = self
                .finish(&area, Operation::Resize, &step)
                .await?
                .detail("dimensions", target.to_string())
                .detail("fit", request.fit.as_str());
            if let Some(preset) = request.preset {
                output = output.detail("preset", preset.name());
            }
            Ok(output)
        }
        .await;
        record(Operation::Resize, result)
    }

    pub async fn extract_audio(
        &self,
        request: ExtractAudioRequest,
    ) -> Result<OperationOutput, JobError> {
        let result: Result<OperationOutput, JobError> = async {
            let area = self.registry.create().await?;
            let video = self.fetch_video(&area, &request.video).await?;
            let step = steps::extract_audio(
                &video,
                request.format,
                area.result(
                    Operation::ExtractAudio.result_prefix(),
                    request.format.extension(),
                ),
                self.timeouts.encode,
            );
            Ok(self
                .finish(&area, Operation::ExtractAudio, &step)
                .await?
                .detail("format", request.format.extension()))
        }
        .await;
        record(Operation::ExtractAudio, result)
    }

    pub async fn thumbnail(&self, request: ThumbnailRequest) -> Result<OperationOutput, JobError> {
        let result: Result<OperationOutput, JobError> = async {
            request.validate()?;
            let area = self.registry.create().await?;
            let video = self.fetch_video(&area, &request.video).await?;
            let step = steps::thumbnail(
                &video,
                request.timestamp,
                request.size,
                area.result(Operation::Thumbnail.result_prefix(), "jpg"),
                self.timeouts.probe,
            );
            Ok(self
                .finish(&area, Operation::Thumbnail, &step)
                .await?
                .detail("timestamp", request.timestamp)
                .detail("dimensions", request.size.to_string()))
        }
        .await;
        record(Operation::Thumbnail, result)
    }

    pub async fn trim(&self, request: TrimRequest) -> Result<OperationOutput, JobError> {
        let result: Result<OperationOutput, JobError> = async {
            let area = self.registry.create().await?;
            let video = self.fetch_video(&area, &request.video).await?;
            let step = steps::trim(
                &video,
                request.range,
                area.result(Operation::Trim.result_prefix(), "mp4"),
                self.timeouts.encode,
            );
            let mut output = self
                .finish(&area, Operation::Trim, &step)
                .await?
                .detail("start", request.range.start);
            if let Some(duration) = request.range.duration {
                output = output.detail("duration", duration);
            }
            Ok(output)
        }
        .await;
        record(Operation::Trim, result)
    }

    pub async fn normalize_audio(
        &self,
        request: NormalizeRequest,
    ) -> Result<OperationOutput, JobError> {
        let result: Result<OperationOutput, JobError> = async {
            request.validate()?;
            let area = self.registry.create().await?;
            let video = self.fetch_video(&area, &request.video).await?;
            let step = steps::normalize(
                &video,
                request.target_lufs,
                request.peak_limit,
                area.result(Operation::NormalizeAudio.result_prefix(), "mp4"),
                self.timeouts.encode,
            )?;
            Ok(self
                .finish(&area, Operation::NormalizeAudio, &step)
                .await?
                .detail("target_lufs", request.target_lufs))
        }
        .await;
        record(Operation::NormalizeAudio, result)
    }

    /// Runs the full pipeline.
    ///
    /// Aborted runs report the stage that failed and the stages that had
    /// already completed.
    pub async fn full_pipeline(
        &self,
        request: PipelineRequest,
    ) -> Result<OperationOutput, PipelineFailure> {
        let result: Result<OperationOutput, PipelineFailure> = async {
            request.validate()?;
            let area = self.registry.create().await?;
            let spec = PipelineSpec::from_request(&request);
            info!(job_id = %area.id(), stages = ?spec.stage_names(), "Starting pipeline");

            let sequencer = Sequencer::new(StageContext {
                area: &area,
                resolver: &self.resolver,
                engine: self.engine.as_ref(),
                timeout: self.timeouts.long,
            });
            let outcome = sequencer.run(spec).await?;

            let file_size = area
                .size_of(&outcome.final_artifact)
                .await
                .map_err(|e| PipelineFailure::at("finalize", outcome.steps_completed.clone(), e))?;
            let mut output = OperationOutput::new(
                area.id().clone(),
                Operation::FullPipeline,
                outcome.final_artifact,
                file_size,
            )
            .detail("steps_completed", outcome.steps_completed)
            .detail(
                "steps_skipped",
                serde_json::to_value(&outcome.steps_skipped).unwrap_or_default(),
            );
            if let Some(platform) = request.platform {
                output = output.detail("platform", platform.name());
            }
            Ok(output)
        }
        .await;

        match &result {
            Ok(output) => record_outcome(Operation::FullPipeline, Ok(output)),
            Err(failure) => record_outcome(Operation::FullPipeline, Err(&failure.error)),
        }
        result
    }

    /// Downloads a file, probes it and removes the scratch job.
    pub async fn probe(&self, source: SourceDescriptor) -> Result<MediaProbe, JobError> {
        let area = match self.registry.create().await {
            Ok(area) => area,
            Err(e) => {
                OPERATIONS_TOTAL
                    .with_label_values(&[Operation::Probe.as_str(), e.kind().as_str()])
                    .inc();
                return Err(e);
            }
        };
        let result: Result<MediaProbe, JobError> = async {
            let file = self
                .resolver
                .resolve(&source, area.artifact("probe_file", ArtifactRole::InputVideo))
                .await?;
            Ok(self.engine.probe(&file.path).await?)
        }
        .await;

        if let Err(e) = self.registry.dispose(area.id().as_str()).await {
            warn!(job_id = %area.id(), error = %e, "Failed to remove probe staging");
        }

        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.kind().as_str(),
        };
        OPERATIONS_TOTAL
            .with_label_values(&[Operation::Probe.as_str(), label])
            .inc();
        result
    }

    /// Path of an artifact, for download.
    pub async fn artifact_path(&self, job_id: &str, name: &str) -> Result<PathBuf, JobError> {
        self.registry.resolve_artifact(job_id, name).await
    }

    pub async fn cleanup(&self, job_id: &str) -> Result<(), JobError> {
        self.registry.dispose(job_id).await
    }

    /// Removes every job; returns how many were removed.
    pub async fn cleanup_all(&self) -> Result<usize, JobError> {
        self.registry.dispose_all().await
    }

    async fn fetch_video(
        &self,
        area: &StagingArea,
        source: &SourceDescriptor,
    ) -> Result<Artifact, JobError> {
        self.resolver
            .resolve(
                source,
                area.artifact("input_video.mp4", ArtifactRole::InputVideo),
            )
            .await
    }

    /// Runs the final step and describes its output.
    async fn finish(
        &self,
        area: &StagingArea,
        operation: Operation,
        step: &TransformStep,
    ) -> Result<OperationOutput, JobError> {
        let report = self.engine.execute(step).await?;
        Ok(OperationOutput::new(
            area.id().clone(),
            operation,
            report.output,
            report.output_size_bytes,
        ))
    }

    async fn duration_or_fallback(&self, area: &StagingArea, video: &Artifact) -> f64 {
        match self.engine.probe(&video.path).await {
            Ok(probe) => probe
                .duration_secs
                .unwrap_or(crate::pipeline::FALLBACK_DURATION_SECS),
            Err(e) => {
                warn!(job_id = %area.id(), error = %e, "Probe failed, using fallback duration");
                crate::pipeline::FALLBACK_DURATION_SECS
            }
        }
    }

    /// Durations of each clip, or empty when any probe fails.
    async fn clip_durations(&self, clips: &[Artifact]) -> Vec<f64> {
        let mut durations = Vec::with_capacity(clips.len());
        for clip in clips {
            match self.engine.probe(&clip.path).await {
                Ok(MediaProbe {
                    duration_secs: Some(d),
                    ..
                }) => durations.push(d),
                _ => return Vec::new(),
            }
        }
        durations
    }
}

fn record(
    operation: Operation,
    result: Result<OperationOutput, JobError>,
) -> Result<OperationOutput, JobError> {
    record_outcome(operation, result.as_ref());
    result
}

fn record_outcome(operation: Operation, result: Result<&OperationOutput, &JobError>) {
    match result {
        Ok(output) => {
            OPERATIONS_TOTAL
                .with_label_values(&[operation.as_str(), "success"])
                .inc();
            info!(
                job_id = %output.job_id,
                operation = %operation,
                artifact = %output.artifact.name,
                file_size = output.file_size,
                "Operation completed"
            );
        }
        Err(e) => {
            OPERATIONS_TOTAL
                .with_label_values(&[operation.as_str(), e.kind().as_str()])
                .inc();
            warn!(operation = %operation, error = %e, "Operation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StagingConfig;
    use crate::filter::{Dimensions, FillColor, FitMode, SubtitleStyle};
    use crate::operations::requests::TrimRange;
    use crate::testing::{fixtures, MockEngine, MockFetcher};
    use tempfile::TempDir;

    const VIDEO_URL: &str = "http://renderer:8000/video/abc123";

    struct Harness {
        _tmp: TempDir,
        engine: Arc<MockEngine>,
        fetcher: Arc<MockFetcher>,
        service: MediaService,
    }

    async fn harness() -> Harness {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.staging = StagingConfig {
            root: tmp.path().join("staging"),
        };
        config.upstream.base_url = "http://renderer:8000".to_string();

        let engine = Arc::new(MockEngine::new());
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.serve(VIDEO_URL, b"video".to_vec()).await;
        let service = MediaService::new(&config, engine.clone(), fetcher.clone());
        Harness {
            _tmp: tmp,
            engine,
            fetcher,
            service,
        }
    }

    fn upstream() -> SourceDescriptor {
        SourceDescriptor::UpstreamJob("abc123".to_string())
    }

    #[tokio::test]
    async fn test_merge_produces_named_result() {
        let h = harness().await;
        let output = h
            .service
            .merge(MergeRequest {
                video: upstream(),
                audio: SourceDescriptor::Inline(fixtures::INLINE_AUDIO.to_string()),
                volume: 1.0,
            })
            .await
            .unwrap();

        assert_eq!(output.operation, Operation::Merge);
        assert_eq!(output.artifact.name, format!("merged_{}.mp4", output.job_id));
        assert_eq!(output.file_size, 17);
        assert!(output.artifact.path.exists());
        assert_eq!(h.engine.step_names().await, vec!["merge_audio"]);
    }

    #[tokio::test]
    async fn test_invalid_request_creates_no_job() {
        let h = harness().await;
        let err = h
            .service
            .merge(MergeRequest {
                video: upstream(),
                audio: SourceDescriptor::Inline(fixtures::INLINE_AUDIO.to_string()),
                volume: -2.0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidParameters(_)));
        assert!(!h.service.registry().root().exists());
        assert!(h.fetcher.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_concat_without_transition_writes_list() {
        let h = harness().await;
        h.fetcher.serve("http://cdn/b.mp4", b"b".to_vec()).await;
        let output = h
            .service
            .concat(ConcatRequest {
                clips: vec![
                    upstream(),
                    SourceDescriptor::RemoteUrl("http://cdn/b.mp4".to_string()),
                ],
                transition: Transition::None,
                transition_duration: 0.5,
            })
            .await
            .unwrap();

        let list = output.artifact.path.with_file_name("inputs.txt");
        let body = std::fs::read_to_string(list).unwrap();
        assert_eq!(body.lines().count(), 2);
        assert!(body.contains("input_0.mp4"));
        assert_eq!(h.engine.step_names().await, vec!["concat"]);
        assert_eq!(output.details["video_count"], 2);
    }

    #[tokio::test]
    async fn test_concat_reports_failing_clip_index() {
        let h = harness().await;
        let err = h
            .service
            .concat(ConcatRequest {
                clips: vec![
                    upstream(),
                    SourceDescriptor::RemoteUrl("http://cdn/missing.mp4".to_string()),
                ],
                transition: Transition::Fade,
                transition_duration: 0.5,
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("index 1"));
        assert!(h.engine.step_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_concat_crossfade_uses_probed_durations() {
        let h = harness().await;
        h.fetcher.serve("http://cdn/b.mp4", b"b".to_vec()).await;
        h.fetcher.serve("http://cdn/c.mp4", b"c".to_vec()).await;
        h.service
            .concat(ConcatRequest {
                clips: vec![
                    upstream(),
                    SourceDescriptor::RemoteUrl("http://cdn/b.mp4".to_string()),
                    SourceDescriptor::RemoteUrl("http://cdn/c.mp4".to_string()),
                ],
                transition: Transition::Fade,
                transition_duration: 1.0,
            })
            .await
            .unwrap();

        let step = h.engine.find_step("concat_crossfade").await.unwrap();
        let rendered = step.filter.unwrap().render();
        // Mock clips last 30s each
        assert!(rendered.contains("[v0][v1]xfade=transition=fade:duration=1:offset=0[x0]"));
        assert!(rendered.contains("[x0][v2]xfade=transition=fade:duration=1:offset=29[vout]"));
    }

    #[tokio::test]
    async fn test_soft_subtitles_skip_reencode() {
        let h = harness().await;
        let output = h
            .service
            .add_subtitles(SubtitleRequest {
                video: upstream(),
                subtitles: SubtitleSource::Text(fixtures::SRT.to_string()),
                mode: SubtitleMode::Soft,
                style: SubtitleStyle::default(),
            })
            .await
            .unwrap();
        assert_eq!(output.details["style"], "soft");
        let step = h.engine.find_step("mux_subtitles").await.unwrap();
        assert_eq!(step.output_option("-c:s"), Some("mov_text"));
    }

    #[tokio::test]
    async fn test_music_falls_back_when_probe_fails() {
        let h = harness().await;
        h.engine.fail_probes("moov atom not found").await;
        h.service
            .add_background_music(MusicRequest {
                video: upstream(),
                music: SourceDescriptor::Inline(fixtures::INLINE_AUDIO.to_string()),
                music_volume: 0.15,
                voice_volume: 1.0,
                loop_music: true,
                fade_out: 2.0,
            })
            .await
            .unwrap();

        let step = h.engine.find_step("add_music").await.unwrap();
        assert!(step.filter.unwrap().render().contains("afade=t=out:st=58:d=2"));
    }

    #[tokio::test]
    async fn test_resize_stretch_scenario() {
        let h = harness().await;
        let output = h
            .service
            .resize(ResizeRequest {
                video: upstream(),
                preset: None,
                dimensions: Dimensions::new(640, 360).unwrap(),
                fit: FitMode::Stretch,
                fill: FillColor::black(),
            })
            .await
            .unwrap();
        assert_eq!(output.details["dimensions"], "640x360");

        let plan = FitMode::Stretch.plan(
            Dimensions::new(1920, 1080).unwrap(),
            Dimensions::new(640, 360).unwrap(),
        );
        assert_eq!(plan.output, Dimensions::new(640, 360).unwrap());
    }

    #[tokio::test]
    async fn test_extract_audio_extension_follows_format() {
        let h = harness().await;
        let output = h
            .service
            .extract_audio(ExtractAudioRequest {
                video: upstream(),
                format: crate::engine::AudioFormat::Wav,
            })
            .await
            .unwrap();
        assert!(output.artifact.name.ends_with(".wav"));
        assert_eq!(output.details["format"], "wav");
    }

    #[tokio::test]
    async fn test_thumbnail_uses_probe_timeout() {
        let h = harness().await;
        h.service
            .thumbnail(ThumbnailRequest {
                video: upstream(),
                timestamp: 5.0,
                size: Dimensions::new(1280, 720).unwrap(),
            })
            .await
            .unwrap();
        let step = h.engine.find_step("thumbnail").await.unwrap();
        assert_eq!(step.timeout, StepTimeouts::default().probe);
    }

    #[tokio::test]
    async fn test_trim_scenario_duration() {
        let h = harness().await;
        let output = h
            .service
            .trim(TrimRequest {
                video: upstream(),
                range: TrimRange::from_bounds(10.0, Some(40.0), None).unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(output.details["duration"], 30.0);
    }

    #[tokio::test]
    async fn test_engine_failure_surfaces_diagnostics() {
        let h = harness().await;
        h.engine
            .fail_step("normalize_audio", "Invalid data found when processing input")
            .await;
        let err = h
            .service
            .normalize_audio(NormalizeRequest {
                video: upstream(),
                target_lufs: -14.0,
                peak_limit: -1.0,
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.diagnostics(),
            Some("Invalid data found when processing input")
        );
    }

    #[tokio::test]
    async fn test_probe_removes_staging() {
        let h = harness().await;
        let probe = h.service.probe(upstream()).await.unwrap();
        assert_eq!(probe.duration_secs, Some(30.0));
        assert_eq!(h.service.cleanup_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_unknown_job() {
        let h = harness().await;
        assert!(matches!(
            h.service.cleanup("deadbeef").await,
            Err(JobError::NotFound(_))
        ));
    }
}
