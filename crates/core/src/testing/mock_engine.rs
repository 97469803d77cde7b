//! Mock media engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::engine::{EngineError, MediaEngine, MediaProbe, StepReport, TransformStep};

/// A recorded step for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedStep {
    /// The step that was submitted.
    pub step: TransformStep,
    /// Whether the step succeeded.
    pub success: bool,
}

/// Mock implementation of the MediaEngine trait.
///
/// Provides controllable behavior for testing:
/// - Track executed steps for assertions
/// - Fail steps by name (persistently) or the next call (once)
/// - Control probe results
/// - Write a small fake output for each successful step
///
/// # Example
///
/// ```rust,ignore
/// use clipforge_core::testing::MockEngine;
///
/// let engine = MockEngine::new();
/// engine.fail_step("add_music", "Invalid data found when processing input").await;
///
/// // ... run a pipeline ...
///
/// let names = engine.step_names().await;
/// assert!(names.contains(&"add_music".to_string()));
/// ```
#[derive(Debug)]
pub struct MockEngine {
    /// Recorded steps.
    steps: Arc<RwLock<Vec<RecordedStep>>>,
    /// Steps that always fail, with their stderr.
    failing_steps: Arc<RwLock<HashMap<String, String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<EngineError>>>,
    /// Pre-configured probe results by path.
    probe_results: Arc<RwLock<HashMap<PathBuf, MediaProbe>>>,
    /// When set, every probe fails with this reason.
    probe_failure: Arc<RwLock<Option<String>>>,
    /// Bytes written as the output of every successful step.
    output_bytes: Arc<RwLock<Vec<u8>>>,
    /// Simulated step duration.
    step_delay: Arc<RwLock<Duration>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a new mock engine.
    pub fn new() -> Self {
        Self {
            steps: Arc::new(RwLock::new(Vec::new())),
            failing_steps: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            probe_failure: Arc::new(RwLock::new(None)),
            output_bytes: Arc::new(RwLock::new(b"mock-media-output".to_vec())),
            step_delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Get all recorded steps.
    pub async fn recorded_steps(&self) -> Vec<RecordedStep> {
        self.steps.read().await.clone()
    }

    /// Names of the recorded steps, in execution order.
    pub async fn step_names(&self) -> Vec<String> {
        self.steps
            .read()
            .await
            .iter()
            .map(|r| r.step.name.clone())
            .collect()
    }

    /// The most recent recorded step with the given name.
    pub async fn find_step(&self, name: &str) -> Option<TransformStep> {
        self.steps
            .read()
            .await
            .iter()
            .rev()
            .find(|r| r.step.name == name)
            .map(|r| r.step.clone())
    }

    /// Make every step with this name fail with a non-zero exit.
    pub async fn fail_step(&self, name: &str, diagnostics: &str) {
        self.failing_steps
            .write()
            .await
            .insert(name.to_string(), diagnostics.to_string());
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: EngineError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set a probe result for a specific path.
    pub async fn set_probe_result(&self, path: impl AsRef<Path>, probe: MediaProbe) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), probe);
    }

    /// Make every probe fail.
    pub async fn fail_probes(&self, reason: &str) {
        *self.probe_failure.write().await = Some(reason.to_string());
    }

    /// Set the bytes written for each successful step.
    pub async fn set_output_bytes(&self, bytes: Vec<u8>) {
        *self.output_bytes.write().await = bytes;
    }

    /// Set the simulated step duration.
    pub async fn set_step_delay(&self, delay: Duration) {
        *self.step_delay.write().await = delay;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<EngineError> {
        self.next_error.write().await.take()
    }

    /// Default probe for files without a configured result.
    fn default_probe(path: &Path) -> MediaProbe {
        let is_audio = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("mp3" | "aac" | "wav")
        );
        MediaProbe {
            duration_secs: Some(30.0),
            format: if is_audio { "mp3" } else { "mov" }.to_string(),
            size_bytes: 1024 * 1024,
            audio_codec: Some("aac".to_string()),
            audio_sample_rate: Some(48000),
            audio_channels: Some(2),
            video_codec: (!is_audio).then(|| "h264".to_string()),
            video_width: (!is_audio).then_some(1920),
            video_height: (!is_audio).then_some(1080),
            video_fps: (!is_audio).then_some(30.0),
            raw: serde_json::json!({ "format": { "filename": path.display().to_string() } }),
        }
    }

    async fn record(&self, step: &TransformStep, success: bool) {
        self.steps.write().await.push(RecordedStep {
            step: step.clone(),
            success,
        });
    }
}

#[async_trait]
impl MediaEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaProbe, EngineError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        if let Some(reason) = self.probe_failure.read().await.as_ref() {
            return Err(EngineError::probe_failed(reason.clone()));
        }
        if !path.exists() {
            return Err(EngineError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        // Check for pre-configured result
        if let Some(probe) = self.probe_results.read().await.get(path) {
            return Ok(probe.clone());
        }

        Ok(Self::default_probe(path))
    }

    async fn execute(&self, step: &TransformStep) -> Result<StepReport, EngineError> {
        if let Some(err) = self.take_error().await {
            self.record(step, false).await;
            return Err(err);
        }

        if let Some(diagnostics) = self.failing_steps.read().await.get(&step.name) {
            self.record(step, false).await;
            return Err(EngineError::failed(Some(1), diagnostics.clone()));
        }

        for input in &step.inputs {
            if !input.path.exists() {
                self.record(step, false).await;
                return Err(EngineError::InputNotFound {
                    path: input.path.clone(),
                });
            }
        }

        let delay = *self.step_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let bytes = self.output_bytes.read().await.clone();
        tokio::fs::write(&step.output.path, &bytes).await?;
        self.record(step, true).await;

        Ok(StepReport {
            step: step.name.clone(),
            output: step.output.clone(),
            output_size_bytes: bytes.len() as u64,
            duration_ms: delay.as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), EngineError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(())
    }

    async fn version(&self) -> Result<String, EngineError> {
        Ok("ffmpeg version mock".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StepInput;
    use crate::job::{Artifact, ArtifactRole};
    use tempfile::TempDir;

    fn step(tmp: &TempDir, name: &str) -> TransformStep {
        let input = tmp.path().join("in.mp4");
        std::fs::write(&input, b"x").unwrap();
        TransformStep::new(
            name,
            Artifact {
                name: format!("{}.mp4", name),
                path: tmp.path().join(format!("{}.mp4", name)),
                role: ArtifactRole::Final,
            },
            Duration::from_secs(1),
        )
        .input(StepInput::file(input))
    }

    #[tokio::test]
    async fn test_execute_writes_output_and_records() {
        let tmp = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let s = step(&tmp, "resize");

        let report = engine.execute(&s).await.unwrap();
        assert!(s.output.path.exists());
        assert_eq!(report.output_size_bytes, 17);

        let recorded = engine.recorded_steps().await;
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].success);
    }

    #[tokio::test]
    async fn test_failing_step_by_name() {
        let tmp = TempDir::new().unwrap();
        let engine = MockEngine::new();
        engine.fail_step("add_music", "Invalid data").await;

        let err = engine.execute(&step(&tmp, "add_music")).await.unwrap_err();
        assert_eq!(err.diagnostics(), Some("Invalid data"));
        assert!(engine.execute(&step(&tmp, "resize")).await.is_ok());
        assert_eq!(engine.step_names().await, vec!["add_music", "resize"]);
    }

    #[tokio::test]
    async fn test_error_injection_is_consumed() {
        let tmp = TempDir::new().unwrap();
        let engine = MockEngine::new();
        engine
            .set_next_error(EngineError::Timeout { timeout_secs: 1.0 })
            .await;

        assert!(engine.execute(&step(&tmp, "a")).await.is_err());
        assert!(engine.execute(&step(&tmp, "a")).await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_defaults_and_overrides() {
        let tmp = TempDir::new().unwrap();
        let engine = MockEngine::new();
        let video = tmp.path().join("v.mp4");
        std::fs::write(&video, b"x").unwrap();

        let probe = engine.probe(&video).await.unwrap();
        assert_eq!(probe.duration_secs, Some(30.0));
        assert_eq!(probe.video_width, Some(1920));

        engine
            .set_probe_result(
                &video,
                MediaProbe {
                    duration_secs: Some(12.0),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(engine.probe(&video).await.unwrap().duration_secs, Some(12.0));

        engine.fail_probes("corrupt").await;
        assert!(engine.probe(&video).await.is_err());
    }
}
