//! FFmpeg-based engine implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use super::config::EngineConfig;
use super::error::EngineError;
use super::traits::MediaEngine;
use super::types::{MediaProbe, StepReport, TransformStep};
use crate::metrics::ENGINE_DURATION;

/// Captured result of one process run.
struct ProcessOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// FFmpeg-based engine implementation.
pub struct FfmpegEngine {
    config: EngineConfig,
    permits: Arc<Semaphore>,
}

impl FfmpegEngine {
    /// Creates a new engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_invocations.max(1)));
        Self { config, permits }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Spawns `program`, waits up to `limit`, and kills it on timeout.
    async fn run_process(
        &self,
        program: &Path,
        args: &[String],
        limit: Duration,
    ) -> Result<ProcessOutput, EngineError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| EngineError::failed(None, "engine is shutting down"))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::BinaryNotFound {
                        path: program.to_path_buf(),
                    }
                } else {
                    EngineError::Io(e)
                }
            })?;

        // Drain both pipes concurrently so a chatty process never blocks on a full pipe
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stdout {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            buf
        });

        let waited = timeout(limit, child.wait()).await;
        match waited {
            Ok(Ok(status)) => Ok(ProcessOutput {
                status,
                stdout: stdout_task.await.unwrap_or_default(),
                stderr: stderr_task.await.unwrap_or_default(),
            }),
            Ok(Err(e)) => Err(EngineError::Io(e)),
            Err(_) => {
                // Kill the process on timeout
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                Err(EngineError::Timeout {
                    timeout_secs: limit.as_secs_f64(),
                })
            }
        }
    }

    async fn run_step(&self, step: &TransformStep) -> Result<StepReport, EngineError> {
        let start = Instant::now();

        for input in &step.inputs {
            if !input.path.exists() {
                return Err(EngineError::InputNotFound {
                    path: input.path.clone(),
                });
            }
        }

        let args = step.to_args(&self.config.log_level);
        debug!(step = %step.name, args = ?args, "Running ffmpeg");

        let output = self
            .run_process(&self.config.ffmpeg_path, &args, step.timeout)
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::failed(
                output.status.code(),
                tail_chars(stderr.trim(), self.config.diagnostics_tail_chars),
            ));
        }

        let size = tokio::fs::metadata(&step.output.path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if size == 0 {
            return Err(EngineError::EmptyOutput {
                path: step.output.path.clone(),
            });
        }

        Ok(StepReport {
            step: step.name.clone(),
            output: step.output.clone(),
            output_size_bytes: size,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Parses ffprobe JSON output into a MediaProbe.
    fn parse_probe_output(output: &str) -> Result<MediaProbe, EngineError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            sample_rate: Option<String>,
            channels: Option<u8>,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
        }

        let raw: serde_json::Value =
            serde_json::from_str(output).map_err(|e| EngineError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;
        let probe: ProbeOutput =
            serde_json::from_value(raw.clone()).map_err(|e| EngineError::ParseError {
                reason: format!("Unexpected ffprobe output: {}", e),
            })?;

        let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");
        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaProbe {
            duration_secs: probe
                .format
                .duration
                .as_ref()
                .and_then(|d| d.parse::<f64>().ok()),
            format: format_name.to_string(),
            size_bytes: probe
                .format
                .size
                .as_ref()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0),
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
            audio_sample_rate: audio_stream
                .and_then(|s| s.sample_rate.as_ref())
                .and_then(|r| r.parse::<u32>().ok()),
            audio_channels: audio_stream.and_then(|s| s.channels),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
            video_fps: video_stream
                .and_then(|s| s.r_frame_rate.as_deref())
                .and_then(parse_frame_rate),
            raw,
        })
    }
}

/// Parses a frame rate like "24000/1001" or "30".
fn parse_frame_rate(rate: &str) -> Option<f32> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f32>().ok()?;
            let den = den.parse::<f32>().ok()?;
            (den > 0.0).then(|| num / den)
        }
        None => rate.parse::<f32>().ok(),
    }
}

/// Last `max` characters of `text`, cut on a char boundary.
fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    text.chars().skip(count - max).collect()
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaProbe, EngineError> {
        if !path.exists() {
            return Err(EngineError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            path.to_string_lossy().to_string(),
        ];
        let limit = Duration::from_secs(self.config.probe_timeout_secs);
        let output = self
            .run_process(&self.config.ffprobe_path, &args, limit)
            .await?;

        if !output.status.success() {
            return Err(EngineError::probe_failed(format!(
                "ffprobe exited with {:?}: {}",
                output.status.code(),
                tail_chars(
                    String::from_utf8_lossy(&output.stderr).trim(),
                    self.config.diagnostics_tail_chars
                )
            )));
        }

        Self::parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn execute(&self, step: &TransformStep) -> Result<StepReport, EngineError> {
        let start = Instant::now();
        let result = self.run_step(step).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(report) => {
                ENGINE_DURATION
                    .with_label_values(&[&step.name, "success"])
                    .observe(elapsed);
                debug!(
                    step = %step.name,
                    output = %report.output.name,
                    bytes = report.output_size_bytes,
                    duration_ms = report.duration_ms,
                    "Step completed"
                );
            }
            Err(e) => {
                let label = if e.is_timeout() { "timeout" } else { "failed" };
                ENGINE_DURATION
                    .with_label_values(&[&step.name, label])
                    .observe(elapsed);
                warn!(step = %step.name, error = %e, "Step failed");
                // A failed step leaves no output behind
                let _ = tokio::fs::remove_file(&step.output.path).await;
            }
        }

        result
    }

    async fn validate(&self) -> Result<(), EngineError> {
        let limit = Duration::from_secs(self.config.probe_timeout_secs);
        let version = vec!["-version".to_string()];
        for program in [&self.config.ffmpeg_path, &self.config.ffprobe_path] {
            let output = self.run_process(program, &version, limit).await?;
            if !output.status.success() {
                return Err(EngineError::failed(
                    output.status.code(),
                    format!("{} -version failed", program.display()),
                ));
            }
        }
        Ok(())
    }

    async fn version(&self) -> Result<String, EngineError> {
        let limit = Duration::from_secs(self.config.probe_timeout_secs);
        let output = self
            .run_process(&self.config.ffmpeg_path, &["-version".to_string()], limit)
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or("unknown").trim().to_string())
    }
}
