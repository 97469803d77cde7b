//! Configuration for the media engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the ffmpeg-based engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Timeout for ffprobe and thumbnail extraction, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Timeout for single-step encodes, in seconds.
    #[serde(default = "default_encode_timeout")]
    pub encode_timeout_secs: u64,

    /// Timeout for concatenation and every full-pipeline step, in seconds.
    #[serde(default = "default_long_timeout")]
    pub long_timeout_secs: u64,

    /// How many trailing characters of stderr are kept on failure.
    #[serde(default = "default_tail_chars")]
    pub diagnostics_tail_chars: usize,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on engine processes running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_invocations: usize,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_encode_timeout() -> u64 {
    600
}

fn default_long_timeout() -> u64 {
    900
}

fn default_tail_chars() -> usize {
    1000
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            probe_timeout_secs: default_probe_timeout(),
            encode_timeout_secs: default_encode_timeout(),
            long_timeout_secs: default_long_timeout(),
            diagnostics_tail_chars: default_tail_chars(),
            log_level: default_log_level(),
            max_concurrent_invocations: default_max_concurrent(),
        }
    }
}

impl EngineConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    pub fn timeouts(&self) -> StepTimeouts {
        StepTimeouts {
            probe: Duration::from_secs(self.probe_timeout_secs),
            encode: Duration::from_secs(self.encode_timeout_secs),
            long: Duration::from_secs(self.long_timeout_secs),
        }
    }
}

/// Timeout classes handed to step builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTimeouts {
    pub probe: Duration,
    pub encode: Duration,
    pub long: Duration,
}

impl Default for StepTimeouts {
    fn default() -> Self {
        EngineConfig::default().timeouts()
    }
}
