//! Types for the engine module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::JobError;
use crate::filter::{FilterChain, FilterGraph, PadLabel};
use crate::job::Artifact;

/// Audio output format for extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MPEG Audio Layer III
    #[default]
    Mp3,
    /// Advanced Audio Coding (raw ADTS)
    Aac,
    /// WAVE (uncompressed)
    Wav,
}

impl AudioFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Wav => "wav",
        }
    }

    /// Returns the ffmpeg codec name for this format.
    pub fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::Mp3 => "libmp3lame",
            Self::Aac => "aac",
            Self::Wav => "pcm_s16le",
        }
    }

    /// Whether this format is lossless.
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Wav)
    }
}

impl FromStr for AudioFormat {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "aac" => Ok(Self::Aac),
            "wav" => Ok(Self::Wav),
            other => Err(JobError::invalid(format!(
                "unsupported audio format '{}', expected mp3, aac or wav",
                other
            ))),
        }
    }
}

/// One `-i` input with the options that precede it.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInput {
    pub path: PathBuf,
    /// Pre-input options such as `-ss 5` or `-stream_loop -1`.
    pub options: Vec<String>,
}

impl StepInput {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: Vec::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }
}

/// Filter attached to a step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepFilter {
    /// Single video chain (`-vf`).
    Video(FilterChain),
    /// Single audio chain (`-af`).
    Audio(FilterChain),
    /// Multi-input graph (`-filter_complex`).
    Complex(FilterGraph),
}

impl StepFilter {
    fn flag(&self) -> &'static str {
        match self {
            Self::Video(_) => "-vf",
            Self::Audio(_) => "-af",
            Self::Complex(_) => "-filter_complex",
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Video(chain) | Self::Audio(chain) => chain.render(),
            Self::Complex(graph) => graph.render(),
        }
    }
}

/// A single engine invocation producing exactly one artifact.
#[derive(Debug, Clone)]
pub struct TransformStep {
    /// Step name used in logs and metrics.
    pub name: String,
    pub inputs: Vec<StepInput>,
    pub filter: Option<StepFilter>,
    /// Stream selectors passed with `-map`.
    pub maps: Vec<String>,
    pub output_options: Vec<String>,
    pub output: Artifact,
    pub timeout: Duration,
}

impl TransformStep {
    pub fn new(name: impl Into<String>, output: Artifact, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            filter: None,
            maps: Vec::new(),
            output_options: Vec::new(),
            output,
            timeout,
        }
    }

    pub fn input(mut self, input: StepInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn filter(mut self, filter: StepFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn map(mut self, selector: impl Into<String>) -> Self {
        self.maps.push(selector.into());
        self
    }

    /// Maps a filter graph output pad.
    pub fn map_pad(self, label: &PadLabel) -> Self {
        self.map(label.to_string())
    }

    pub fn output_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_options
            .extend(options.into_iter().map(Into::into));
        self
    }

    /// Value following `flag` in the output options.
    pub fn output_option(&self, flag: &str) -> Option<&str> {
        self.output_options
            .iter()
            .position(|o| o == flag)
            .and_then(|i| self.output_options.get(i + 1))
            .map(String::as_str)
    }

    /// Full ffmpeg argument list.
    pub fn to_args(&self, log_level: &str) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            log_level.to_string(),
        ];

        for input in &self.inputs {
            args.extend(input.options.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().to_string());
        }

        if let Some(filter) = &self.filter {
            args.push(filter.flag().to_string());
            args.push(filter.render());
        }

        for map in &self.maps {
            args.push("-map".to_string());
            args.push(map.clone());
        }

        args.extend(self.output_options.iter().cloned());
        args.push(self.output.path.to_string_lossy().to_string());
        args
    }
}

/// Outcome of a successful step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: String,
    pub output: Artifact,
    pub output_size_bytes: u64,
    pub duration_ms: u64,
}

/// Information about a media file from ffprobe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaProbe {
    /// Duration in seconds, when the container reports one.
    pub duration_secs: Option<f64>,
    /// Container format (e.g., "mov", "matroska").
    pub format: String,
    /// File size in bytes.
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_channels: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_fps: Option<f32>,
    /// The unmodified ffprobe document.
    #[serde(default)]
    pub raw: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filter, FilterChain, StreamRef};
    use crate::job::ArtifactRole;

    fn output() -> Artifact {
        Artifact {
            name: "out.mp4".to_string(),
            path: PathBuf::from("/s/j/out.mp4"),
            role: ArtifactRole::Final,
        }
    }

    #[test]
    fn test_args_order() {
        let aout = PadLabel::new("a");
        let step = TransformStep::new("merge", output(), Duration::from_secs(600))
            .input(StepInput::file("/s/j/video.mp4"))
            .input(StepInput::file("/s/j/audio.mp3").with_options(["-stream_loop", "-1"]))
            .filter(StepFilter::Complex(FilterGraph::new().chain(
                FilterChain::new()
                    .input(StreamRef::audio(1))
                    .filter(Filter::new("volume").arg(1))
                    .output(&aout),
            )))
            .map("0:v")
            .map_pad(&aout)
            .output_options(["-c:v", "copy", "-shortest"]);

        assert_eq!(
            step.to_args("error"),
            vec![
                "-y",
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                "/s/j/video.mp4",
                "-stream_loop",
                "-1",
                "-i",
                "/s/j/audio.mp3",
                "-filter_complex",
                "[1:a]volume=1[a]",
                "-map",
                "0:v",
                "-map",
                "[a]",
                "-c:v",
                "copy",
                "-shortest",
                "/s/j/out.mp4",
            ]
        );
        assert_eq!(step.output_option("-c:v"), Some("copy"));
        assert_eq!(step.output_option("-crf"), None);
    }

    #[test]
    fn test_audio_format() {
        assert_eq!("WAV".parse::<AudioFormat>().unwrap(), AudioFormat::Wav);
        assert_eq!(AudioFormat::Mp3.ffmpeg_codec(), "libmp3lame");
        assert_eq!(AudioFormat::Wav.ffmpeg_codec(), "pcm_s16le");
        assert!(AudioFormat::Wav.is_lossless());
        assert!("flac".parse::<AudioFormat>().is_err());
    }
}
