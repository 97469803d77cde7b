//! Typed operation requests.
//!
//! Each request is checked with `validate()` before a staging area is
//! created, so malformed parameters never cause I/O.

use crate::engine::AudioFormat;
use crate::error::JobError;
use crate::filter::{Dimensions, FillColor, FitMode, PlatformPreset, SubtitleStyle, Transition};
use crate::source::SourceDescriptor;

/// Merge a narration track onto a video.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub video: SourceDescriptor,
    pub audio: SourceDescriptor,
    /// Gain applied to the narration.
    pub volume: f64,
}

impl MergeRequest {
    pub fn validate(&self) -> Result<(), JobError> {
        ensure_gain("volume", self.volume)
    }
}

/// Join two or more clips, optionally with a transition.
#[derive(Debug, Clone)]
pub struct ConcatRequest {
    pub clips: Vec<SourceDescriptor>,
    pub transition: Transition,
    pub transition_duration: f64,
}

impl ConcatRequest {
    pub fn validate(&self) -> Result<(), JobError> {
        if self.clips.len() < 2 {
            return Err(JobError::invalid(format!(
                "at least 2 videos required, got {}",
                self.clips.len()
            )));
        }
        if self.transition != Transition::None {
            ensure_positive("transition_duration", self.transition_duration)?;
        }
        Ok(())
    }
}

/// How subtitles are attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubtitleMode {
    /// Rendered into the picture; re-encodes video.
    #[default]
    Hardcoded,
    /// Muxed as a selectable `mov_text` track.
    Soft,
}

impl std::str::FromStr for SubtitleMode {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hardcoded" | "burn" | "burned" => Ok(Self::Hardcoded),
            "soft" => Ok(Self::Soft),
            other => Err(JobError::invalid(format!(
                "unknown subtitle style '{}', expected hardcoded or soft",
                other
            ))),
        }
    }
}

impl SubtitleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hardcoded => "hardcoded",
            Self::Soft => "soft",
        }
    }
}

/// Subtitle document: literal SRT text or a fetchable source.
#[derive(Debug, Clone, PartialEq)]
pub enum SubtitleSource {
    Text(String),
    Remote(SourceDescriptor),
}

impl SubtitleSource {
    /// Exactly one of `text` or `url` must be non-blank.
    pub fn from_fields(text: Option<&str>, url: Option<&str>) -> Result<Self, JobError> {
        let text = text.filter(|t| !t.trim().is_empty());
        let url = url.map(str::trim).filter(|u| !u.is_empty());
        match (text, url) {
            (Some(text), None) => Ok(Self::Text(text.to_string())),
            (None, Some(url)) => Ok(Self::Remote(SourceDescriptor::RemoteUrl(url.to_string()))),
            (None, None) => Err(JobError::missing_source("subtitles or subtitles_url required")),
            (Some(_), Some(_)) => Err(JobError::invalid(
                "provide either subtitles or subtitles_url, not both",
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubtitleRequest {
    pub video: SourceDescriptor,
    pub subtitles: SubtitleSource,
    pub mode: SubtitleMode,
    pub style: SubtitleStyle,
}

impl SubtitleRequest {
    pub fn validate(&self) -> Result<(), JobError> {
        if self.style.font_size == 0 {
            return Err(JobError::invalid("font_size must be greater than zero"));
        }
        Ok(())
    }
}

/// Mix background music under a video's own audio.
#[derive(Debug, Clone)]
pub struct MusicRequest {
    pub video: SourceDescriptor,
    pub music: SourceDescriptor,
    pub music_volume: f64,
    pub voice_volume: f64,
    pub loop_music: bool,
    /// Fade-out length in seconds; 0 disables the fade.
    pub fade_out: f64,
}

impl MusicRequest {
    pub fn validate(&self) -> Result<(), JobError> {
        ensure_gain("music_volume", self.music_volume)?;
        ensure_gain("voice_volume", self.voice_volume)?;
        ensure_gain("fade_out", self.fade_out)
    }
}

#[derive(Debug, Clone)]
pub struct ResizeRequest {
    pub video: SourceDescriptor,
    /// Takes precedence over `dimensions` when set.
    pub preset: Option<PlatformPreset>,
    pub dimensions: Dimensions,
    pub fit: FitMode,
    pub fill: FillColor,
}

impl ResizeRequest {
    /// Frame size the output will have.
    pub fn target(&self) -> Dimensions {
        self.preset
            .map(|p| p.dimensions())
            .unwrap_or(self.dimensions)
    }
}

#[derive(Debug, Clone)]
pub struct ExtractAudioRequest {
    pub video: SourceDescriptor,
    pub format: AudioFormat,
}

#[derive(Debug, Clone)]
pub struct ThumbnailRequest {
    pub video: SourceDescriptor,
    /// Seek position in seconds.
    pub timestamp: f64,
    pub size: Dimensions,
}

impl ThumbnailRequest {
    pub fn validate(&self) -> Result<(), JobError> {
        ensure_gain("timestamp", self.timestamp)
    }
}

/// Segment to keep, in seconds from the start of the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    pub start: f64,
    /// `None` keeps everything after `start`.
    pub duration: Option<f64>,
}

impl TrimRange {
    /// Builds a range from `start` and either `duration` or `end`.
    ///
    /// An explicit duration wins over `end`.
    pub fn from_bounds(
        start: f64,
        end: Option<f64>,
        duration: Option<f64>,
    ) -> Result<Self, JobError> {
        ensure_gain("start", start)?;
        let duration = match (duration, end) {
            (Some(d), _) => {
                ensure_positive("duration", d)?;
                Some(d)
            }
            (None, Some(end)) => {
                if !end.is_finite() || end <= start {
                    return Err(JobError::invalid(format!(
                        "end ({}) must be after start ({})",
                        end, start
                    )));
                }
                Some(end - start)
            }
            (None, None) => None,
        };
        Ok(Self { start, duration })
    }
}

#[derive(Debug, Clone)]
pub struct TrimRequest {
    pub video: SourceDescriptor,
    pub range: TrimRange,
}

#[derive(Debug, Clone)]
pub struct NormalizeRequest {
    pub video: SourceDescriptor,
    pub target_lufs: f64,
    pub peak_limit: f64,
}

impl NormalizeRequest {
    pub fn validate(&self) -> Result<(), JobError> {
        if !self.target_lufs.is_finite() || !(-70.0..=-5.0).contains(&self.target_lufs) {
            return Err(JobError::invalid(format!(
                "target_lufs must be between -70 and -5, got {}",
                self.target_lufs
            )));
        }
        if !self.peak_limit.is_finite() || !(-9.0..=0.0).contains(&self.peak_limit) {
            return Err(JobError::invalid(format!(
                "peak_limit must be between -9 and 0, got {}",
                self.peak_limit
            )));
        }
        Ok(())
    }
}

pub(crate) fn ensure_gain(what: &str, value: f64) -> Result<(), JobError> {
    if !value.is_finite() || value < 0.0 {
        return Err(JobError::invalid(format!(
            "{} must be a non-negative number, got {}",
            what, value
        )));
    }
    Ok(())
}

fn ensure_positive(what: &str, value: f64) -> Result<(), JobError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(JobError::invalid(format!(
            "{} must be a positive number, got {}",
            what, value
        )));
    }
    Ok(())
}
