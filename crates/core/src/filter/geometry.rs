//! Frame geometry: fit modes, target dimensions and platform presets.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::graph::{Filter, FilterChain};
use crate::error::JobError;

/// Width and height in pixels, both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self, JobError> {
        if width == 0 || height == 0 {
            return Err(JobError::invalid(format!(
                "dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    /// Builds dimensions from signed request values.
    pub fn from_signed(width: i64, height: i64) -> Result<Self, JobError> {
        let w = u32::try_from(width).map_err(|_| {
            JobError::invalid(format!("width must be a positive integer, got {}", width))
        })?;
        let h = u32::try_from(height).map_err(|_| {
            JobError::invalid(format!("height must be a positive integer, got {}", height))
        })?;
        Self::new(w, h)
    }

    /// Whether both dimensions share the same aspect ratio.
    pub fn same_aspect(&self, other: &Dimensions) -> bool {
        u64::from(self.width) * u64::from(other.height)
            == u64::from(other.width) * u64::from(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How a frame is fitted into target dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Scale down to fit and pad the remainder.
    #[default]
    Contain,
    /// Scale up to fill and crop the overflow.
    Cover,
    /// Scale to the exact size, ignoring aspect ratio.
    Stretch,
}

/// Arithmetic outcome of fitting one frame size into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitPlan {
    /// Frame size after the scale filter.
    pub scaled: Dimensions,
    /// Final frame size; always the target.
    pub output: Dimensions,
    pub padded: bool,
    pub cropped: bool,
    pub preserves_aspect: bool,
}

impl FitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contain => "contain",
            Self::Cover => "cover",
            Self::Stretch => "stretch",
        }
    }

    /// Builds the `-vf` chain that fits any input into `target`.
    pub fn chain(&self, target: Dimensions, fill: &FillColor) -> FilterChain {
        let Dimensions { width, height } = target;
        let chain = FilterChain::new();
        let chain = match self {
            Self::Contain => chain
                .filter(
                    Filter::new("scale")
                        .arg(width)
                        .arg(height)
                        .opt("force_original_aspect_ratio", "decrease"),
                )
                .filter(
                    Filter::new("pad")
                        .arg(width)
                        .arg(height)
                        .arg("(ow-iw)/2")
                        .arg("(oh-ih)/2")
                        .opt("color", fill.as_str()),
                ),
            Self::Cover => chain
                .filter(
                    Filter::new("scale")
                        .arg(width)
                        .arg(height)
                        .opt("force_original_aspect_ratio", "increase"),
                )
                .filter(Filter::new("crop").arg(width).arg(height)),
            Self::Stretch => chain.filter(Filter::new("scale").arg(width).arg(height)),
        };
        chain.filter(Filter::new("setsar").arg(1))
    }

    /// Computes the frame sizes the chain from [`FitMode::chain`] produces.
    pub fn plan(&self, input: Dimensions, target: Dimensions) -> FitPlan {
        let (iw, ih) = (u64::from(input.width), u64::from(input.height));
        let (tw, th) = (u64::from(target.width), u64::from(target.height));

        let scaled = match self {
            Self::Contain => {
                if iw * th <= ih * tw {
                    // Height bound
                    (((iw * th) / ih).max(1), th)
                } else {
                    (tw, ((ih * tw) / iw).max(1))
                }
            }
            Self::Cover => {
                if iw * th >= ih * tw {
                    ((iw * th).div_ceil(ih), th)
                } else {
                    (tw, (ih * tw).div_ceil(iw))
                }
            }
            Self::Stretch => (tw, th),
        };
        let scaled = Dimensions {
            width: scaled.0 as u32,
            height: scaled.1 as u32,
        };

        FitPlan {
            scaled,
            output: target,
            padded: matches!(self, Self::Contain) && scaled != target,
            cropped: matches!(self, Self::Cover) && scaled != target,
            preserves_aspect: !matches!(self, Self::Stretch) || input.same_aspect(&target),
        }
    }
}

impl FromStr for FitMode {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contain" => Ok(Self::Contain),
            "cover" => Ok(Self::Cover),
            "stretch" => Ok(Self::Stretch),
            other => Err(JobError::invalid(format!(
                "unknown fit mode '{}', expected contain, cover or stretch",
                other
            ))),
        }
    }
}

static FILL_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#?[0-9A-Fa-f]{6}([0-9A-Fa-f]{2})?|[A-Za-z]+)(@[0-9.]+)?$").unwrap());

/// Padding colour accepted by the `pad` filter (`black`, `#202020`, `white@0.5`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillColor(String);

impl FillColor {
    pub fn parse(value: &str) -> Result<Self, JobError> {
        let value = value.trim();
        if !FILL_COLOR.is_match(value) {
            return Err(JobError::invalid(format!(
                "invalid background color '{}'",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn black() -> Self {
        Self("black".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FillColor {
    fn default() -> Self {
        Self::black()
    }
}

/// Named output formats for social platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformPreset {
    YoutubeShorts,
    Tiktok,
    InstagramReels,
    InstagramFeed,
    YoutubeLong,
    Linkedin,
    #[serde(rename = "youtube_4k")]
    Youtube4k,
}

impl PlatformPreset {
    pub const ALL: [PlatformPreset; 7] = [
        Self::YoutubeShorts,
        Self::Tiktok,
        Self::InstagramReels,
        Self::InstagramFeed,
        Self::YoutubeLong,
        Self::Linkedin,
        Self::Youtube4k,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::YoutubeShorts => "youtube_shorts",
            Self::Tiktok => "tiktok",
            Self::InstagramReels => "instagram_reels",
            Self::InstagramFeed => "instagram_feed",
            Self::YoutubeLong => "youtube_long",
            Self::Linkedin => "linkedin",
            Self::Youtube4k => "youtube_4k",
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        let (width, height) = match self {
            Self::YoutubeShorts | Self::Tiktok | Self::InstagramReels => (1080, 1920),
            Self::InstagramFeed => (1080, 1080),
            Self::YoutubeLong | Self::Linkedin => (1920, 1080),
            Self::Youtube4k => (3840, 2160),
        };
        Dimensions { width, height }
    }
}

impl FromStr for PlatformPreset {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|p| p.name()).collect();
                JobError::invalid(format!(
                    "unknown platform '{}', expected one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

impl fmt::Display for PlatformPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
