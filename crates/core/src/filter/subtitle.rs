//! Subtitle burn-in styling.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use super::graph::{Filter, FilterChain};
use crate::error::JobError;

/// An RGBA colour, rendered in the ASS `&HAABBGGRR` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// ASS alpha: 0 is opaque, 255 fully transparent.
    pub alpha: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 0 }
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub fn to_ass(&self) -> String {
        format!(
            "&H{:02X}{:02X}{:02X}{:02X}",
            self.alpha, self.b, self.g, self.r
        )
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name {
            "white" => Self::WHITE,
            "black" => Self::BLACK,
            "red" => Self::rgb(255, 0, 0),
            "green" => Self::rgb(0, 255, 0),
            "blue" => Self::rgb(0, 0, 255),
            "yellow" => Self::rgb(255, 255, 0),
            "cyan" => Self::rgb(0, 255, 255),
            "magenta" => Self::rgb(255, 0, 255),
            "orange" => Self::rgb(255, 165, 0),
            "gray" | "grey" => Self::rgb(128, 128, 128),
            _ => return None,
        };
        Some(color)
    }
}

impl FromStr for Color {
    type Err = JobError;

    /// Accepts a colour name, `#RRGGBB` or `#RRGGBBAA` (CSS alpha, FF opaque).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        if let Some(color) = Self::named(&value) {
            return Ok(color);
        }

        let invalid = || JobError::invalid(format!("invalid colour '{}'", s));
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let alpha = if hex.len() == 8 { 255 - byte(6)? } else { 0 };
        Ok(Self {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            alpha,
        })
    }
}

/// Vertical placement of burned-in subtitles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitlePosition {
    #[default]
    Bottom,
    Top,
    Middle,
}

impl SubtitlePosition {
    /// Legacy SSA alignment code.
    fn alignment(&self) -> u8 {
        match self {
            Self::Bottom => 2,
            Self::Top => 6,
            Self::Middle => 10,
        }
    }

    fn margin_v(&self) -> u32 {
        match self {
            Self::Bottom | Self::Top => 50,
            Self::Middle => 0,
        }
    }
}

impl FromStr for SubtitlePosition {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bottom" => Ok(Self::Bottom),
            "top" => Ok(Self::Top),
            "middle" | "center" => Ok(Self::Middle),
            other => Err(JobError::invalid(format!(
                "unknown subtitle position '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleStyle {
    pub font_size: u32,
    pub primary_color: Color,
    pub outline_color: Color,
    pub position: SubtitlePosition,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_size: 24,
            primary_color: Color::WHITE,
            outline_color: Color::BLACK,
            position: SubtitlePosition::Bottom,
        }
    }
}

impl SubtitleStyle {
    pub fn force_style(&self) -> String {
        format!(
            "FontSize={},PrimaryColour={},OutlineColour={},BorderStyle=3,Outline=2,MarginV={},Alignment={}",
            self.font_size,
            self.primary_color.to_ass(),
            self.outline_color.to_ass(),
            self.position.margin_v(),
            self.position.alignment()
        )
    }

    /// `-vf` chain rendering the subtitle file into the picture.
    pub fn burn_in_chain(&self, subtitles: &Path) -> FilterChain {
        FilterChain::new().filter(
            Filter::new("subtitles")
                .arg(subtitles.display())
                .opt("force_style", self.force_style()),
        )
    }
}
