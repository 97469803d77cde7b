//! Filter expression builder.
//!
//! Builds ffmpeg filtergraphs as typed values: geometry fitting, audio
//! mixing, subtitle styling, crossfades and loudness normalisation. Every
//! builder validates its numeric inputs and fails with
//! [`JobError::InvalidParameters`](crate::error::JobError) before anything
//! is rendered.

mod audio;
mod crossfade;
mod geometry;
mod graph;
mod subtitle;

pub use audio::{loudnorm_chain, volume_chain, AudioMix, MixTrack, MIX_OUTPUT};
pub use crossfade::{concat_list, crossfade_graph, crossfade_offsets, Transition, CROSSFADE_OUTPUT};
pub use geometry::{Dimensions, FillColor, FitMode, FitPlan, PlatformPreset};
pub use graph::{Filter, FilterChain, FilterGraph, PadLabel, StreamKind, StreamRef};
pub use subtitle::{Color, SubtitlePosition, SubtitleStyle};
