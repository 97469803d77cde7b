//! Media engine module.
//!
//! This module provides the `MediaEngine` trait and its ffmpeg implementation.
//! A [`TransformStep`] describes one engine invocation: inputs with their
//! pre-input options, an optional filter, stream maps, output options and a
//! single output artifact. The engine runs it under a timeout and reports
//! either a [`StepReport`] or an [`EngineError`] carrying the stderr tail.
//!
//! # Example
//!
//! ```ignore
//! use clipforge_core::engine::{FfmpegEngine, MediaEngine, StepInput, TransformStep};
//!
//! let engine = FfmpegEngine::with_defaults();
//! engine.validate().await?;
//!
//! let step = TransformStep::new("extract_audio", artifact, Duration::from_secs(600))
//!     .input(StepInput::file("/staging/ab12cd34/input_video.mp4"))
//!     .output_options(["-vn", "-c:a", "libmp3lame", "-q:a", "2"]);
//! let report = engine.execute(&step).await?;
//! println!("{} bytes in {} ms", report.output_size_bytes, report.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::{EngineConfig, StepTimeouts};
pub use error::EngineError;
pub use ffmpeg::FfmpegEngine;
pub use traits::MediaEngine;
pub use types::{AudioFormat, MediaProbe, StepFilter, StepInput, StepReport, TransformStep};
