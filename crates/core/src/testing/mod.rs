//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the engine and fetcher
//! traits, so operations and pipelines can be exercised without ffmpeg or
//! network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use clipforge_core::testing::{MockEngine, MockFetcher};
//!
//! let engine = Arc::new(MockEngine::new());
//! let fetcher = Arc::new(MockFetcher::new());
//!
//! // Configure mock responses
//! fetcher.serve("http://renderer:8000/video/abc123", b"mp4".to_vec()).await;
//! engine.fail_step("add_subtitles", "Unable to open subtitles.srt").await;
//!
//! // Build a MediaService around them...
//! ```

mod mock_engine;
mod mock_fetcher;

pub use mock_engine::{MockEngine, RecordedStep};
pub use mock_fetcher::MockFetcher;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::engine::MediaProbe;

    /// Base64 of a few bytes standing in for an mp3 payload.
    pub const INLINE_AUDIO: &str = "SUQzBAAAAAAAI1RTU0UAAAAPAAADTGF2ZjU4Ljc2LjEwMAAAAAAAAAAAAAAA";

    /// A short SRT document.
    pub const SRT: &str = "1\n00:00:00,000 --> 00:00:02,000\nHello there\n\n2\n00:00:02,500 --> 00:00:04,000\nGeneral Kenobi\n";

    /// A video probe with the given duration and frame size.
    pub fn video_probe(duration_secs: f64, width: u32, height: u32) -> MediaProbe {
        MediaProbe {
            duration_secs: Some(duration_secs),
            format: "mov".to_string(),
            size_bytes: 1024 * 1024,
            audio_codec: Some("aac".to_string()),
            audio_sample_rate: Some(48000),
            audio_channels: Some(2),
            video_codec: Some("h264".to_string()),
            video_width: Some(width),
            video_height: Some(height),
            video_fps: Some(30.0),
            raw: serde_json::Value::Null,
        }
    }
}
