//! Trait definitions for the engine module.

use async_trait::async_trait;
use std::path::Path;

use super::error::EngineError;
use super::types::{MediaProbe, StepReport, TransformStep};

/// A media engine that can run transform steps and inspect files.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its information.
    async fn probe(&self, path: &Path) -> Result<MediaProbe, EngineError>;

    /// Runs one step. On error the step's output does not exist.
    async fn execute(&self, step: &TransformStep) -> Result<StepReport, EngineError>;

    /// Validates that the engine binaries are present and runnable.
    async fn validate(&self) -> Result<(), EngineError>;

    /// First line of the engine's version banner.
    async fn version(&self) -> Result<String, EngineError>;
}
