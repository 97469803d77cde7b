pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod job;
pub mod metrics;
pub mod operations;
pub mod pipeline;
pub mod source;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError,
};
pub use engine::{EngineConfig, EngineError, FfmpegEngine, MediaEngine, MediaProbe};
pub use error::{ErrorKind, JobError};
pub use job::{content_type_for, Artifact, ArtifactRole, JobId, JobRegistry, StagingArea};
pub use operations::{MediaService, Operation, OperationOutput};
pub use pipeline::{PipelineFailure, PipelineRequest, SkippedStep, StepPolicy};
pub use source::{Fetcher, HttpFetcher, SourceDescriptor, SourceResolver};
