//! Job identity, staging areas and lifecycle.

mod registry;
mod staging;
mod types;

pub use registry::JobRegistry;
pub use staging::StagingArea;
pub use types::{content_type_for, Artifact, ArtifactRole, JobId};
