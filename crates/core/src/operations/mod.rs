//! Single-step operations and the service that runs them.
//!
//! Every operation follows the same shape: validate the typed request,
//! create a job, resolve its inputs into the staging area, build one
//! [`TransformStep`](crate::engine::TransformStep) and execute it.

pub mod requests;
mod service;
pub mod steps;
mod types;

pub use requests::{
    ConcatRequest, ExtractAudioRequest, MergeRequest, MusicRequest, NormalizeRequest,
    ResizeRequest, SubtitleMode, SubtitleRequest, SubtitleSource, ThumbnailRequest, TrimRange,
    TrimRequest,
};
pub use service::MediaService;
pub use types::{Operation, OperationOutput};
