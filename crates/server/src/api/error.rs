//! Failure responses.
//!
//! Every error leaving a handler becomes `{success: false, error_kind, error}`
//! with a status derived from its kind.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use clipforge_core::{ErrorKind, JobError, PipelineFailure};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error_kind: ErrorKind,
    pub error: String,
    /// Engine stderr tail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps_completed: Option<Vec<String>>,
}

/// Error returned by every API handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::MissingSource | ErrorKind::InvalidParameters => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::SourceUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::EngineFailure => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::StorageUnavailable => StatusCode::INSUFFICIENT_STORAGE,
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        let kind = err.kind();
        Self {
            status: status_for(kind),
            body: ErrorBody {
                success: false,
                error_kind: kind,
                error: err.to_string(),
                details: err.diagnostics().map(str::to_string),
                failed_step: None,
                steps_completed: None,
            },
        }
    }
}

impl From<PipelineFailure> for ApiError {
    fn from(failure: PipelineFailure) -> Self {
        let PipelineFailure {
            failed_step,
            steps_completed,
            error,
        } = failure;
        let mut api = ApiError::from(error);
        api.body.failed_step = failed_step;
        api.body.steps_completed = Some(steps_completed);
        api
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::from(JobError::invalid(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                error_kind = self.body.error_kind.as_str(),
                "Request failed: {}", self.body.error
            );
        }
        (self.status, Json(self.body)).into_response()
    }
}
