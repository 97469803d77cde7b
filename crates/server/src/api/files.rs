//! Artifact download and job cleanup.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::info;

use clipforge_core::{content_type_for, JobError};

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CleanupAllResponse {
    pub success: bool,
    pub cleaned: usize,
}

/// Serve an artifact as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path((job_id, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let path = state.service().artifact_path(&job_id, &filename).await?;
    let file = File::open(&path)
        .await
        .map_err(|e| JobError::storage("failed to open artifact", e))?;
    let file_size = file
        .metadata()
        .await
        .map_err(|e| JobError::storage("failed to stat artifact", e))?
        .len();

    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
            (header::CONTENT_LENGTH, file_size.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn cleanup(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<CleanupResponse>, ApiError> {
    state.service().cleanup(&job_id).await?;
    info!(job_id = %job_id, "Job cleaned up");
    Ok(Json(CleanupResponse {
        success: true,
        message: format!("Cleaned up {}", job_id),
    }))
}

pub async fn cleanup_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CleanupAllResponse>, ApiError> {
    let cleaned = state.service().cleanup_all().await?;
    info!(cleaned, "All jobs cleaned up");
    Ok(Json(CleanupAllResponse {
        success: true,
        cleaned,
    }))
}
