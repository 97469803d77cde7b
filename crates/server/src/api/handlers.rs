use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use clipforge_core::Operation;

use crate::metrics::encode_metrics;
use crate::state::AppState;

pub const SERVICE_NAME: &str = "clipforge";

#[derive(Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub status: String,
    pub timestamp: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        service: SERVICE_NAME,
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Serialize)]
pub struct InfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    /// First line of the engine's version banner, if it could be read.
    pub engine: Option<String>,
    pub endpoints: Vec<String>,
    pub upstream: String,
}

pub async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    let engine = match state.engine().version().await {
        Ok(version) => Some(version),
        Err(e) => {
            warn!("Failed to read engine version: {}", e);
            None
        }
    };

    let mut endpoints: Vec<String> = Operation::ALL
        .iter()
        .map(|op| format!("POST /api/v1/{}", op.as_str()))
        .collect();
    endpoints.extend([
        "GET /api/v1/download/{job_id}/{filename}".to_string(),
        "DELETE /api/v1/cleanup/{job_id}".to_string(),
        "DELETE /api/v1/cleanup-all".to_string(),
    ]);

    Json(InfoResponse {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        engine,
        endpoints,
        upstream: state.service().upstream_base().to_string(),
    })
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
