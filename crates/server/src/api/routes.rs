use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{files, handlers, middleware::metrics_middleware, operations};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Service
        .route("/health", get(handlers::health))
        .route("/info", get(handlers::info))
        .route("/metrics", get(handlers::metrics))
        // Operations
        .route("/merge", post(operations::merge))
        .route("/concat", post(operations::concat))
        .route("/add-subtitles", post(operations::add_subtitles))
        .route("/add-background-music", post(operations::add_background_music))
        .route("/resize", post(operations::resize))
        .route("/extract-audio", post(operations::extract_audio))
        .route("/thumbnail", post(operations::thumbnail))
        .route("/trim", post(operations::trim))
        .route("/normalize-audio", post(operations::normalize_audio))
        .route("/full-pipeline", post(operations::full_pipeline))
        .route("/probe", post(operations::probe))
        // Artifacts
        .route("/download/{job_id}/{filename}", get(files::download))
        .route("/cleanup/{job_id}", delete(files::cleanup))
        .route("/cleanup-all", delete(files::cleanup_all))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
