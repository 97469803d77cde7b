//! HTTP API tests.
//!
//! These run the router in-process against a mock engine and fetcher:
//! - Success bodies and download links
//! - Error kinds mapped to status codes
//! - Full-pipeline reporting
//! - Download, cleanup and metrics endpoints

mod common;

use axum::http::{header, StatusCode};
use serde_json::json;

use clipforge_core::EngineError;
use common::{fixtures, TestFixture};

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "status", json!("ok"));
    assert_json_path!(response.body, "service", json!("clipforge"));
    assert!(response.body["timestamp"].is_string());
}

#[tokio::test]
async fn test_info_lists_endpoints() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/info").await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "engine", json!("ffmpeg version mock"));
    assert_json_path!(response.body, "upstream", json!(common::UPSTREAM));
    let endpoints = response.body["endpoints"].as_array().unwrap();
    assert!(endpoints.contains(&json!("POST /api/v1/merge")));
    assert!(endpoints.contains(&json!("DELETE /api/v1/cleanup-all")));
}

#[tokio::test]
async fn test_merge_success_body() {
    let fixture = TestFixture::new().await;
    fixture.serve_upstream("abc123", b"video").await;

    let response = fixture
        .post(
            "/api/v1/merge",
            json!({
                "video_job_id": "abc123",
                "audio_base64": fixtures::INLINE_AUDIO,
            }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "success", json!(true));
    assert_json_path!(response.body, "operation", json!("merge"));

    let job_id = response.body["job_id"].as_str().unwrap();
    assert_json_path!(
        response.body,
        "output_url",
        json!(format!("/api/v1/download/{}/merged_{}.mp4", job_id, job_id))
    );
    assert!(response.body["file_size"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_missing_video_is_bad_request() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post("/api/v1/resize", json!({ "preset": "tiktok" }))
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_json_path!(response.body, "success", json!(false));
    assert_json_path!(response.body, "error_kind", json!("missing_source"));
    // Rejected before any I/O
    assert!(fixture.fetcher.requests().await.is_empty());
    assert!(!fixture.staging_root().exists());
}

#[tokio::test]
async fn test_invalid_parameters_are_bad_request() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/api/v1/concat",
            json!({ "videos": [{ "job_id": "only-one" }] }),
        )
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_json_path!(response.body, "error_kind", json!("invalid_parameters"));
}

#[tokio::test]
async fn test_concat_reports_video_count() {
    let fixture = TestFixture::new().await;
    fixture.serve_upstream("intro", b"a").await;
    fixture.serve_upstream("outro", b"b").await;

    let response = fixture
        .post(
            "/api/v1/concat",
            json!({ "videos": [{ "job_id": "intro" }, { "job_id": "outro" }] }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "operation", json!("concat"));
    assert_json_path!(response.body, "video_count", json!(2));
    assert_json_path!(response.body, "transition", json!("none"));
    assert!(response.body.get("clips").is_none());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let fixture = TestFixture::new().await;
    let response = fixture.post_raw("/api/v1/trim", "{not json").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_json_path!(response.body, "error_kind", json!("invalid_parameters"));
}

#[tokio::test]
async fn test_unreachable_source_is_bad_gateway() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/api/v1/extract-audio",
            json!({ "video_job_id": "never-rendered", "format": "wav" }),
        )
        .await;

    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert_json_path!(response.body, "error_kind", json!("source_unavailable"));
}

#[tokio::test]
async fn test_engine_failure_includes_details() {
    let fixture = TestFixture::new().await;
    fixture.serve_upstream("abc123", b"video").await;
    fixture
        .engine
        .fail_step("normalize_audio", "Error while filtering: Invalid argument")
        .await;

    let response = fixture
        .post("/api/v1/normalize-audio", json!({ "video_job_id": "abc123" }))
        .await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_json_path!(response.body, "error_kind", json!("engine_failure"));
    assert_json_path!(
        response.body,
        "details",
        json!("Error while filtering: Invalid argument")
    );
}

#[tokio::test]
async fn test_trim_reports_duration() {
    let fixture = TestFixture::new().await;
    fixture.serve_upstream("abc123", b"video").await;

    let response = fixture
        .post(
            "/api/v1/trim",
            json!({ "video_job_id": "abc123", "start": 10, "end": 40 }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "duration", json!(30.0));
    let step = fixture.engine.find_step("trim").await.unwrap();
    assert_eq!(step.output_option("-t"), Some("30"));
}

#[tokio::test]
async fn test_full_pipeline_scenario() {
    let fixture = TestFixture::new().await;
    fixture.serve_upstream("abc123", b"rendered").await;

    let response = fixture
        .post(
            "/api/v1/full-pipeline",
            json!({
                "video_job_id": "abc123",
                "audio_base64": fixtures::INLINE_AUDIO,
                "platform": "youtube_shorts",
                "normalize": true
            }),
        )
        .await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "operation", json!("full-pipeline"));
    assert_json_path!(
        response.body,
        "steps_completed",
        json!([
            "download_video",
            "merge_tts",
            "resize_youtube_shorts",
            "normalize_audio"
        ])
    );
    assert_json_path!(response.body, "steps_skipped", json!([]));
    assert_json_path!(response.body, "platform", json!("youtube_shorts"));

    let job_id = response.body["job_id"].as_str().unwrap();
    assert!(response.body["output_url"]
        .as_str()
        .unwrap()
        .ends_with(&format!("final_{}.mp4", job_id)));
}

#[tokio::test]
async fn test_full_pipeline_mandatory_failure() {
    let fixture = TestFixture::new().await;
    fixture.serve_upstream("abc123", b"rendered").await;
    fixture
        .engine
        .set_next_error(EngineError::failed(Some(1), "Output file is empty"))
        .await;

    let response = fixture
        .post(
            "/api/v1/full-pipeline",
            json!({
                "video_job_id": "abc123",
                "audio_base64": fixtures::INLINE_AUDIO
            }),
        )
        .await;

    assert_status!(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_json_path!(response.body, "failed_step", json!("merge_tts"));
    assert_json_path!(response.body, "steps_completed", json!(["download_video"]));
}

#[tokio::test]
async fn test_full_pipeline_requires_narration_when_asked() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post(
            "/api/v1/full-pipeline",
            json!({ "video_job_id": "abc123", "narration_required": true }),
        )
        .await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_json_path!(response.body, "error_kind", json!("missing_source"));
}

#[tokio::test]
async fn test_probe_returns_info() {
    let fixture = TestFixture::new().await;
    fixture.serve_upstream("abc123", b"video").await;

    let response = fixture
        .post("/api/v1/probe", json!({ "job_id": "abc123" }))
        .await;

    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "success", json!(true));
    assert_json_path!(response.body["info"], "duration_secs", json!(30.0));
}

#[tokio::test]
async fn test_download_serves_attachment() {
    let fixture = TestFixture::new().await;
    fixture.serve_upstream("abc123", b"video").await;

    let response = fixture
        .post(
            "/api/v1/thumbnail",
            json!({ "video_job_id": "abc123", "timestamp": 1.5 }),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let url = response.body["output_url"].as_str().unwrap();
    assert!(url.ends_with(".jpg"));

    let download = fixture.get_raw(url).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.headers[header::CONTENT_TYPE], "image/jpeg");
    assert!(download.headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .starts_with("attachment"));
    assert_eq!(
        download.bytes.len() as u64,
        response.body["file_size"].as_u64().unwrap()
    );
}

#[tokio::test]
async fn test_download_streams_full_artifact() {
    let fixture = TestFixture::new().await;
    fixture.serve_upstream("abc123", b"video").await;

    let response = fixture
        .post("/api/v1/trim", json!({ "video_job_id": "abc123", "start": 1 }))
        .await;
    assert_status!(response, StatusCode::OK);
    let file_size = response.body["file_size"].as_u64().unwrap();

    let download = fixture
        .get_raw(response.body["output_url"].as_str().unwrap())
        .await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(
        download.headers[header::CONTENT_LENGTH],
        file_size.to_string().as_str()
    );
    assert_eq!(&download.bytes[..], b"mock-media-output");
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .get("/api/v1/download/deadbeef/..%2F..%2Fetc%2Fpasswd")
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cleanup_lifecycle() {
    let fixture = TestFixture::new().await;
    fixture.serve_upstream("abc123", b"video").await;

    let first = fixture
        .post("/api/v1/trim", json!({ "video_job_id": "abc123", "start": 1 }))
        .await;
    fixture
        .post("/api/v1/trim", json!({ "video_job_id": "abc123", "start": 2 }))
        .await;
    let job_id = first.body["job_id"].as_str().unwrap();

    let response = fixture.delete(&format!("/api/v1/cleanup/{}", job_id)).await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "success", json!(true));

    let response = fixture.delete(&format!("/api/v1/cleanup/{}", job_id)).await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_json_path!(response.body, "error_kind", json!("not_found"));

    let response = fixture.delete("/api/v1/cleanup-all").await;
    assert_status!(response, StatusCode::OK);
    assert_json_path!(response.body, "cleaned", json!(1));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get_raw("/api/v1/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    let text = String::from_utf8(response.bytes.to_vec()).unwrap();
    assert!(text.contains("clipforge_http_requests_total"));
}
