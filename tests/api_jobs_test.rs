//! Integration tests for the /api/jobs endpoints.

mod common;

use axum::http::StatusCode;
use common::{fixtures, TestApp};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_create_job_returns_accepted() {
    let app = TestApp::new();

    let response = app
        .post_bytes("/api/jobs?cols=3&rows=2", fixtures::gradient_png(300, 200))
        .await;
    common::assert_status(&response, StatusCode::ACCEPTED);

    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "processing");
    assert_eq!(json["total_tiles"], 6);
    assert_eq!(json["tile_width"], 83);
    assert_eq!(json["tile_height"], 117);
    assert_eq!(json["id"].as_str().unwrap().len(), 16);
}

#[tokio::test]
async fn test_job_completes_and_serves_pdf() {
    let app = TestApp::new();
    let id = app
        .create_job("cols=2&rows=2", fixtures::gradient_png(240, 160))
        .await;

    let snapshot = app.wait_for_job(&id).await;
    assert_eq!(snapshot["status"], "ready");
    assert_eq!(snapshot["completed_tiles"], 4);
    assert_eq!(snapshot["total_tiles"], 4);
    assert_eq!(snapshot["layout"]["orientation"], "portrait");

    let response = app.get(&format!("/api/jobs/{id}/document")).await;
    common::assert_pdf_pages(&response, 4);
    assert_eq!(
        response.header("content-disposition"),
        Some("attachment; filename=\"poster_a4.pdf\"")
    );
}

#[tokio::test]
async fn test_landscape_job_uses_landscape_tiles() {
    let app = TestApp::new();
    let response = app
        .post_bytes(
            "/api/jobs?cols=1&rows=1&orientation=landscape",
            fixtures::solid_jpeg(120, 90, [10, 200, 30]),
        )
        .await;
    common::assert_status(&response, StatusCode::ACCEPTED);
    let json: serde_json::Value = response.json();
    assert_eq!(json["tile_width"], 117);
    assert_eq!(json["tile_height"], 83);

    let id = json["id"].as_str().unwrap();
    let snapshot = app.wait_for_job(id).await;
    assert_eq!(snapshot["layout"]["orientation"], "landscape");
    assert_eq!(snapshot["layout"]["width_mm"], 297.0);
}

#[tokio::test]
async fn test_grid_defaults_come_from_config() {
    let app = TestApp::new();
    let response = app
        .post_bytes("/api/jobs", fixtures::gradient_png(100, 100))
        .await;
    common::assert_status(&response, StatusCode::ACCEPTED);
    let json: serde_json::Value = response.json();
    assert_eq!(json["total_tiles"], 4);
}

#[tokio::test]
async fn test_zero_columns_rejected() {
    let app = TestApp::new();
    let response = app
        .post_bytes("/api/jobs?cols=0&rows=2", fixtures::gradient_png(100, 100))
        .await;
    common::assert_json_error(&response, StatusCode::BAD_REQUEST);
    assert!(app.jobs.is_empty().await);
}

#[tokio::test]
async fn test_undecodable_upload_rejected() {
    let app = TestApp::new();
    let response = app
        .post_bytes("/api/jobs", fixtures::NOT_AN_IMAGE.to_vec())
        .await;
    common::assert_json_error(&response, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.jobs.is_empty().await);
}

#[tokio::test]
async fn test_empty_upload_rejected() {
    let app = TestApp::new();
    let response = app.post_bytes("/api/jobs", Vec::new()).await;
    common::assert_json_error(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let app = TestApp::new();

    for path in [
        "/api/jobs/doesnotexist",
        "/api/jobs/doesnotexist/preview",
        "/api/jobs/doesnotexist/document",
    ] {
        let response = app.get(path).await;
        common::assert_json_error(&response, StatusCode::NOT_FOUND);
    }

    let response = app.delete("/api/jobs/doesnotexist").await;
    common::assert_json_error(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preview_available_after_completion() {
    let app = TestApp::new();
    let id = app
        .create_job("cols=1&rows=1", fixtures::gradient_png(90, 120))
        .await;
    app.wait_for_job(&id).await;

    let response = app.get(&format!("/api/jobs/{id}/preview")).await;
    common::assert_png(&response);

    let thumb = image::load_from_memory(&response.body).unwrap();
    assert!(thumb.width().max(thumb.height()) <= 32);
}

#[tokio::test]
async fn test_delete_job_removes_it() {
    let app = TestApp::new();
    let id = app
        .create_job("cols=1&rows=1", fixtures::gradient_png(50, 50))
        .await;

    let response = app.delete(&format!("/api/jobs/{id}")).await;
    common::assert_status(&response, StatusCode::NO_CONTENT);

    let response = app.get(&format!("/api/jobs/{id}")).await;
    common::assert_json_error(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_document_before_ready_is_conflict() {
    // Full 300 DPI tiles take long enough to catch the job mid-run
    let app = TestApp::with_config(tilewall::models::AppConfig::default());
    let id = app
        .create_job("cols=4&rows=4", fixtures::gradient_png(400, 400))
        .await;

    let response = app.get(&format!("/api/jobs/{id}/document")).await;
    common::assert_json_error(&response, StatusCode::CONFLICT);

    // Don't leave the worker grinding after the test
    app.delete(&format!("/api/jobs/{id}")).await;
}

#[tokio::test]
async fn test_events_stream_content_type() {
    let state = TestApp::create_state();
    let jobs = state.jobs.clone();
    let router = tilewall::server::build_router(state);

    let source = tilewall::rendering::SourceImage::decode(&fixtures::gradient_png(40, 40)).unwrap();
    let grid = tilewall::models::GridSpec::default();
    let job = jobs.submit(source, grid).await;

    use tower::ServiceExt;
    let response = router
        .oneshot(
            axum::http::Request::get(format!("/api/jobs/{}/events", job.id()))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/event-stream")
    );
}

#[tokio::test]
async fn test_events_stream_ends_after_final_event() {
    let app = TestApp::new();
    let id = app
        .create_job("cols=2&rows=1", fixtures::gradient_png(120, 80))
        .await;

    // Collecting the body only returns once the server closes the stream
    let response = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        app.get(&format!("/api/jobs/{id}/events")),
    )
    .await
    .expect("event stream did not end");

    common::assert_ok(&response);
    let body = response.text();
    let last = body
        .lines()
        .filter(|line| line.starts_with("data:"))
        .last()
        .expect("no events");
    assert!(last.contains("\"status\":\"ready\""), "{body}");
}

#[tokio::test]
async fn test_events_for_finished_job_is_single_event() {
    let app = TestApp::new();
    let id = app
        .create_job("cols=1&rows=1", fixtures::solid_png(40, 40, [10, 20, 30, 255]))
        .await;
    app.wait_for_job(&id).await;

    let response = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        app.get(&format!("/api/jobs/{id}/events")),
    )
    .await
    .expect("event stream did not end");

    let body = response.text();
    assert_eq!(body.matches("event: progress").count(), 1, "{body}");
    assert!(body.contains("\"status\":\"ready\""), "{body}");
}

#[tokio::test]
async fn test_finished_jobs_are_evicted_over_cap() {
    let app = TestApp::with_config(tilewall::models::AppConfig {
        max_jobs: 1,
        ..TestApp::fast_config()
    });

    let first = app
        .create_job("cols=1&rows=1", fixtures::gradient_png(60, 60))
        .await;
    app.wait_for_job(&first).await;
    let second = app
        .create_job("cols=1&rows=1", fixtures::gradient_png(60, 60))
        .await;

    let response = app.get(&format!("/api/jobs/{first}")).await;
    common::assert_json_error(&response, StatusCode::NOT_FOUND);
    let response = app.get(&format!("/api/jobs/{second}")).await;
    common::assert_ok(&response);
}
