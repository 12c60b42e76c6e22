//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, Sse},
        Json, Response,
    },
    routing::{get, post},
    Router,
};
use futures_util::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::api::{self, GridQuery};
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::services::{JobLimits, JobRegistry, JobSnapshot};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jobs: Arc<JobRegistry>,
}

/// Create application state from a loaded configuration.
pub fn create_app_state(config: AppConfig) -> AppState {
    let limits = JobLimits {
        retention: Duration::from_secs(config.job_retention_secs),
        max_jobs: config.max_jobs,
        max_concurrent: config.max_concurrent_jobs,
    };
    let jobs = Arc::new(JobRegistry::with_limits(
        config.page_format(),
        config.thumbnail_edge,
        limits,
    ));
    AppState {
        config: Arc::new(config),
        jobs,
    }
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Tile jobs
        .route("/api/jobs", post(handle_create_job))
        .route("/api/jobs/:id", get(handle_get_job).delete(handle_delete_job))
        .route("/api/jobs/:id/events", get(handle_job_events))
        .route("/api/jobs/:id/preview", get(handle_job_preview))
        .route("/api/jobs/:id/document", get(handle_job_document))
        // Grid preview
        .route("/api/preview", post(handle_grid_preview))
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Add state and tracing
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_create_job(
    State(state): State<AppState>,
    query: Query<GridQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    api::handle_create_job(State(state.jobs), State(state.config), query, body).await
}

async fn handle_get_job(
    State(state): State<AppState>,
    path: Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    api::handle_get_job(State(state.jobs), path).await
}

async fn handle_delete_job(
    State(state): State<AppState>,
    path: Path<String>,
) -> Result<StatusCode, ApiError> {
    api::handle_delete_job(State(state.jobs), path).await
}

async fn handle_job_events(
    State(state): State<AppState>,
    path: Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    api::handle_job_events(State(state.jobs), path).await
}

async fn handle_job_preview(
    State(state): State<AppState>,
    path: Path<String>,
) -> Result<Response, ApiError> {
    api::handle_job_preview(State(state.jobs), path).await
}

async fn handle_job_document(
    State(state): State<AppState>,
    path: Path<String>,
) -> Result<Response, ApiError> {
    api::handle_job_document(State(state.jobs), State(state.config), path).await
}

async fn handle_grid_preview(
    State(state): State<AppState>,
    query: Query<GridQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    api::handle_grid_preview(State(state.config), query, body).await
}
