use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, PipelineError};
use crate::models::{AppConfig, GridSpec, Orientation};
use crate::rendering::SourceImage;
use crate::services::{DocumentSink, JobRegistry, JobSnapshot, JobStatus, PdfAssembler, ProgressEvent};

/// Grid selection; missing fields fall back to the configured defaults
#[derive(Debug, Deserialize, IntoParams)]
pub struct GridQuery {
    /// Number of page columns
    pub cols: Option<u32>,
    /// Number of page rows
    pub rows: Option<u32>,
    /// Page orientation: "portrait" or "landscape"
    pub orientation: Option<Orientation>,
}

impl GridQuery {
    pub fn resolve(&self, config: &AppConfig) -> Result<GridSpec, PipelineError> {
        config.grid.resolve(self.cols, self.rows, self.orientation)
    }
}

/// Response for a newly created job
#[derive(Debug, Serialize, ToSchema)]
pub struct JobCreatedResponse {
    pub id: String,
    pub status: JobStatus,
    pub total_tiles: usize,
    pub tile_width: u32,
    pub tile_height: u32,
}

/// Decode an uploaded image off the async runtime.
pub(crate) async fn decode_upload(body: Bytes) -> Result<SourceImage, ApiError> {
    if body.is_empty() {
        return Err(PipelineError::MissingSource.into());
    }
    let source = tokio::task::spawn_blocking(move || SourceImage::decode(&body))
        .await
        .map_err(|e| ApiError::Internal(format!("Decode task failed: {e}")))??;
    Ok(source)
}

/// Start a tile job
///
/// The request body is the raw PNG or JPEG source image. Processing runs in
/// the background; poll the job or subscribe to its events for progress.
#[utoipa::path(
    post,
    path = "/api/jobs",
    params(GridQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "PNG or JPEG image"),
    responses(
        (status = 202, description = "Job accepted", body = JobCreatedResponse),
        (status = 400, description = "Invalid grid or empty body"),
        (status = 422, description = "Image could not be decoded"),
    ),
    tag = "Jobs"
)]
pub async fn handle_create_job(
    State(registry): State<Arc<JobRegistry>>,
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<GridQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    // Validate the grid before paying for a decode
    let grid = query.resolve(&config)?;
    let source = decode_upload(body).await?;

    let job = registry.submit(source, grid).await;
    let (tile_width, tile_height) = job.tile_size();

    Ok((
        StatusCode::ACCEPTED,
        Json(JobCreatedResponse {
            id: job.id().to_string(),
            status: JobStatus::Processing,
            total_tiles: grid.tile_count(),
            tile_width,
            tile_height,
        }),
    )
        .into_response())
}

/// Get job status
#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(("id" = String, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "Job status", body = JobSnapshot),
        (status = 404, description = "Job not found"),
    ),
    tag = "Jobs"
)]
pub async fn handle_get_job(
    State(registry): State<Arc<JobRegistry>>,
    Path(id): Path<String>,
) -> Result<Json<JobSnapshot>, ApiError> {
    let job = registry.get(&id).await.ok_or(ApiError::JobNotFound)?;
    Ok(Json(job.snapshot()))
}

/// Stream job progress as server-sent events
///
/// The first event is the current state; one `progress` event follows per
/// completed stage. The stream ends after the event that reports the job
/// as ready, failed or cancelled.
#[utoipa::path(
    get,
    path = "/api/jobs/{id}/events",
    params(("id" = String, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "Event stream", body = ProgressEvent, content_type = "text/event-stream"),
        (status = 404, description = "Job not found"),
    ),
    tag = "Jobs"
)]
pub async fn handle_job_events(
    State(registry): State<Arc<JobRegistry>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let job = registry.get(&id).await.ok_or(ApiError::JobNotFound)?;
    let rx = job.subscribe();
    let current = job.current_event();

    let events = stream::unfold(
        (Some(current), BroadcastStream::new(rx), false),
        |(pending, mut updates, done)| async move {
            if done {
                return None;
            }
            let next = match pending {
                Some(event) => Ok(event),
                None => updates.next().await?,
            };
            let (sse, finished) = match next {
                Ok(event) => (progress_event(&event), event.status.is_finished()),
                // Lagged - the client should re-fetch the snapshot
                Err(_) => (Event::default().event("lagged").data("lagged"), false),
            };
            Some((Ok::<_, Infallible>(sse), (None, updates, finished)))
        },
    );

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn progress_event(event: &ProgressEvent) -> Event {
    Event::default()
        .event("progress")
        .data(serde_json::to_string(event).unwrap_or_default())
}

/// Latest tile preview
///
/// PNG thumbnail of the tile as it stood after the most recent stage.
#[utoipa::path(
    get,
    path = "/api/jobs/{id}/preview",
    params(("id" = String, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "PNG thumbnail", content_type = "image/png"),
        (status = 404, description = "Job not found or no stage finished yet"),
    ),
    tag = "Jobs"
)]
pub async fn handle_job_preview(
    State(registry): State<Arc<JobRegistry>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let job = registry.get(&id).await.ok_or(ApiError::JobNotFound)?;
    let png = job.preview_png().ok_or(ApiError::PreviewUnavailable)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// Download the assembled document
///
/// One full-bleed page per tile, in row-major order.
#[utoipa::path(
    get,
    path = "/api/jobs/{id}/document",
    params(("id" = String, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job has not finished"),
    ),
    tag = "Jobs"
)]
pub async fn handle_job_document(
    State(registry): State<Arc<JobRegistry>>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let job = registry.get(&id).await.ok_or(ApiError::JobNotFound)?;
    let tiles = job.tiles()?;
    let layout = job.layout();

    let pdf = tokio::task::spawn_blocking(move || PdfAssembler::new().assemble(&tiles, &layout))
        .await
        .map_err(|e| ApiError::Internal(format!("Assembly task failed: {e}")))?
        .map_err(PipelineError::from)?;

    let disposition = format!("attachment; filename=\"{}\"", config.document_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

/// Cancel and delete a job
#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    params(("id" = String, Path, description = "Job identifier")),
    responses(
        (status = 204, description = "Job cancelled and removed"),
        (status = 404, description = "Job not found"),
    ),
    tag = "Jobs"
)]
pub async fn handle_delete_job(
    State(registry): State<Arc<JobRegistry>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if registry.remove(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::JobNotFound)
    }
}
