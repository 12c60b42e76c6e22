use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::jobs::{decode_upload, GridQuery};
use crate::error::ApiError;
use crate::models::AppConfig;
use crate::rendering::{encode_png, render_grid_preview};

/// Render a grid preview
///
/// Returns a downscaled PNG of the uploaded image with the cropped area
/// shaded and the cut lines for the requested grid drawn in red.
#[utoipa::path(
    post,
    path = "/api/preview",
    params(GridQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "PNG or JPEG image"),
    responses(
        (status = 200, description = "Grid preview", content_type = "image/png"),
        (status = 400, description = "Invalid grid or empty body"),
        (status = 422, description = "Image could not be decoded"),
    ),
    tag = "Preview"
)]
pub async fn handle_grid_preview(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<GridQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let grid = query.resolve(&config)?;
    let source = decode_upload(body).await?;
    let page = config.page_format();

    let png = tokio::task::spawn_blocking(move || {
        render_grid_preview(&source, &grid, &page).and_then(|preview| encode_png(&preview))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Preview task failed: {e}")))??;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}
