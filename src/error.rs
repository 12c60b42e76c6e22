use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Job not found")]
    JobNotFound,

    #[error("No preview available yet")]
    PreviewUnavailable,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        ApiError::Pipeline(PipelineError::Render(e))
    }
}

/// Errors surfaced by the tile pipeline and its boundaries.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid grid {cols}x{rows}: columns and rows must be at least 1")]
    InvalidGridSpec { cols: u32, rows: u32 },

    #[error("No source image loaded")]
    MissingSource,

    #[error("Failed to decode source image: {0}")]
    DecodeFailure(String),

    #[error("Document assembly unavailable: {0}")]
    AssemblyUnavailable(String),

    #[error("Output requested before all tiles were processed")]
    NotReady,

    #[error("Pipeline is not running")]
    NotRunning,

    #[error("Pipeline run was cancelled")]
    Cancelled,

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl From<AssemblyError> for PipelineError {
    fn from(e: AssemblyError) -> Self {
        PipelineError::AssemblyUnavailable(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to allocate {width}x{height} pixmap")]
    PixmapAllocation { width: u32, height: u32 },

    #[error("Empty source region: {width}x{height}")]
    EmptyRegion { width: f64, height: f64 },

    #[error("JPEG encode error: {0}")]
    JpegEncode(String),

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("Tile buffer error: {0}")]
    Buffer(#[from] print_enhance::EnhanceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a document sink.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("no pages to assemble")]
    EmptyDocument,

    #[error("sink is not ready")]
    SinkNotReady,

    #[error("PDF error: {0}")]
    Pdf(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::JobNotFound | ApiError::PreviewUnavailable => StatusCode::NOT_FOUND,
            ApiError::Pipeline(e) => match e {
                PipelineError::InvalidGridSpec { .. } | PipelineError::MissingSource => {
                    StatusCode::BAD_REQUEST
                }
                PipelineError::DecodeFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::AssemblyUnavailable(_)
                | PipelineError::NotReady
                | PipelineError::NotRunning
                | PipelineError::Cancelled => StatusCode::CONFLICT,
                PipelineError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
