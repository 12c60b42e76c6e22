pub mod document;
pub mod job_registry;
pub mod tile_pipeline;

pub use document::{DocumentSink, PageLayout, PdfAssembler};
pub use job_registry::{Job, JobLimits, JobRegistry, JobSnapshot, JobStatus, ProgressEvent};
pub use tile_pipeline::{
    CancelToken, NoopObserver, PipelineStage, PipelineStatus, ProgressObserver,
    ProgressUpdate, TilePipeline,
};
