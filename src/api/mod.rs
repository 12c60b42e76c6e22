pub mod jobs;
pub mod preview;

pub use jobs::{
    handle_create_job, handle_delete_job, handle_get_job, handle_job_document, handle_job_events,
    handle_job_preview, GridQuery, JobCreatedResponse,
};
pub use jobs::{
    __path_handle_create_job, __path_handle_delete_job, __path_handle_get_job,
    __path_handle_job_document, __path_handle_job_events, __path_handle_job_preview,
};
pub use preview::{handle_grid_preview, __path_handle_grid_preview};
