//! Background tile jobs for the HTTP server.
//!
//! Each submitted image becomes a [`Job`] that owns its own [`TilePipeline`]
//! on a blocking thread. Progress is mirrored into a snapshot for polling
//! and broadcast to any SSE subscribers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use utoipa::ToSchema;

use super::document::PageLayout;
use super::tile_pipeline::{
    CancelToken, PipelineStage, ProgressObserver, ProgressUpdate, TilePipeline,
};
use crate::error::PipelineError;
use crate::models::{GridSpec, PageFormat};
use crate::rendering::{encode_png, thumbnail, EncodedTile, SourceImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Ready,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

/// Broadcast after every pipeline stage and when the job finishes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressEvent {
    pub status: JobStatus,
    pub tile_index: usize,
    pub total_tiles: usize,
    pub stage: Option<PipelineStage>,
    pub error: Option<String>,
}

/// Point-in-time view of a job.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    pub cols: u32,
    pub rows: u32,
    pub layout: PageLayout,
    pub tile_width: u32,
    pub tile_height: u32,
    pub completed_tiles: usize,
    pub total_tiles: usize,
    pub stage: Option<PipelineStage>,
    pub error: Option<String>,
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

struct JobProgress {
    status: JobStatus,
    tile_index: usize,
    completed_tiles: usize,
    stage: Option<PipelineStage>,
    error: Option<String>,
    preview_png: Option<Vec<u8>>,
    tiles: Vec<EncodedTile>,
    finished_at: Option<Instant>,
}

pub struct Job {
    id: String,
    grid: GridSpec,
    page: PageFormat,
    thumbnail_edge: u32,
    created_at: DateTime<Utc>,
    cancel: CancelToken,
    events: broadcast::Sender<ProgressEvent>,
    progress: Mutex<JobProgress>,
}

impl Job {
    fn new(grid: GridSpec, page: PageFormat, thumbnail_edge: u32) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            id: format!("{:016x}", rand::random::<u64>()),
            grid,
            page,
            thumbnail_edge,
            created_at: Utc::now(),
            cancel: CancelToken::new(),
            events,
            progress: Mutex::new(JobProgress {
                status: JobStatus::Processing,
                tile_index: 0,
                completed_tiles: 0,
                stage: None,
                error: None,
                preview_png: None,
                tiles: Vec::new(),
                finished_at: None,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    pub fn layout(&self) -> PageLayout {
        PageLayout::new(&self.page, self.grid.orientation())
    }

    pub fn tile_size(&self) -> (u32, u32) {
        self.page.oriented(self.grid.orientation()).pixel_size()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    // A panicking observer must not wedge the job for every later reader
    fn lock(&self) -> MutexGuard<'_, JobProgress> {
        self.progress.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> JobSnapshot {
        let progress = self.lock();
        let (tile_width, tile_height) = self.tile_size();
        JobSnapshot {
            id: self.id.clone(),
            status: progress.status,
            cols: self.grid.cols(),
            rows: self.grid.rows(),
            layout: self.layout(),
            tile_width,
            tile_height,
            completed_tiles: progress.completed_tiles,
            total_tiles: self.grid.tile_count(),
            stage: progress.stage,
            error: progress.error.clone(),
            created_at: self.created_at,
        }
    }

    /// The latest event, for subscribers that join late.
    pub fn current_event(&self) -> ProgressEvent {
        let progress = self.lock();
        ProgressEvent {
            status: progress.status,
            tile_index: progress.tile_index,
            total_tiles: self.grid.tile_count(),
            stage: progress.stage,
            error: progress.error.clone(),
        }
    }

    pub fn preview_png(&self) -> Option<Vec<u8>> {
        self.lock().preview_png.clone()
    }

    /// Time since the job finished, `None` while it is still processing.
    pub fn finished_for(&self) -> Option<Duration> {
        self.lock().finished_at.map(|at| at.elapsed())
    }

    /// Finished tiles, or `NotReady` until the job is done.
    pub fn tiles(&self) -> Result<Vec<EncodedTile>, PipelineError> {
        let progress = self.lock();
        match progress.status {
            JobStatus::Ready => Ok(progress.tiles.clone()),
            _ => Err(PipelineError::NotReady),
        }
    }

    /// Run the pipeline to completion on the calling thread.
    pub fn run(&self, source: SourceImage) {
        let mut pipeline = TilePipeline::with_page_format(self.grid, self.page);
        pipeline.load_image(source);

        let mut observer = JobObserver { job: self };
        let result = pipeline
            .run(&self.cancel, &mut observer)
            .map(|tiles| tiles.to_vec());

        let event = {
            let mut progress = self.lock();
            progress.finished_at = Some(Instant::now());
            match result {
                Ok(tiles) => {
                    progress.status = JobStatus::Ready;
                    progress.completed_tiles = tiles.len();
                    progress.tiles = tiles;
                    tracing::info!(job = %self.id, tiles = progress.tiles.len(), "Job ready");
                }
                Err(PipelineError::Cancelled) => {
                    progress.status = JobStatus::Cancelled;
                    tracing::info!(job = %self.id, "Job cancelled");
                }
                Err(e) => {
                    progress.status = JobStatus::Failed;
                    progress.error = Some(e.to_string());
                    tracing::error!(job = %self.id, error = %e, "Job failed");
                }
            }
            ProgressEvent {
                status: progress.status,
                tile_index: progress.tile_index,
                total_tiles: self.grid.tile_count(),
                stage: progress.stage,
                error: progress.error.clone(),
            }
        };
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

struct JobObserver<'a> {
    job: &'a Job,
}

impl ProgressObserver for JobObserver<'_> {
    fn on_progress(&mut self, update: &ProgressUpdate<'_>) {
        let preview = thumbnail(update.preview, self.job.thumbnail_edge)
            .and_then(|thumb| encode_png(&thumb));
        if let Err(e) = &preview {
            tracing::warn!(job = %self.job.id, error = %e, "Failed to encode tile preview");
        }

        let event = {
            let mut progress = self.job.lock();
            progress.tile_index = update.tile_index;
            progress.stage = Some(update.stage);
            if update.stage == PipelineStage::Encode {
                progress.completed_tiles = update.tile_index + 1;
            }
            if let Ok(png) = preview {
                progress.preview_png = Some(png);
            }
            ProgressEvent {
                status: progress.status,
                tile_index: update.tile_index,
                total_tiles: update.total_tiles,
                stage: Some(update.stage),
                error: None,
            }
        };
        let _ = self.job.events.send(event);
    }
}

/// Bounds on what the registry keeps and runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobLimits {
    /// How long a finished job is kept
    pub retention: Duration,
    /// Finished jobs beyond this count are evicted, oldest first
    pub max_jobs: usize,
    /// Jobs rendering at once; later submissions wait for a slot
    pub max_concurrent: usize,
}

impl Default for JobLimits {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(3600),
            max_jobs: 32,
            max_concurrent: 2,
        }
    }
}

/// In-memory job storage
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Arc<Job>>>,
    page: PageFormat,
    thumbnail_edge: u32,
    limits: JobLimits,
    workers: Arc<Semaphore>,
}

impl JobRegistry {
    pub fn new(page: PageFormat, thumbnail_edge: u32) -> Self {
        Self::with_limits(page, thumbnail_edge, JobLimits::default())
    }

    pub fn with_limits(page: PageFormat, thumbnail_edge: u32, limits: JobLimits) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            page,
            thumbnail_edge,
            workers: Arc::new(Semaphore::new(limits.max_concurrent.max(1))),
            limits,
        }
    }

    /// Register a job and queue it for the blocking pool.
    ///
    /// The job reports `processing` while it waits for a worker slot.
    pub async fn submit(&self, source: SourceImage, grid: GridSpec) -> Arc<Job> {
        let job = Arc::new(Job::new(grid, self.page, self.thumbnail_edge));
        self.jobs
            .write()
            .await
            .insert(job.id.clone(), job.clone());

        tracing::info!(
            job = %job.id,
            cols = grid.cols(),
            rows = grid.rows(),
            source_width = source.width(),
            source_height = source.height(),
            "Job submitted"
        );

        let workers = self.workers.clone();
        let worker = job.clone();
        tokio::spawn(async move {
            let permit = match workers.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(job = %worker.id, error = %e, "Worker pool closed");
                    return;
                }
            };
            let id = worker.id.clone();
            let result = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                worker.run(source);
            })
            .await;
            if let Err(e) = result {
                tracing::error!(job = %id, error = %e, "Job worker panicked");
            }
        });

        self.sweep().await;
        job
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Job>> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Cancel and forget a job. Returns false if it was unknown.
    pub async fn remove(&self, id: &str) -> bool {
        match self.jobs.write().await.remove(id) {
            Some(job) => {
                job.cancel();
                tracing::info!(job = %id, "Job removed");
                true
            }
            None => false,
        }
    }

    /// Evict finished jobs past their retention, then the oldest finished
    /// jobs while the registry is over `max_jobs`. Jobs still processing are
    /// never evicted. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();

        let retention = self.limits.retention;
        jobs.retain(|_, job| !job.finished_for().is_some_and(|age| age >= retention));

        if jobs.len() > self.limits.max_jobs {
            let mut finished: Vec<(Duration, String)> = jobs
                .values()
                .filter_map(|job| job.finished_for().map(|age| (age, job.id.clone())))
                .collect();
            finished.sort_by(|a, b| b.0.cmp(&a.0));

            let excess = jobs.len() - self.limits.max_jobs;
            for (_, id) in finished.into_iter().take(excess) {
                jobs.remove(&id);
            }
        }

        let evicted = before - jobs.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = jobs.len(), "Evicted finished jobs");
        }
        evicted
    }

    /// Sweep every `period` until the registry is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match registry.upgrade() {
                    Some(registry) => {
                        registry.sweep().await;
                    }
                    None => break,
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new(PageFormat::A4, 512)
    }
}
