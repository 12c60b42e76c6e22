//! Stepwise tile production: sample, correct, sharpen, encode.
//!
//! A [`TilePipeline`] turns one source image into `cols x rows` encoded
//! pages. Work is broken into one stage per [`TilePipeline::step`] so a
//! caller can observe progress, interleave other work, or cancel between
//! stages. [`TilePipeline::run`] drives the steps to completion.

use print_enhance::{sharpen, ColorCorrection, TileBuffer};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use utoipa::ToSchema;

use super::document::{DocumentSink, PageLayout};
use crate::error::PipelineError;
use crate::models::{GridSpec, PageFormat};
use crate::rendering::{
    encode_jpeg, sample_region, EncodedTile, SourceImage, WallLayout, TILE_JPEG_QUALITY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Idle,
    Processing,
    Ready,
}

/// A per-tile stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    Sample,
    Correct,
    Sharpen,
    Encode,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Sample => "sample",
            PipelineStage::Correct => "correct",
            PipelineStage::Sharpen => "sharpen",
            PipelineStage::Encode => "encode",
        }
    }
}

/// Emitted after every completed stage.
#[derive(Debug)]
pub struct ProgressUpdate<'a> {
    pub tile_index: usize,
    pub total_tiles: usize,
    pub stage: PipelineStage,
    /// The tile as it stands after `stage`
    pub preview: &'a TileBuffer,
}

/// Receives progress from a running pipeline.
pub trait ProgressObserver {
    fn on_progress(&mut self, update: &ProgressUpdate<'_>);
}

/// Observer that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&mut self, _update: &ProgressUpdate<'_>) {}
}

/// Shared flag checked between stages by [`TilePipeline::run`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What the next call to `step` will do. Carries the in-flight tile.
enum NextStep {
    Sample,
    Correct(TileBuffer),
    Sharpen(TileBuffer),
    Encode(TileBuffer),
}

pub struct TilePipeline {
    grid: GridSpec,
    page: PageFormat,
    correction: ColorCorrection,
    source: Option<SourceImage>,
    layout: Option<WallLayout>,
    status: PipelineStatus,
    current_tile_index: usize,
    total_tiles: usize,
    next: NextStep,
    output: Vec<EncodedTile>,
}

impl TilePipeline {
    /// A4 pages at 300 DPI.
    pub fn new(grid: GridSpec) -> Self {
        Self::with_page_format(grid, PageFormat::A4)
    }

    pub fn with_page_format(grid: GridSpec, page: PageFormat) -> Self {
        Self {
            grid,
            page,
            correction: ColorCorrection::print(),
            source: None,
            layout: None,
            status: PipelineStatus::Idle,
            current_tile_index: 0,
            total_tiles: 0,
            next: NextStep::Sample,
            output: Vec::new(),
        }
    }

    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    /// Page format turned to the grid's orientation.
    pub fn page_format(&self) -> PageFormat {
        self.page.oriented(self.grid.orientation())
    }

    /// Pixel size of every output tile.
    pub fn tile_size(&self) -> (u32, u32) {
        self.page_format().pixel_size()
    }

    pub fn page_layout(&self) -> PageLayout {
        PageLayout::new(&self.page, self.grid.orientation())
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    pub fn current_tile_index(&self) -> usize {
        self.current_tile_index
    }

    pub fn total_tiles(&self) -> usize {
        self.total_tiles
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Replace the source image. Any run in progress or finished is discarded.
    pub fn load_image(&mut self, source: SourceImage) {
        tracing::debug!(
            width = source.width(),
            height = source.height(),
            "Loaded source image"
        );
        self.clear_run();
        self.source = Some(source);
    }

    /// Decode and load an encoded image. On failure the pipeline is unchanged.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<(), PipelineError> {
        let source = SourceImage::decode(bytes)?;
        self.load_image(source);
        Ok(())
    }

    /// Change the grid. Any run in progress or finished is discarded.
    pub fn set_grid(&mut self, grid: GridSpec) {
        if grid != self.grid {
            self.clear_run();
            self.grid = grid;
        }
    }

    /// Begin a run. A run already in progress is left alone.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.status == PipelineStatus::Processing {
            return Ok(());
        }
        let source = self.source.as_ref().ok_or(PipelineError::MissingSource)?;
        let (tile_width, tile_height) = self.tile_size();
        let layout = WallLayout::resolve(
            source.width(),
            source.height(),
            &self.grid,
            tile_width,
            tile_height,
        );

        self.total_tiles = layout.tile_count();
        self.layout = Some(layout);
        self.current_tile_index = 0;
        self.output.clear();
        self.next = NextStep::Sample;
        self.status = PipelineStatus::Processing;

        tracing::info!(
            cols = self.grid.cols(),
            rows = self.grid.rows(),
            orientation = %self.grid.orientation(),
            tile_width,
            tile_height,
            "Starting tile run"
        );
        Ok(())
    }

    /// Run exactly one stage of the current tile.
    ///
    /// A failing stage aborts the whole run: the pipeline returns to idle and
    /// tiles produced so far are discarded.
    pub fn step(
        &mut self,
        observer: &mut dyn ProgressObserver,
    ) -> Result<PipelineStage, PipelineError> {
        if self.status != PipelineStatus::Processing {
            return Err(PipelineError::NotRunning);
        }

        let index = self.current_tile_index;
        let pending = std::mem::replace(&mut self.next, NextStep::Sample);
        let (stage, tile) = match self.execute(pending, index) {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!(tile = index, error = %e, "Tile stage failed, aborting run");
                self.clear_run();
                return Err(e);
            }
        };

        tracing::debug!(tile = index, stage = stage.label(), "Stage complete");
        observer.on_progress(&ProgressUpdate {
            tile_index: index,
            total_tiles: self.total_tiles,
            stage,
            preview: &tile,
        });

        self.next = match stage {
            PipelineStage::Sample => NextStep::Correct(tile),
            PipelineStage::Correct => NextStep::Sharpen(tile),
            PipelineStage::Sharpen => NextStep::Encode(tile),
            PipelineStage::Encode => {
                self.current_tile_index += 1;
                if self.current_tile_index == self.total_tiles {
                    self.status = PipelineStatus::Ready;
                    tracing::info!(tiles = self.total_tiles, "All tiles ready");
                }
                NextStep::Sample
            }
        };
        Ok(stage)
    }

    fn execute(
        &mut self,
        pending: NextStep,
        index: usize,
    ) -> Result<(PipelineStage, TileBuffer), PipelineError> {
        match pending {
            NextStep::Sample => {
                let source = self.source.as_ref().ok_or(PipelineError::MissingSource)?;
                let layout = self.layout.as_ref().ok_or(PipelineError::NotRunning)?;
                let (width, height) = self.tile_size();
                let tile = sample_region(source, &layout.region_at(index), width, height)?;
                Ok((PipelineStage::Sample, tile))
            }
            NextStep::Correct(mut tile) => {
                self.correction.apply(&mut tile);
                Ok((PipelineStage::Correct, tile))
            }
            NextStep::Sharpen(tile) => Ok((PipelineStage::Sharpen, sharpen(&tile))),
            NextStep::Encode(tile) => {
                let jpeg = encode_jpeg(&tile, TILE_JPEG_QUALITY)?;
                self.output.push(EncodedTile {
                    index,
                    width: tile.width() as u32,
                    height: tile.height() as u32,
                    jpeg,
                });
                Ok((PipelineStage::Encode, tile))
            }
        }
    }

    /// Start if needed and step until every tile is encoded.
    ///
    /// `cancel` is checked before each stage. Cancelling discards the run
    /// and returns [`PipelineError::Cancelled`]; the source stays loaded.
    pub fn run(
        &mut self,
        cancel: &CancelToken,
        observer: &mut dyn ProgressObserver,
    ) -> Result<&[EncodedTile], PipelineError> {
        if self.status == PipelineStatus::Idle {
            self.start()?;
        }
        while self.status == PipelineStatus::Processing {
            if cancel.is_cancelled() {
                tracing::info!(tile = self.current_tile_index, "Run cancelled");
                self.clear_run();
                return Err(PipelineError::Cancelled);
            }
            self.step(observer)?;
        }
        self.output()
    }

    /// Encoded tiles in row-major order, once every tile is done.
    pub fn output(&self) -> Result<&[EncodedTile], PipelineError> {
        match self.status {
            PipelineStatus::Ready => Ok(&self.output),
            _ => Err(PipelineError::NotReady),
        }
    }

    /// Hand the finished tiles to a document sink. The output is kept.
    pub fn assemble(&self, sink: &dyn DocumentSink) -> Result<Vec<u8>, PipelineError> {
        let tiles = self.output()?;
        if !sink.is_ready() {
            return Err(PipelineError::AssemblyUnavailable(
                "document sink is not ready".to_string(),
            ));
        }
        Ok(sink.assemble(tiles, &self.page_layout())?)
    }

    /// Return to idle and drop the source image.
    pub fn reset(&mut self) {
        self.clear_run();
        self.source = None;
    }

    fn clear_run(&mut self) {
        self.status = PipelineStatus::Idle;
        self.current_tile_index = 0;
        self.total_tiles = 0;
        self.layout = None;
        self.next = NextStep::Sample;
        self.output.clear();
    }
}
