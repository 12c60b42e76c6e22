//! End-to-end pipeline scenarios without the HTTP layer.

mod common;

use common::fixtures;
use pretty_assertions::assert_eq;
use tilewall::error::PipelineError;
use tilewall::models::{GridSpec, Orientation, PageFormat};
use tilewall::rendering::WallLayout;
use tilewall::services::{
    CancelToken, NoopObserver, PdfAssembler, PipelineStage, PipelineStatus, ProgressObserver,
    ProgressUpdate, TilePipeline,
};

#[derive(Default)]
struct StageLog(Vec<(usize, PipelineStage)>);

impl ProgressObserver for StageLog {
    fn on_progress(&mut self, update: &ProgressUpdate<'_>) {
        self.0.push((update.tile_index, update.stage));
    }
}

#[test]
fn test_wide_image_two_portrait_a4_tiles() {
    // 4000x2000 source, 2x1 portrait A4 at 300 DPI
    let grid = GridSpec::new(2, 1, Orientation::Portrait).unwrap();
    let mut pipeline = TilePipeline::new(grid);
    pipeline
        .load_bytes(&fixtures::gradient_png(4000, 2000))
        .unwrap();
    assert_eq!(pipeline.tile_size(), (2480, 3508));

    let tiles = pipeline.run(&CancelToken::new(), &mut NoopObserver).unwrap();
    assert_eq!(tiles.len(), 2);
    for (i, tile) in tiles.iter().enumerate() {
        assert_eq!(tile.index, i);
        assert_eq!((tile.width, tile.height), (2480, 3508));

        let decoded = image::load_from_memory(&tile.jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2480, 3508));
    }

    // The left tile is redder than the right one
    let left = image::load_from_memory(&tiles[0].jpeg).unwrap().to_rgb8();
    let right = image::load_from_memory(&tiles[1].jpeg).unwrap().to_rgb8();
    let lp = left.get_pixel(1240, 1754).0;
    let rp = right.get_pixel(1240, 1754).0;
    assert!(lp[0] > rp[0] && lp[2] < rp[2], "left {lp:?} right {rp:?}");

    let pdf = pipeline.assemble(&PdfAssembler::new()).unwrap();
    let doc = lopdf::Document::load_mem(&pdf).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn test_wide_image_wall_geometry() {
    let grid = GridSpec::new(2, 1, Orientation::Portrait).unwrap();
    let (tw, th) = PageFormat::A4.pixel_size();
    let layout = WallLayout::resolve(4000, 2000, &grid, tw, th);

    let first = layout.region(0, 0);
    let second = layout.region(0, 1);
    assert_eq!(first.x.round(), 586.0);
    assert_eq!(first.y, 0.0);
    assert_eq!(first.width.round(), 1414.0);
    assert_eq!(first.height, 2000.0);
    assert_eq!(second.x.round(), 2000.0);
    assert_eq!(second.width.round(), 1414.0);
}

#[test]
fn test_small_dpi_run_visits_every_stage() {
    let grid = GridSpec::new(2, 2, Orientation::Landscape).unwrap();
    let page = PageFormat {
        dpi: 10.0,
        ..PageFormat::A4
    };
    let mut pipeline = TilePipeline::with_page_format(grid, page);
    pipeline
        .load_bytes(&fixtures::solid_jpeg(300, 200, [90, 120, 150]))
        .unwrap();

    let mut log = StageLog::default();
    let tiles = pipeline.run(&CancelToken::new(), &mut log).unwrap();
    assert_eq!(tiles.len(), 4);
    assert!(tiles.iter().all(|t| (t.width, t.height) == (117, 83)));

    assert_eq!(log.0.len(), 16);
    for (i, chunk) in log.0.chunks(4).enumerate() {
        let stages: Vec<_> = chunk.iter().map(|(_, s)| *s).collect();
        assert_eq!(
            stages,
            vec![
                PipelineStage::Sample,
                PipelineStage::Correct,
                PipelineStage::Sharpen,
                PipelineStage::Encode
            ]
        );
        assert!(chunk.iter().all(|(idx, _)| *idx == i));
    }
}

#[test]
fn test_reset_after_ready_then_new_image() {
    let grid = GridSpec::new(1, 2, Orientation::Portrait).unwrap();
    let page = PageFormat {
        dpi: 10.0,
        ..PageFormat::A4
    };
    let mut pipeline = TilePipeline::with_page_format(grid, page);
    pipeline.load_bytes(&fixtures::gradient_png(64, 64)).unwrap();
    pipeline.run(&CancelToken::new(), &mut NoopObserver).unwrap();
    assert_eq!(pipeline.status(), PipelineStatus::Ready);

    pipeline.reset();
    pipeline
        .load_bytes(&fixtures::solid_png(40, 40, [1, 2, 3, 255]))
        .unwrap();

    assert_eq!(pipeline.current_tile_index(), 0);
    assert_eq!(pipeline.status(), PipelineStatus::Idle);
    assert!(matches!(pipeline.output(), Err(PipelineError::NotReady)));
}

#[test]
fn test_undecodable_bytes_never_start() {
    let grid = GridSpec::new(1, 1, Orientation::Portrait).unwrap();
    let mut pipeline = TilePipeline::new(grid);
    let err = pipeline.load_bytes(fixtures::NOT_AN_IMAGE).unwrap_err();
    assert!(matches!(err, PipelineError::DecodeFailure(_)));
    assert!(matches!(pipeline.start(), Err(PipelineError::MissingSource)));
    assert_eq!(pipeline.status(), PipelineStatus::Idle);
}

#[test]
fn test_transparent_source_prints_white() {
    let grid = GridSpec::new(1, 1, Orientation::Portrait).unwrap();
    let page = PageFormat {
        dpi: 10.0,
        ..PageFormat::A4
    };
    let mut pipeline = TilePipeline::with_page_format(grid, page);
    pipeline
        .load_bytes(&fixtures::solid_png(50, 70, [0, 0, 0, 0]))
        .unwrap();
    let tiles = pipeline.run(&CancelToken::new(), &mut NoopObserver).unwrap();

    let decoded = image::load_from_memory(&tiles[0].jpeg).unwrap().to_rgb8();
    let px = decoded.get_pixel(40, 58).0;
    assert!(px.iter().all(|&c| c >= 250), "expected white, got {px:?}");
}
