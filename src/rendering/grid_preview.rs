//! Low-resolution preview of the source with the cut grid drawn on top.

use print_enhance::{HslBoost, TileBuffer};
use tiny_skia::{Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use super::geometry::{SourceRegion, WallLayout};
use super::sampler::{fit_within, pixmap_to_buffer, sample_region, SourceImage};
use crate::error::RenderError;
use crate::models::{GridSpec, PageFormat};

/// Long edge of the preview in pixels
pub const PREVIEW_MAX_EDGE: u32 = 1200;

const CUT_LINE_WIDTH: f32 = 2.0;
const CUT_LINE_RGBA: [u8; 4] = [255, 0, 0, 179];
const CROP_SHADE_RGBA: [u8; 4] = [0, 0, 0, 115];

/// Render the whole source at preview size with the wall grid marked.
///
/// Colors get the [`HslBoost`] treatment. Source outside the wall is shaded,
/// and interior cut lines are stroked in translucent red.
pub fn render_grid_preview(
    source: &SourceImage,
    grid: &GridSpec,
    page: &PageFormat,
) -> Result<TileBuffer, RenderError> {
    let (width, height) = fit_within(source.width(), source.height(), PREVIEW_MAX_EDGE);
    let mut preview = sample_region(source, &source.bounds(), width, height)?;
    HslBoost::preview().apply(&mut preview);

    let (tile_width, tile_height) = page.oriented(grid.orientation()).pixel_size();
    let layout = WallLayout::resolve(source.width(), source.height(), grid, tile_width, tile_height);
    let scale = width as f64 / source.width() as f64;

    let mut pixmap = SourceImage::from_buffer(&preview)?.into_pixmap();
    shade_outside(&mut pixmap, &scaled(&layout.wall(), scale));
    stroke_cut_lines(&mut pixmap, &layout, scale);

    tracing::debug!(
        width,
        height,
        cols = grid.cols(),
        rows = grid.rows(),
        "Rendered grid preview"
    );
    pixmap_to_buffer(&pixmap)
}

fn scaled(region: &SourceRegion, scale: f64) -> SourceRegion {
    SourceRegion {
        x: region.x * scale,
        y: region.y * scale,
        width: region.width * scale,
        height: region.height * scale,
    }
}

fn solid(rgba: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
    paint.anti_alias = true;
    paint
}

/// Darken the cropped bands around the wall.
fn shade_outside(pixmap: &mut Pixmap, wall: &SourceRegion) {
    let paint = solid(CROP_SHADE_RGBA);
    let w = pixmap.width() as f32;
    let h = pixmap.height() as f32;
    let (left, top) = (wall.x as f32, wall.y as f32);
    let (right, bottom) = (wall.right() as f32, wall.bottom() as f32);

    let bands = [
        Rect::from_xywh(0.0, 0.0, w, top),
        Rect::from_xywh(0.0, bottom, w, h - bottom),
        Rect::from_xywh(0.0, top, left, bottom - top),
        Rect::from_xywh(right, top, w - right, bottom - top),
    ];
    // Bands thinner than a pixel fraction come back as None
    for band in bands.into_iter().flatten() {
        if band.width() >= 0.5 && band.height() >= 0.5 {
            pixmap.fill_rect(band, &paint, Transform::identity(), None);
        }
    }
}

fn stroke_cut_lines(pixmap: &mut Pixmap, layout: &WallLayout, scale: f64) {
    let wall = scaled(&layout.wall(), scale);
    let (xs, ys) = layout.cut_lines();
    if xs.is_empty() && ys.is_empty() {
        return;
    }

    let mut pb = PathBuilder::new();
    for x in xs {
        let x = (x * scale) as f32;
        pb.move_to(x, wall.y as f32);
        pb.line_to(x, wall.bottom() as f32);
    }
    for y in ys {
        let y = (y * scale) as f32;
        pb.move_to(wall.x as f32, y);
        pb.line_to(wall.right() as f32, y);
    }

    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width: CUT_LINE_WIDTH,
            ..Stroke::default()
        };
        pixmap.stroke_path(
            &path,
            &solid(CUT_LINE_RGBA),
            &stroke,
            Transform::identity(),
            None,
        );
    }
}
