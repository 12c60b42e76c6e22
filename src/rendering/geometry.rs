//! Mapping a source image onto a wall of equally sized pages.
//!
//! The wall is the largest rectangle, centered in the source, whose aspect
//! ratio equals the aspect ratio of the assembled grid. Excess source along
//! one axis is cropped, never stretched. The wall is then cut into
//! `cols x rows` equal cells; each cell is the source region one page samples.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::GridSpec;

/// An axis-aligned rectangle in source pixel coordinates.
///
/// Coordinates are fractional: cell boundaries rarely land on whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SourceRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SourceRegion {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// The resolved wall rectangle and its grid of cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallLayout {
    wall: SourceRegion,
    cols: u32,
    rows: u32,
}

impl WallLayout {
    /// Fit a `grid` of `tile_width x tile_height` pages onto a source image.
    pub fn resolve(
        source_width: u32,
        source_height: u32,
        grid: &GridSpec,
        tile_width: u32,
        tile_height: u32,
    ) -> Self {
        let ws = source_width as f64;
        let hs = source_height as f64;
        let wall_ratio =
            (tile_width as f64 * grid.cols() as f64) / (tile_height as f64 * grid.rows() as f64);
        let image_ratio = ws / hs;

        let wall = if wall_ratio > image_ratio {
            // Wall is wider than the image: keep full width, crop top/bottom
            let height = ws / wall_ratio;
            SourceRegion {
                x: 0.0,
                y: (hs - height) / 2.0,
                width: ws,
                height,
            }
        } else {
            // Keep full height, crop left/right
            let width = hs * wall_ratio;
            SourceRegion {
                x: (ws - width) / 2.0,
                y: 0.0,
                width,
                height: hs,
            }
        };

        tracing::debug!(
            source_width,
            source_height,
            wall_ratio,
            image_ratio,
            wall_x = wall.x,
            wall_y = wall.y,
            wall_width = wall.width,
            wall_height = wall.height,
            "Resolved wall rectangle"
        );

        Self {
            wall,
            cols: grid.cols(),
            rows: grid.rows(),
        }
    }

    pub fn wall(&self) -> SourceRegion {
        self.wall
    }

    pub fn cell_width(&self) -> f64 {
        self.wall.width / self.cols as f64
    }

    pub fn cell_height(&self) -> f64 {
        self.wall.height / self.rows as f64
    }

    pub fn tile_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Source region sampled by the cell at `row`, `col`.
    pub fn region(&self, row: u32, col: u32) -> SourceRegion {
        let width = self.cell_width();
        let height = self.cell_height();
        SourceRegion {
            x: self.wall.x + col as f64 * width,
            y: self.wall.y + row as f64 * height,
            width,
            height,
        }
    }

    /// Source region of the tile at a row-major index.
    pub fn region_at(&self, index: usize) -> SourceRegion {
        let cols = self.cols as usize;
        self.region((index / cols) as u32, (index % cols) as u32)
    }

    /// All cell regions in row-major order.
    pub fn regions(&self) -> impl Iterator<Item = SourceRegion> + '_ {
        (0..self.tile_count()).map(|i| self.region_at(i))
    }

    /// Interior cut line positions: `(vertical x positions, horizontal y positions)`.
    pub fn cut_lines(&self) -> (Vec<f64>, Vec<f64>) {
        let xs = (1..self.cols)
            .map(|c| self.wall.x + c as f64 * self.cell_width())
            .collect();
        let ys = (1..self.rows)
            .map(|r| self.wall.y + r as f64 * self.cell_height())
            .collect();
        (xs, ys)
    }
}
