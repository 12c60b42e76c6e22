use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PipelineError;

/// Page orientation shared by every tile of a wall.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout of the wall: `cols` x `rows` pages in one orientation.
///
/// Only constructible through [`GridSpec::new`], so a value in hand always
/// has at least one column and one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct GridSpec {
    cols: u32,
    rows: u32,
    orientation: Orientation,
}

impl GridSpec {
    pub fn new(cols: u32, rows: u32, orientation: Orientation) -> Result<Self, PipelineError> {
        if cols == 0 || rows == 0 {
            return Err(PipelineError::InvalidGridSpec { cols, rows });
        }
        Ok(Self {
            cols,
            rows,
            orientation,
        })
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn tile_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Row and column of the tile at a row-major index.
    pub fn cell(&self, index: usize) -> (u32, u32) {
        let cols = self.cols as usize;
        ((index / cols) as u32, (index % cols) as u32)
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            cols: 2,
            rows: 2,
            orientation: Orientation::Portrait,
        }
    }
}
