pub mod encode;
pub mod geometry;
pub mod grid_preview;
pub mod sampler;

pub use encode::{encode_jpeg, encode_png, EncodedTile, TILE_JPEG_QUALITY};
pub use geometry::{SourceRegion, WallLayout};
pub use grid_preview::{render_grid_preview, PREVIEW_MAX_EDGE};
pub use sampler::{sample_region, thumbnail, SourceImage};
