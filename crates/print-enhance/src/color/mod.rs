//! Per-pixel color adjustments.
//!
//! - [`ColorCorrection`]: the print correction applied to every tile
//!   (contrast, brightness, luma-anchored saturation).
//! - [`HslBoost`]: the lighter HSL-space boost used for grid previews.

mod correct;
mod hsl;

pub use correct::ColorCorrection;
pub use hsl::HslBoost;
