#![allow(clippy::needless_range_loop)]

//! print-enhance: fixed print-enhancement filters for poster tiles
//!
//! This library holds the pixel-level half of the tile pipeline: a raw RGBA
//! buffer type and the two filters every printed tile goes through before it
//! is encoded.
//!
//! # Quick Start
//!
//! ```
//! use print_enhance::{sharpen, ColorCorrection, TileBuffer};
//!
//! let mut tile = TileBuffer::filled(4, 4, [120, 80, 40, 255]);
//!
//! ColorCorrection::print().apply(&mut tile);
//! let sharpened = sharpen(&tile);
//!
//! assert_eq!(sharpened.width(), 4);
//! assert_eq!(sharpened.height(), 4);
//! ```
//!
//! # Pipeline Overview
//!
//! ```text
//! TileBuffer (RGBA8, sampled from the source image)
//!     |
//!     v
//! [Color correction]      contrast 1.2, brightness +10, saturation 1.3
//!     |                   (in place, alpha untouched)
//!     v
//! [Sharpen 3x3]           [[0,-1,0],[-1,5,-1],[0,-1,0]]
//!     |                   (new buffer, border pixels copied verbatim)
//!     v
//! TileBuffer (ready for encoding)
//! ```
//!
//! # Filter Order
//!
//! Color correction always runs before sharpening. Sharpening amplifies
//! local differences, so running it on the corrected values is what gives
//! the printed output its final edge contrast. Swapping the two produces a
//! visibly different (and not intended) result.
//!
//! # Border Handling
//!
//! The sharpening convolution only touches interior pixels
//! (`1 <= x <= W-2`, `1 <= y <= H-2`). The outermost ring of pixels is copied
//! through unchanged; taps are never wrapped, clamped or renormalised.
//!
//! # Preview Boost
//!
//! [`HslBoost`] is a separate, lighter adjustment (HSL saturation and
//! lightness contrast) used only for on-screen grid previews. It is never
//! applied to printed tiles.

pub mod buffer;
pub mod color;
pub mod error;
pub mod sharpen;


pub use buffer::TileBuffer;
pub use color::{ColorCorrection, HslBoost};
pub use error::EnhanceError;
pub use sharpen::{convolve, sharpen, Kernel3x3, SHARPEN};
