//! 3x3 convolution sharpening.
//!
//! [`sharpen`] runs the fixed [`SHARPEN`] kernel over a tile and returns a
//! new buffer. Only interior pixels are convolved; the outermost ring is
//! copied as-is.

mod convolve;
mod kernel;

pub use convolve::{convolve, sharpen};
pub use kernel::{Kernel3x3, SHARPEN};
