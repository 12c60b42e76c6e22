//! Error type for the print-enhance crate.
//!
//! The filters themselves are total functions; the only fallible operation
//! is wrapping caller-supplied bytes in a [`TileBuffer`](crate::TileBuffer).

use std::fmt;

/// Error returned when raw pixel data cannot form a tile buffer.
///
/// # Example
///
/// ```
/// use print_enhance::{EnhanceError, TileBuffer};
///
/// let err = TileBuffer::from_rgba(vec![0; 7], 1, 2).unwrap_err();
/// assert_eq!(
///     err,
///     EnhanceError::LengthMismatch { expected: 8, actual: 7 }
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhanceError {
    /// Width or height was zero.
    ZeroDimension { width: usize, height: usize },
    /// The byte count does not match `width * height * 4`.
    LengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for EnhanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnhanceError::ZeroDimension { width, height } => {
                write!(f, "tile dimensions must be non-zero, got {}x{}", width, height)
            }
            EnhanceError::LengthMismatch { expected, actual } => write!(
                f,
                "RGBA data length mismatch: expected {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for EnhanceError {}
