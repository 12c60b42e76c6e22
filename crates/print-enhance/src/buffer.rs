//! Raw RGBA tile buffer.
//!
//! [`TileBuffer`] is the unit of work handed between pipeline stages. It is
//! created fresh for every tile, mutated by the color stage, replaced by the
//! sharpening stage and finally encoded and dropped.

use crate::error::EnhanceError;

/// An owned RGBA8 pixel buffer in row-major order.
///
/// # Example
///
/// ```
/// use print_enhance::TileBuffer;
///
/// let mut tile = TileBuffer::filled(3, 2, [10, 20, 30, 255]);
/// tile.set_pixel(2, 1, [255, 0, 0, 255]);
///
/// assert_eq!(tile.pixel(0, 0), [10, 20, 30, 255]);
/// assert_eq!(tile.pixel(2, 1), [255, 0, 0, 255]);
/// assert_eq!(tile.as_rgba().len(), 3 * 2 * 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl TileBuffer {
    /// Bytes per pixel.
    pub const CHANNELS: usize = 4;

    /// Create a buffer filled with a single RGBA color.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Self {
        assert!(
            width > 0 && height > 0,
            "tile dimensions must be non-zero, got {}x{}",
            width,
            height
        );
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width * height * Self::CHANNELS)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap existing RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EnhanceError::ZeroDimension`] for an empty tile and
    /// [`EnhanceError::LengthMismatch`] when `data.len() != width * height * 4`.
    pub fn from_rgba(data: Vec<u8>, width: usize, height: usize) -> Result<Self, EnhanceError> {
        if width == 0 || height == 0 {
            return Err(EnhanceError::ZeroDimension { width, height });
        }
        let expected = width * height * Self::CHANNELS;
        if data.len() != expected {
            return Err(EnhanceError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    #[inline]
    pub fn as_rgba(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw RGBA bytes, row-major.
    #[inline]
    pub fn as_rgba_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y * self.width + x) * Self::CHANNELS
    }

    /// Read one pixel.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Overwrite one pixel.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.data[i..i + Self::CHANNELS].copy_from_slice(&rgba);
    }

    /// Packed RGB bytes with the alpha channel dropped.
    ///
    /// Used by encoders that have no alpha channel (JPEG).
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.width * self.height * 3);
        for px in self.data.chunks_exact(Self::CHANNELS) {
            rgb.extend_from_slice(&px[..3]);
        }
        rgb
    }
}
