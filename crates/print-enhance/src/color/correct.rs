//! Print color correction.
//!
//! Each RGB channel goes through a linear contrast/brightness stretch around
//! mid-grey (128), then saturation is scaled away from the pixel's luma:
//!
//! ```text
//! v'  = v * c + 128 * (1 - c) + b
//! y   = 0.2989 R' + 0.5870 G' + 0.1140 B'
//! v'' = y + (v' - y) * s
//! ```
//!
//! Only the final value is clamped to `[0, 255]`; the intermediate `v'`
//! values feed the luma unclamped. Alpha is never touched.

use crate::buffer::TileBuffer;

/// Luma weights applied to the contrast-adjusted channels.
const LUMA_R: f32 = 0.2989;
const LUMA_G: f32 = 0.5870;
const LUMA_B: f32 = 0.1140;

/// Contrast pivot.
const MIDPOINT: f32 = 128.0;

/// Contrast, brightness and saturation correction for printed tiles.
///
/// The print preset is fixed; there is no public way to build other factors.
///
/// # Example
///
/// ```
/// use print_enhance::{ColorCorrection, TileBuffer};
///
/// let mut tile = TileBuffer::filled(1, 1, [128, 128, 128, 200]);
/// ColorCorrection::print().apply(&mut tile);
///
/// // Grey stays grey, brightness lifts it by 10, alpha is untouched
/// assert_eq!(tile.pixel(0, 0), [138, 138, 138, 200]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCorrection {
    contrast: f32,
    saturation: f32,
    brightness: f32,
}

impl Default for ColorCorrection {
    fn default() -> Self {
        Self::print()
    }
}

impl ColorCorrection {
    /// The correction every printed tile receives: contrast 1.2,
    /// saturation 1.3, brightness +10.
    #[inline]
    pub const fn print() -> Self {
        Self {
            contrast: 1.2,
            saturation: 1.3,
            brightness: 10.0,
        }
    }

    #[inline]
    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    #[inline]
    pub fn saturation(&self) -> f32 {
        self.saturation
    }

    #[inline]
    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Correct every pixel of the buffer in place.
    pub fn apply(&self, buffer: &mut TileBuffer) {
        for px in buffer
            .as_rgba_mut()
            .chunks_exact_mut(TileBuffer::CHANNELS)
        {
            let [r, g, b] = self.correct_rgb([px[0], px[1], px[2]]);
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }

    /// Correct a single RGB triple.
    #[inline]
    pub fn correct_rgb(&self, rgb: [u8; 3]) -> [u8; 3] {
        let intercept = MIDPOINT * (1.0 - self.contrast);
        let stretch = |v: u8| v as f32 * self.contrast + intercept + self.brightness;

        let r = stretch(rgb[0]);
        let g = stretch(rgb[1]);
        let b = stretch(rgb[2]);

        let gray = LUMA_R * r + LUMA_G * g + LUMA_B * b;
        let saturate = |v: f32| to_channel(gray + (v - gray) * self.saturation);

        [saturate(r), saturate(g), saturate(b)]
    }
}

#[inline]
fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
