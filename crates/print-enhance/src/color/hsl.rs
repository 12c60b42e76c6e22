//! HSL preview boost.
//!
//! A quick "how will this look on paper" adjustment for grid previews:
//! saturation is scaled in HSL space (capped at 1) and lightness is
//! stretched around 0.5. This is deliberately not the print correction.

use crate::buffer::TileBuffer;

/// Saturation and lightness-contrast boost in HSL space.
///
/// # Example
///
/// ```
/// use print_enhance::{HslBoost, TileBuffer};
///
/// let mut preview = TileBuffer::filled(1, 1, [255, 0, 0, 255]);
/// HslBoost::preview().apply(&mut preview);
///
/// // Fully saturated mid-lightness red has nothing left to boost
/// assert_eq!(preview.pixel(0, 0), [255, 0, 0, 255]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HslBoost {
    saturation: f32,
    contrast: f32,
}

impl Default for HslBoost {
    fn default() -> Self {
        Self::preview()
    }
}

impl HslBoost {
    /// Preview preset: saturation x1.25, lightness contrast x1.15.
    #[inline]
    pub const fn preview() -> Self {
        Self {
            saturation: 1.25,
            contrast: 1.15,
        }
    }

    /// Boost every pixel of the buffer in place. Alpha is untouched.
    pub fn apply(&self, buffer: &mut TileBuffer) {
        for px in buffer
            .as_rgba_mut()
            .chunks_exact_mut(TileBuffer::CHANNELS)
        {
            let [r, g, b] = self.boost_rgb([px[0], px[1], px[2]]);
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }

    /// Boost a single RGB triple.
    pub fn boost_rgb(&self, rgb: [u8; 3]) -> [u8; 3] {
        let (h, s, l) = rgb_to_hsl(rgb);
        let s = (s * self.saturation).min(1.0);
        let l = ((l - 0.5) * self.contrast + 0.5).clamp(0.0, 1.0);
        hsl_to_rgb(h, s, l)
    }
}

/// RGB bytes to (hue, saturation, lightness), all in `[0, 1]`.
fn rgb_to_hsl(rgb: [u8; 3]) -> (f32, f32, f32) {
    let [r, g, b] = rgb.map(|v| v as f32);
    let mx = r.max(g).max(b);
    let mn = r.min(g).min(b);
    let l = (mx + mn) / 2.0 / 255.0;

    if mx == mn {
        return (0.0, 0.0, l);
    }

    let d = mx - mn;
    let s = if l > 0.5 {
        d / (2.0 * 255.0 - mx - mn)
    } else {
        d / (mx + mn)
    };
    let h = if mx == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if mx == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h / 6.0, s, l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [u8; 3] {
    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_channel(p, q, h + 1.0 / 3.0),
            hue_to_channel(p, q, h),
            hue_to_channel(p, q, h - 1.0 / 3.0),
        )
    };
    [r, g, b].map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
