//! Interior-only 3x3 convolution.

use super::kernel::{Kernel3x3, SHARPEN};
use crate::buffer::TileBuffer;

/// Sharpen a tile with the fixed [`SHARPEN`] kernel.
///
/// # Example
///
/// ```
/// use print_enhance::{sharpen, TileBuffer};
///
/// let mut tile = TileBuffer::filled(3, 3, [100, 100, 100, 255]);
/// tile.set_pixel(1, 1, [120, 120, 120, 255]);
///
/// let out = sharpen(&tile);
/// // 5 * 120 - 4 * 100 = 200
/// assert_eq!(out.pixel(1, 1), [200, 200, 200, 255]);
/// // Border pixels are copied through
/// assert_eq!(out.pixel(0, 0), [100, 100, 100, 255]);
/// ```
pub fn sharpen(src: &TileBuffer) -> TileBuffer {
    convolve(src, &SHARPEN)
}

/// Convolve the RGB channels of `src` with `kernel` into a new buffer.
///
/// Pixels with `x == 0`, `x == W-1`, `y == 0` or `y == H-1` are copied
/// unchanged. Every other pixel gets the full 3x3 weighted sum, clamped to
/// `[0, 255]`. Alpha is copied through for all pixels. Buffers narrower or
/// shorter than 3 pixels have no interior and come back as an exact copy.
pub fn convolve(src: &TileBuffer, kernel: &Kernel3x3) -> TileBuffer {
    let width = src.width();
    let height = src.height();
    let mut out = src.clone();

    if width < 3 || height < 3 {
        return out;
    }

    let stride = width * TileBuffer::CHANNELS;
    let input = src.as_rgba();
    let output = out.as_rgba_mut();

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let base = y * stride + x * TileBuffer::CHANNELS;
            for ch in 0..3 {
                let mut sum = 0i32;
                for (ky, row) in kernel.weights.iter().enumerate() {
                    for (kx, &weight) in row.iter().enumerate() {
                        if weight == 0 {
                            continue;
                        }
                        let ny = y + ky - 1;
                        let nx = x + kx - 1;
                        let i = ny * stride + nx * TileBuffer::CHANNELS + ch;
                        sum += input[i] as i32 * weight;
                    }
                }
                output[base + ch] = sum.clamp(0, 255) as u8;
            }
        }
    }

    out
}
