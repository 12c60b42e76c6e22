//! Decoded source images and region resampling.

use print_enhance::TileBuffer;
use tiny_skia::{
    Color, ColorU8, FilterQuality, Paint, Pattern, Pixmap, Rect, SpreadMode, Transform,
};

use super::geometry::SourceRegion;
use crate::error::{PipelineError, RenderError};

/// A decoded source image held as a premultiplied pixmap.
///
/// Immutable once built; every tile samples from the same pixmap.
#[derive(Clone)]
pub struct SourceImage {
    pixmap: Pixmap,
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl SourceImage {
    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, PipelineError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| PipelineError::DecodeFailure(e.to_string()))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();

        let buffer = TileBuffer::from_rgba(decoded.into_raw(), width as usize, height as usize)
            .map_err(|e| PipelineError::DecodeFailure(e.to_string()))?;
        let source =
            Self::from_buffer(&buffer).map_err(|e| PipelineError::DecodeFailure(e.to_string()))?;

        tracing::debug!(width, height, "Decoded source image");
        Ok(source)
    }

    /// Build a source from straight-alpha RGBA pixels.
    pub fn from_buffer(buffer: &TileBuffer) -> Result<Self, RenderError> {
        let width = buffer.width() as u32;
        let height = buffer.height() as u32;
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::PixmapAllocation { width, height })?;

        for (dst, src) in pixmap
            .pixels_mut()
            .iter_mut()
            .zip(buffer.as_rgba().chunks_exact(TileBuffer::CHANNELS))
        {
            *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
        }

        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub(crate) fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// The whole image as a region.
    pub fn bounds(&self) -> SourceRegion {
        SourceRegion {
            x: 0.0,
            y: 0.0,
            width: self.width() as f64,
            height: self.height() as f64,
        }
    }
}

/// Resample `region` of `source` into a `width x height` tile.
///
/// The region is stretched independently along each axis to fill the tile
/// and sampled bicubically. Taps outside the region read neighbouring
/// source pixels, so adjacent tiles join without a seam. Transparent source
/// pixels are composited over white.
pub fn sample_region(
    source: &SourceImage,
    region: &SourceRegion,
    width: u32,
    height: u32,
) -> Result<TileBuffer, RenderError> {
    if !(region.width > 0.0 && region.height > 0.0) {
        return Err(RenderError::EmptyRegion {
            width: region.width,
            height: region.height,
        });
    }

    let mut canvas =
        Pixmap::new(width, height).ok_or(RenderError::PixmapAllocation { width, height })?;
    canvas.fill(Color::WHITE);

    let scale_x = (width as f64 / region.width) as f32;
    let scale_y = (height as f64 / region.height) as f32;
    let transform = Transform::from_translate(-region.x as f32, -region.y as f32)
        .post_scale(scale_x, scale_y);

    let mut paint = Paint::default();
    paint.shader = Pattern::new(
        source.pixmap.as_ref(),
        SpreadMode::Pad,
        FilterQuality::Bicubic,
        1.0,
        transform,
    );

    let rect = Rect::from_xywh(0.0, 0.0, width as f32, height as f32)
        .ok_or(RenderError::PixmapAllocation { width, height })?;
    canvas.fill_rect(rect, &paint, Transform::identity(), None);

    pixmap_to_buffer(&canvas)
}

/// Scale a tile down so its long edge is at most `max_edge` pixels.
pub fn thumbnail(buffer: &TileBuffer, max_edge: u32) -> Result<TileBuffer, RenderError> {
    let (width, height) = fit_within(buffer.width() as u32, buffer.height() as u32, max_edge);
    if width as usize == buffer.width() && height as usize == buffer.height() {
        return Ok(buffer.clone());
    }
    let source = SourceImage::from_buffer(buffer)?;
    sample_region(&source, &source.bounds(), width, height)
}

/// Dimensions of `width x height` scaled so the long edge is at most `max_edge`.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let long = width.max(height);
    if long <= max_edge || long == 0 {
        return (width, height);
    }
    let scale = max_edge as f64 / long as f64;
    let scaled = |v: u32| ((v as f64 * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

pub(crate) fn pixmap_to_buffer(pixmap: &Pixmap) -> Result<TileBuffer, RenderError> {
    let mut data = Vec::with_capacity(pixmap.pixels().len() * TileBuffer::CHANNELS);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(TileBuffer::from_rgba(
        data,
        pixmap.width() as usize,
        pixmap.height() as usize,
    )?)
}
