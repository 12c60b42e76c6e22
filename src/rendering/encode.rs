//! JPEG tile and PNG preview encoding.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use print_enhance::TileBuffer;
use serde::Serialize;
use std::io::Cursor;

use crate::error::RenderError;

/// JPEG quality for printed tiles
pub const TILE_JPEG_QUALITY: u8 = 100;

/// One finished page of the wall.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct EncodedTile {
    /// Row-major position in the grid
    pub index: usize,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub jpeg: Vec<u8>,
}

impl std::fmt::Debug for EncodedTile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedTile")
            .field("index", &self.index)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("jpeg_bytes", &self.jpeg.len())
            .finish()
    }
}

/// Encode the RGB channels of a tile as baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(buffer: &TileBuffer, quality: u8) -> Result<Vec<u8>, RenderError> {
    let rgb = buffer.to_rgb();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(
            &rgb,
            buffer.width() as u32,
            buffer.height() as u32,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| RenderError::JpegEncode(e.to_string()))?;
    Ok(out)
}

/// Encode a tile as 8-bit RGBA PNG.
pub fn encode_png(buffer: &TileBuffer) -> Result<Vec<u8>, RenderError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder =
            png::Encoder::new(&mut buf, buffer.width() as u32, buffer.height() as u32);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(buffer.as_rgba())
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}
