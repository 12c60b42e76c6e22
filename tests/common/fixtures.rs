//! Test fixtures: generated source images.

use std::io::Cursor;

/// Encode RGBA pixels as PNG
pub fn png_from_rgba(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(rgba).unwrap();
    }
    buf.into_inner()
}

/// A horizontal red-to-blue gradient PNG
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for _y in 0..height {
        for x in 0..width {
            let t = (x * 255 / width.max(1)) as u8;
            rgba.extend_from_slice(&[255 - t, 64, t, 255]);
        }
    }
    png_from_rgba(width, height, &rgba)
}

/// A flat-color PNG
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let pixels: Vec<u8> = std::iter::repeat(rgba)
        .take((width * height) as usize)
        .flatten()
        .collect();
    png_from_rgba(width, height, &pixels)
}

/// A flat-color JPEG
pub fn solid_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, image::ImageFormat::Jpeg)
        .unwrap();
    buf.into_inner()
}

/// Bytes that no decoder accepts
pub const NOT_AN_IMAGE: &[u8] = b"this is not an image";

/// Pseudo-random noise PNG; compresses poorly, so the encoded size tracks the pixel count
pub fn noise_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x2545_F491;
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..width * height {
        for _ in 0..3 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            rgba.push((state >> 24) as u8);
        }
        rgba.push(255);
    }
    png_from_rgba(width, height, &rgba)
}
