//! Normalization pipeline for downloaded images.
//!
//! Every image that enters the cache is fitted to the requested box, padded
//! with its most common color, lossily recompressed and stored as PNG.

use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::{Result, SvgfxError};

/// Default recompression quality, 0.0 (smallest) to 1.0 (best).
pub const DEFAULT_QUALITY: f32 = 0.1;

// ============================================================================
// Color statistics
// ============================================================================

/// Returns the most frequent 24-bit RGB color, ignoring alpha.
///
/// Ties go to the numerically smallest color. An empty image yields black.
pub fn most_common_color(image: &RgbaImage) -> Rgb<u8> {
    let mut counts: HashMap<u32, u32> = HashMap::new();
    for pixel in image.pixels() {
        let [r, g, b, _] = pixel.0;
        let key = (r as u32) << 16 | (g as u32) << 8 | b as u32;
        *counts.entry(key).or_insert(0) += 1;
    }

    let key = counts
        .into_iter()
        .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then(kb.cmp(ka)))
        .map(|(key, _)| key)
        .unwrap_or(0);

    Rgb([(key >> 16) as u8, (key >> 8) as u8, key as u8])
}

// ============================================================================
// Geometry
// ============================================================================

/// Scales `image` to fit a `width x height` box and centers it.
///
/// The uncovered area is filled with the image's most common color (opaque).
pub fn fill_image(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (width, height) = (width.max(1), height.max(1));
    let Rgb([r, g, b]) = most_common_color(image);
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]));

    if image.width() == 0 || image.height() == 0 {
        return canvas;
    }

    let scale = (width as f64 / image.width() as f64).min(height as f64 / image.height() as f64);
    let scaled_w = ((image.width() as f64 * scale).round() as u32).clamp(1, width);
    let scaled_h = ((image.height() as f64 * scale).round() as u32).clamp(1, height);

    let resized = if (scaled_w, scaled_h) == image.dimensions() {
        image.clone()
    } else {
        imageops::resize(image, scaled_w, scaled_h, FilterType::Triangle)
    };

    let x = ((width - scaled_w) / 2) as i32;
    let y = ((height - scaled_h) / 2) as i32;
    composite_over(&mut canvas, &resized, x, y);
    canvas
}

/// Composites a source image onto a destination image at the specified position.
///
/// Uses standard alpha blending (source over destination).
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    let dest_width = dest.width() as i32;
    let dest_height = dest.height() as i32;

    for (sx, sy, src_pixel) in src.enumerate_pixels() {
        let dx = x + sx as i32;
        let dy = y + sy as i32;

        // Skip if outside destination bounds
        if dx < 0 || dy < 0 || dx >= dest_width || dy >= dest_height {
            continue;
        }

        let dst_pixel = dest.get_pixel_mut(dx as u32, dy as u32);
        *dst_pixel = alpha_blend(*src_pixel, *dst_pixel);
    }
}

/// Alpha blends two RGBA pixels (source over destination).
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;

    let out_a = sa + da * (1.0 - sa);
    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Encoding
// ============================================================================

/// Flattens onto white and round-trips through JPEG at `quality`.
pub fn compress(image: &RgbaImage, quality: f32) -> Result<RgbaImage> {
    let mut flat = RgbImage::from_pixel(image.width(), image.height(), Rgb([255, 255, 255]));
    for (x, y, pixel) in image.enumerate_pixels() {
        let blended = alpha_blend(*pixel, Rgba([255, 255, 255, 255]));
        flat.put_pixel(x, y, Rgb([blended[0], blended[1], blended[2]]));
    }

    let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(&flat)
        .map_err(|e| SvgfxError::Encode(e.to_string()))?;

    Ok(image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg)?.to_rgba8())
}

/// Encodes an image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| SvgfxError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Writes an image to `path` as PNG.
///
/// Encoding failures map to [`SvgfxError::Encode`], write failures to
/// [`SvgfxError::Io`].
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let bytes = encode_png(image)?;
    fs::write(path, bytes).map_err(|e| SvgfxError::io(path.display().to_string(), e))
}

/// Decodes downloaded bytes and produces the PNG payload stored in the cache.
pub fn normalize(bytes: &[u8], width: u32, height: u32, quality: f32) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)?.to_rgba8();
    let filled = fill_image(&decoded, width, height);
    let compressed = compress(&filled, quality)?;
    encode_png(&compressed)
}
