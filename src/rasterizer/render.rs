//! SVG rasterization using resvg/usvg.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{Result, SvgfxError};
use crate::icon::SizePx;

/// Largest raster side, in pixels, that [`rasterize`] will allocate.
pub const MAX_RASTER_SIDE: u32 = 16_384;

/// Rasterizes SVG source into a `target`-sized RGBA image.
///
/// The document is scaled uniformly to fit the target and centered, so a
/// target that already matches the document's aspect ratio is filled exactly.
/// Targets wider or taller than [`MAX_RASTER_SIDE`] are rejected.
pub fn rasterize(label: &str, svg: &str, target: SizePx) -> Result<RgbaImage> {
    if target.width > MAX_RASTER_SIDE || target.height > MAX_RASTER_SIDE {
        return Err(SvgfxError::transcode(
            label,
            format!(
                "{}x{} raster exceeds the {MAX_RASTER_SIDE}px limit",
                target.width, target.height
            ),
        ));
    }

    let opts = Options::default();
    let tree = Tree::from_str(svg, &opts).map_err(|e| SvgfxError::transcode(label, e))?;

    let svg_size = tree.size();
    if svg_size.width() <= 0.0 || svg_size.height() <= 0.0 {
        return Err(SvgfxError::transcode(label, "document has an empty size"));
    }

    let mut pixmap = Pixmap::new(target.width, target.height).ok_or_else(|| {
        SvgfxError::transcode(
            label,
            format!("cannot allocate a {}x{} raster", target.width, target.height),
        )
    })?;

    let (tw, th) = (target.width as f32, target.height as f32);
    let scale = (tw / svg_size.width()).min(th / svg_size.height());
    let x_offset = (tw - svg_size.width() * scale) / 2.0;
    let y_offset = (th - svg_size.height() * scale) / 2.0;
    let transform = Transform::from_scale(scale, scale).post_translate(x_offset, y_offset);

    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());

    // tiny_skia stores premultiplied alpha
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }

    img
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100"><circle cx="50" cy="50" r="40" fill="#ff0000"/></svg>"##;

    #[test]
    fn render_simple_svg() {
        let img = rasterize("simple", SIMPLE_SVG, SizePx::new(50, 50)).unwrap();
        assert_eq!(img.dimensions(), (50, 50));

        let center = img.get_pixel(25, 25);
        assert_eq!(center.0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0)[3], 0, "corner outside the circle is transparent");
    }

    #[test]
    fn content_is_centered_in_wider_target() {
        let img = rasterize("simple", SIMPLE_SVG, SizePx::new(100, 50)).unwrap();
        // Circle is scaled to 50px and centered horizontally.
        assert_eq!(img.get_pixel(50, 25)[0], 255);
        assert_eq!(img.get_pixel(5, 25)[3], 0);
    }

    #[test]
    fn invalid_markup_is_a_transcode_error() {
        let err = rasterize("broken", "<svg", SizePx::new(10, 10)).unwrap_err();
        assert!(matches!(err, SvgfxError::Transcode { .. }));
    }

    #[test]
    fn oversized_target_is_rejected_before_allocation() {
        let err = rasterize("huge", SIMPLE_SVG, SizePx::new(100_000, 100_000)).unwrap_err();
        assert!(matches!(err, SvgfxError::Transcode { .. }));

        let err = rasterize("tall", SIMPLE_SVG, SizePx::new(10, MAX_RASTER_SIDE + 1)).unwrap_err();
        assert!(matches!(err, SvgfxError::Transcode { .. }));
    }
}
