//! SVG rasterization with color override and aspect-ratio-aware sizing.
//!
//! [`SvgLoader`] is the service the views and the image cache share. It is
//! constructed explicitly and passed down; there is no global instance.
//!
//! # Example
//!
//! ```
//! use svgfx_renderer::{Bi, RasterOptions, Resources, SvgLoader};
//!
//! let loader = SvgLoader::new(Resources::bundled());
//! let image = loader
//!     .render_icon(Bi::Gear, &RasterOptions::new().with_color("#198754").size(48.0, 48.0))
//!     .unwrap();
//! assert_eq!(image.dimensions(), (48, 48));
//! ```

pub mod document;
pub mod render;
pub mod size;

pub use document::SvgDocument;
pub use size::{DEFAULT_SIZE, IntrinsicSize, resolve_target_size};

use std::sync::OnceLock;

use image::RgbaImage;

use crate::assets::{Resources, THEME_STYLESHEET};
use crate::color::{ColorSpec, Theme, to_hex_string};
use crate::error::Result;
use crate::icon::{Bi, resource_path_for};

// ============================================================================
// RasterOptions
// ============================================================================

/// Per-call rasterization parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterOptions {
    /// Theme token, hex value or color name applied to the root element.
    pub color: Option<String>,
    /// Also apply the color as the root stroke.
    pub fill_stroke: bool,
    /// Target width; non-positive values count as absent.
    pub width: Option<f64>,
    /// Target height; non-positive values count as absent.
    pub height: Option<f64>,
}

impl RasterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the color override.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets or clears the color override.
    pub fn color(mut self, color: Option<String>) -> Self {
        self.color = color.filter(|c| !c.trim().is_empty());
        self
    }

    /// Applies the color to the root stroke as well as the fill.
    pub fn fill_stroke(mut self, fill_stroke: bool) -> Self {
        self.fill_stroke = fill_stroke;
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Sets both target dimensions.
    pub fn size(self, width: f64, height: f64) -> Self {
        self.width(width).height(height)
    }
}

// ============================================================================
// SvgLoader
// ============================================================================

/// Loads SVG resources and transcodes them to RGBA rasters.
#[derive(Debug, Default)]
pub struct SvgLoader {
    resources: Resources,
    theme: OnceLock<Option<Theme>>,
}

impl SvgLoader {
    /// Creates a loader over the given resources.
    pub fn new(resources: Resources) -> Self {
        Self { resources, theme: OnceLock::new() }
    }

    /// The resources this loader reads from.
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// The theme stylesheet's first rule, parsed on first use.
    ///
    /// `None` if the stylesheet is missing or malformed; the failure is logged
    /// once.
    pub fn theme(&self) -> Option<&Theme> {
        self.theme
            .get_or_init(|| {
                let parsed = self.resources.open(THEME_STYLESHEET).and_then(|css| {
                    Theme::parse(&String::from_utf8_lossy(&css))
                });
                match parsed {
                    Ok(theme) => {
                        tracing::debug!(declarations = theme.len(), "Theme stylesheet loaded");
                        Some(theme)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Theme stylesheet unavailable");
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Loads and rasterizes an SVG resource.
    ///
    /// Fails with [`SvgfxError::ResourceNotFound`](crate::SvgfxError::ResourceNotFound)
    /// or [`SvgfxError::Io`](crate::SvgfxError::Io) when the resource cannot be
    /// opened, and with [`SvgfxError::Transcode`](crate::SvgfxError::Transcode)
    /// when the document cannot be rendered. Neither is retried.
    pub fn load_svg_image(&self, path: &str, options: &RasterOptions) -> Result<RgbaImage> {
        let data = self.resources.open(path).inspect_err(|e| {
            tracing::error!(path, error = %e, "Failed to open SVG resource");
        })?;
        self.load_svg_data(path, &data, options)
    }

    /// Rasterizes in-memory SVG data; `label` is used in errors and logs.
    pub fn load_svg_data(
        &self,
        label: &str,
        data: &[u8],
        options: &RasterOptions,
    ) -> Result<RgbaImage> {
        self.transcode(label, data, options).inspect_err(|e| {
            tracing::error!(label, error = %e, "Failed to transcode SVG");
        })
    }

    /// Loads an SVG resource into the default 300x300 box without a color.
    pub fn load_svg(&self, path: &str) -> Result<RgbaImage> {
        let options = RasterOptions::new().size(
            DEFAULT_SIZE.width as f64,
            DEFAULT_SIZE.height as f64,
        );
        self.load_svg_image(path, &options)
    }

    /// Rasterizes a bundled icon.
    pub fn render_icon(&self, icon: Bi, options: &RasterOptions) -> Result<RgbaImage> {
        self.load_svg_image(&icon.resource_path(), options)
    }

    /// Rasterizes an icon by fragment name, e.g. `"x-circle"`.
    ///
    /// Names outside the bundled set are looked up in the icon directory of
    /// the configured resource root.
    pub fn bi(&self, name: &str, options: &RasterOptions) -> Result<RgbaImage> {
        self.load_svg_image(&resource_path_for(name), options)
    }

    fn transcode(&self, label: &str, data: &[u8], options: &RasterOptions) -> Result<RgbaImage> {
        let mut doc = SvgDocument::parse(label, data)?;

        if let Some(color) = options.color.as_deref() {
            self.apply_color(&mut doc, color, options.fill_stroke)?;
        }

        let intrinsic = doc.intrinsic_size();
        let target = resolve_target_size(intrinsic, options.width, options.height);
        if intrinsic.is_none() {
            // Give usvg an explicit size instead of its percentage fallback.
            doc.set_root_attribute("width", &target.width.to_string())?;
            doc.set_root_attribute("height", &target.height.to_string())?;
        }

        let image = render::rasterize(label, doc.as_str(), target)?;
        tracing::trace!(label, width = target.width, height = target.height, "SVG rasterized");
        Ok(image)
    }

    /// Writes the color to the root `fill` (and `stroke`) attribute.
    ///
    /// An unresolvable theme token leaves the document unchanged.
    fn apply_color(&self, doc: &mut SvgDocument, color: &str, fill_stroke: bool) -> Result<()> {
        let spec = ColorSpec::parse(color);
        let rgb = match &spec {
            ColorSpec::ThemeToken(token) => match self.theme().and_then(|t| t.color(token)) {
                Some(rgb) => rgb,
                None => {
                    tracing::warn!(token = %token, label = doc.label(), "Theme token not found");
                    return Ok(());
                }
            },
            _ => spec.resolve_literal()?,
        };

        let hex = to_hex_string(rgb);
        doc.set_root_attribute("fill", &hex)?;
        if fill_stroke {
            doc.set_root_attribute("stroke", &hex)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SvgfxError;

    const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10"/></svg>"#;
    const OUTLINE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 10" fill="none"><rect x="1" y="1" width="18" height="8" stroke-width="2"/></svg>"#;

    fn loader() -> SvgLoader {
        let resources = Resources::bundled()
            .with_entry("test/square.svg", SQUARE)
            .with_entry("test/outline.svg", OUTLINE)
            .with_entry("test/broken.svg", "<svg><g></svg>");
        SvgLoader::new(resources)
    }

    #[test]
    fn hex_color_fills_root() {
        let img = loader()
            .load_svg_image("test/square.svg", &RasterOptions::new().with_color("#00ff00"))
            .unwrap();
        assert_eq!(img.dimensions(), (10, 10));
        assert_eq!(img.get_pixel(5, 5).0, [0, 255, 0, 255]);
    }

    #[test]
    fn named_color_fills_root() {
        let img = loader()
            .load_svg_image("test/square.svg", &RasterOptions::new().with_color("blue").size(20.0, 20.0))
            .unwrap();
        assert_eq!(img.dimensions(), (20, 20));
        assert_eq!(img.get_pixel(10, 10).0, [0, 0, 255, 255]);
    }

    #[test]
    fn default_color_is_black() {
        let img = loader().load_svg_image("test/square.svg", &RasterOptions::new()).unwrap();
        assert_eq!(img.get_pixel(5, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn theme_token_resolves_through_stylesheet() {
        let img = loader()
            .load_svg_image("test/square.svg", &RasterOptions::new().with_color("--danger"))
            .unwrap();
        assert_eq!(img.get_pixel(5, 5).0, [220, 53, 69, 255]);
    }

    #[test]
    fn unknown_theme_token_keeps_document_colors() {
        let img = loader()
            .load_svg_image("test/square.svg", &RasterOptions::new().with_color("--nope"))
            .unwrap();
        assert_eq!(img.get_pixel(5, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn stroke_only_painted_when_requested() {
        let loader = loader();
        let opts = RasterOptions::new().with_color("#ff0000").size(40.0, 20.0);

        let plain = loader.load_svg_image("test/outline.svg", &opts).unwrap();
        // fill="none" on the root is overridden, so the rect interior is painted.
        assert_eq!(plain.get_pixel(20, 10).0, [255, 0, 0, 255]);

        let stroked = loader
            .load_svg_image("test/outline.svg", &opts.clone().fill_stroke(true))
            .unwrap();
        assert_eq!(stroked.get_pixel(1, 10).0, [255, 0, 0, 255]);
        assert_eq!(plain.get_pixel(1, 10)[3], 0);
    }

    #[test]
    fn single_dimension_keeps_aspect_ratio() {
        let img = loader()
            .load_svg_image("test/outline.svg", &RasterOptions::new().width(60.0))
            .unwrap();
        assert_eq!(img.dimensions(), (60, 30));
    }

    #[test]
    fn box_is_fitted() {
        let img = loader()
            .load_svg_image("test/outline.svg", &RasterOptions::new().size(100.0, 100.0))
            .unwrap();
        assert_eq!(img.dimensions(), (100, 50));
    }

    #[test]
    fn load_svg_uses_default_box() {
        let img = loader().load_svg("test/square.svg").unwrap();
        assert_eq!(img.dimensions(), (300, 300));
    }

    #[test]
    fn document_without_size_gets_default_box() {
        let loader = SvgLoader::new(Resources::bundled().with_entry(
            "test/unsized.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="5" height="5"/></svg>"#,
        ));
        let img = loader.load_svg_image("test/unsized.svg", &RasterOptions::new()).unwrap();
        assert_eq!(img.dimensions(), (300, 300));
    }

    #[test]
    fn huge_intrinsic_size_fails_to_transcode() {
        let loader = SvgLoader::new(Resources::bundled().with_entry(
            "test/huge.svg",
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100000" height="100000"><rect width="5" height="5"/></svg>"#,
        ));
        let err = loader.load_svg_image("test/huge.svg", &RasterOptions::new()).unwrap_err();
        assert!(matches!(err, SvgfxError::Transcode { .. }));

        // An explicit box still renders the same document.
        let img = loader.load_svg_image("test/huge.svg", &RasterOptions::new().size(64.0, 64.0)).unwrap();
        assert_eq!(img.dimensions(), (64, 64));
    }

    #[test]
    fn bundled_icons_render() {
        let loader = SvgLoader::new(Resources::bundled());
        let opts = RasterOptions::new().with_color("--accent").size(24.0, 24.0);
        for icon in Bi::ALL {
            let img = loader.render_icon(*icon, &opts).unwrap();
            assert_eq!(img.dimensions(), (24, 24), "{icon}");
            assert!(img.pixels().any(|p| p[3] > 0), "{icon} rendered nothing");
        }
    }

    #[test]
    fn bi_by_name() {
        let loader = SvgLoader::new(Resources::bundled());
        let img = loader.bi("trash", &RasterOptions::new().size(32.0, 32.0)).unwrap();
        assert_eq!(img.dimensions(), (32, 32));

        let err = loader.bi("no-such-icon", &RasterOptions::new()).unwrap_err();
        assert!(matches!(err, SvgfxError::ResourceNotFound { .. }));
    }

    #[test]
    fn missing_resource_fails() {
        let err = loader().load_svg_image("test/missing.svg", &RasterOptions::new()).unwrap_err();
        assert!(matches!(err, SvgfxError::ResourceNotFound { .. }));
    }

    #[test]
    fn malformed_document_fails_to_transcode() {
        let err = loader().load_svg_image("test/broken.svg", &RasterOptions::new()).unwrap_err();
        assert!(matches!(err, SvgfxError::Transcode { .. }));
    }

    #[test]
    fn invalid_color_is_reported() {
        let err = loader()
            .load_svg_image("test/square.svg", &RasterOptions::new().with_color("not-a-color"))
            .unwrap_err();
        assert!(matches!(err, SvgfxError::InvalidColor(_)));
    }
}
