use std::sync::Arc;

use image::RgbaImage;

use super::{Debouncer, ImageSlot, ViewCore, ViewSettings, ViewState, replace};
use crate::error::Result;
use crate::profile::{Configurable, ViewProfile};
use crate::rasterizer::{RasterOptions, SvgLoader};

#[derive(Debug, Clone, PartialEq)]
struct SvgState {
    svg: Option<String>,
    color: Option<String>,
    fit_width: f64,
    fit_height: f64,
}

impl ViewState for SvgState {
    fn render(&self, loader: &SvgLoader) -> Result<Option<RgbaImage>> {
        let Some(svg) = self.svg.as_deref().filter(|s| !s.trim().is_empty()) else {
            return Ok(None);
        };
        let options = RasterOptions::new()
            .color(self.color.clone())
            .size(self.fit_width, self.fit_height);
        loader.load_svg_image(svg, &options).map(Some)
    }

    fn rendered(&mut self, image: &RgbaImage) {
        self.fit_width = image.width() as f64;
        self.fit_height = image.height() as f64;
    }
}

/// A view showing an SVG resource fitted into a box.
///
/// Defaults to no SVG and a 100x100 fit box. The SVG keeps its aspect ratio;
/// after each render the fit box shrinks to the rendered image's dimensions.
/// Non-positive fit dimensions count as absent, in which case the other
/// dimension (or the document's intrinsic size) decides.
pub struct SvgImageView {
    core: Arc<ViewCore<SvgState>>,
    debouncer: Debouncer,
}

impl SvgImageView {
    /// Creates an empty view with the default settings.
    pub fn new(loader: Arc<SvgLoader>) -> Self {
        Self::with_settings(loader, &ViewSettings::default())
    }

    pub fn with_settings(loader: Arc<SvgLoader>, settings: &ViewSettings) -> Self {
        Self::build(loader, settings, None)
    }

    /// Creates a view showing `svg` and renders it synchronously.
    pub fn with_svg(loader: Arc<SvgLoader>, settings: &ViewSettings, svg: impl Into<String>) -> Self {
        Self::build(loader, settings, Some(svg.into()))
    }

    fn build(loader: Arc<SvgLoader>, settings: &ViewSettings, svg: Option<String>) -> Self {
        let state = SvgState {
            svg,
            color: None,
            fit_width: settings.svg_width,
            fit_height: settings.svg_height,
        };
        let core = ViewCore::new("svg", state, loader);
        let debouncer = core.debouncer(settings.debounce);
        core.refresh();
        Self { core, debouncer }
    }

    pub fn svg(&self) -> Option<String> {
        self.core.snapshot().svg
    }

    pub fn color(&self) -> Option<String> {
        self.core.snapshot().color
    }

    pub fn fit_width(&self) -> f64 {
        self.core.snapshot().fit_width
    }

    pub fn fit_height(&self) -> f64 {
        self.core.snapshot().fit_height
    }

    /// Sets the SVG resource path. A blank path clears the view.
    pub fn set_svg(&self, svg: impl Into<String>) {
        let svg = Some(svg.into()).filter(|s| !s.trim().is_empty());
        self.change(|state| replace(&mut state.svg, svg));
    }

    /// Sets the color override (theme token, hex value or color name).
    pub fn set_color(&self, color: impl Into<String>) {
        let color = Some(color.into()).filter(|c| !c.trim().is_empty());
        self.change(|state| replace(&mut state.color, color));
    }

    pub fn clear_color(&self) {
        self.change(|state| replace(&mut state.color, None));
    }

    pub fn set_pref_width(&self, width: f64) {
        self.change(|state| replace(&mut state.fit_width, width));
    }

    pub fn set_pref_height(&self, height: f64) {
        self.change(|state| replace(&mut state.fit_height, height));
    }

    /// Renders the current state on the calling thread.
    ///
    /// `None` when no SVG is set.
    pub fn load_image(&self) -> Result<Option<RgbaImage>> {
        self.core.render_now()
    }

    pub fn image(&self) -> Option<Arc<RgbaImage>> {
        self.core.slot().get()
    }

    /// Registers the listener called from render threads with each new bitmap.
    pub fn on_image(&self, listener: impl Fn(Option<Arc<RgbaImage>>) + Send + Sync + 'static) {
        self.core.slot().set_listener(listener);
    }

    pub fn slot(&self) -> &ImageSlot {
        self.core.slot()
    }

    pub fn render_count(&self) -> usize {
        self.core.render_count()
    }

    fn change(&self, update: impl FnOnce(&mut SvgState) -> bool) {
        if self.core.update(update) {
            self.debouncer.trigger();
        }
    }
}

impl Configurable for SvgImageView {
    fn apply_profile(&mut self, profile: &ViewProfile) {
        let svg = profile.svg.clone().filter(|s| !s.trim().is_empty());
        let color = profile.color.clone();
        let (width, height) = (profile.width, profile.height);

        self.change(|state| {
            let mut changed = false;
            if let Some(svg) = svg {
                changed |= replace(&mut state.svg, Some(svg));
            }
            if let Some(color) = color {
                changed |= replace(&mut state.color, Some(color));
            }
            if let Some(width) = width {
                changed |= replace(&mut state.fit_width, width);
            }
            if let Some(height) = height {
                changed |= replace(&mut state.fit_height, height);
            }
            changed
        });
    }

    fn export_profile(&self) -> ViewProfile {
        let state = self.core.snapshot();
        ViewProfile {
            icon: None,
            svg: state.svg,
            color: state.color,
            width: Some(state.fit_width),
            height: Some(state.fit_height),
        }
    }
}

impl std::fmt::Debug for SvgImageView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgImageView")
            .field("state", &self.core.snapshot())
            .field("debounce", &self.debouncer.delay())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Resources;
    use crate::view::test_support::wait_until;
    use std::time::Duration;

    const WIDE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 40 20"><rect width="40" height="20"/></svg>"#;

    fn settings() -> ViewSettings {
        ViewSettings { debounce: Duration::from_millis(50), ..ViewSettings::default() }
    }

    fn loader() -> Arc<SvgLoader> {
        Arc::new(SvgLoader::new(Resources::bundled().with_entry("images/wide.svg", WIDE)))
    }

    #[test]
    fn empty_by_default() {
        let view = SvgImageView::with_settings(loader(), &settings());
        assert!(view.svg().is_none());
        assert!(view.image().is_none());
        assert!(view.load_image().unwrap().is_none());
        assert_eq!((view.fit_width(), view.fit_height()), (100.0, 100.0));
    }

    #[test]
    fn initial_render_fits_and_updates_box() {
        let view = SvgImageView::with_svg(loader(), &settings(), "images/wide.svg");
        assert_eq!(view.image().unwrap().dimensions(), (100, 50));
        assert_eq!((view.fit_width(), view.fit_height()), (100.0, 50.0));
        assert_eq!(view.render_count(), 0);
    }

    #[test]
    fn changes_are_debounced_into_one_render() {
        let view = SvgImageView::with_settings(loader(), &settings());
        view.set_svg("images/wide.svg");
        view.set_color("#ff0000");
        view.set_pref_width(60.0);
        view.set_pref_height(60.0);

        assert!(wait_until(|| view.image().is_some()));
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(view.render_count(), 1);

        let image = view.image().unwrap();
        assert_eq!(image.dimensions(), (60, 30));
        assert_eq!(image.get_pixel(30, 15).0, [255, 0, 0, 255]);
        assert_eq!((view.fit_width(), view.fit_height()), (60.0, 30.0));
    }

    #[test]
    fn non_positive_width_defers_to_height() {
        let view = SvgImageView::with_settings(loader(), &settings());
        view.set_svg("images/wide.svg");
        view.set_pref_width(0.0);
        view.set_pref_height(10.0);
        assert_eq!(view.load_image().unwrap().unwrap().dimensions(), (20, 10));
    }

    #[test]
    fn missing_resource_keeps_previous_image() {
        let view = SvgImageView::with_svg(loader(), &settings(), "images/wide.svg");
        view.set_svg("images/missing.svg");
        assert!(view.load_image().is_err());

        assert!(wait_until(|| view.render_count() == 1));
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(view.image().unwrap().dimensions(), (100, 50));
    }

    #[test]
    fn blank_svg_clears_image() {
        let view = SvgImageView::with_svg(loader(), &settings(), "images/wide.svg");
        view.set_svg("  ");
        assert!(view.svg().is_none());
        assert!(wait_until(|| view.image().is_none()));
    }

    #[test]
    fn profile_round_trip() {
        let mut view = SvgImageView::with_settings(loader(), &settings());
        view.apply_profile(&ViewProfile::new().with_svg("images/wide.svg").with_size(80.0, 80.0));

        let exported = view.export_profile();
        assert_eq!(exported.svg.as_deref(), Some("images/wide.svg"));
        assert_eq!((exported.width, exported.height), (Some(80.0), Some(80.0)));
        assert!(exported.icon.is_none());
    }

    #[test]
    fn profile_applies_partially() {
        // Long enough that no render shrinks the fit box mid-test.
        let slow = ViewSettings { debounce: Duration::from_secs(60), ..ViewSettings::default() };
        let mut view = SvgImageView::with_settings(loader(), &slow);
        view.apply_profile(&ViewProfile::new().with_svg("images/wide.svg").with_size(80.0, 80.0));
        view.apply_profile(&ViewProfile::new().with_color("#ff0000"));

        let exported = view.export_profile();
        assert_eq!(exported.svg.as_deref(), Some("images/wide.svg"));
        assert_eq!(exported.color.as_deref(), Some("#ff0000"));
        assert_eq!((exported.width, exported.height), (Some(80.0), Some(80.0)));
    }
}
