use std::sync::Arc;

use image::RgbaImage;

use super::{Debouncer, ImageSlot, ViewCore, ViewSettings, ViewState, replace};
use crate::error::Result;
use crate::icon::Bi;
use crate::profile::{Configurable, ViewProfile};
use crate::rasterizer::{RasterOptions, SvgLoader};

#[derive(Debug, Clone, PartialEq)]
struct IconState {
    icon: Option<Bi>,
    color: Option<String>,
    size: f64,
}

impl ViewState for IconState {
    fn render(&self, loader: &SvgLoader) -> Result<Option<RgbaImage>> {
        let Some(icon) = self.icon else {
            return Ok(None);
        };
        let options = RasterOptions::new()
            .color(self.color.clone())
            .size(self.size, self.size);
        loader.render_icon(icon, &options).map(Some)
    }
}

/// A square view showing one bundled icon.
///
/// Width and height always equal [`size`](Self::size). Defaults to
/// [`Bi::ArrowLeftCircle`] at 24px with no color override.
///
/// ```no_run
/// use std::sync::Arc;
/// use svgfx_renderer::{Bi, IconView, Resources, SvgLoader};
///
/// let view = IconView::new(Arc::new(SvgLoader::new(Resources::bundled())));
/// view.on_image(|image| {
///     // Hand the bitmap to the UI thread here.
///     let _ = image;
/// });
/// view.set_icon(Bi::Trash);
/// view.set_color("--danger");
/// ```
pub struct IconView {
    core: Arc<ViewCore<IconState>>,
    debouncer: Debouncer,
}

impl IconView {
    /// Creates a view with the default settings and renders it synchronously.
    pub fn new(loader: Arc<SvgLoader>) -> Self {
        Self::with_settings(loader, &ViewSettings::default())
    }

    /// Creates a view with custom settings and renders it synchronously.
    pub fn with_settings(loader: Arc<SvgLoader>, settings: &ViewSettings) -> Self {
        let state = IconState {
            icon: Some(Bi::default()),
            color: None,
            size: settings.icon_size,
        };
        let core = ViewCore::new("icon", state, loader);
        let debouncer = core.debouncer(settings.debounce);
        core.refresh();
        Self { core, debouncer }
    }

    pub fn icon(&self) -> Option<Bi> {
        self.core.snapshot().icon
    }

    pub fn color(&self) -> Option<String> {
        self.core.snapshot().color
    }

    pub fn size(&self) -> f64 {
        self.core.snapshot().size
    }

    pub fn width(&self) -> f64 {
        self.size()
    }

    pub fn height(&self) -> f64 {
        self.size()
    }

    pub fn set_icon(&self, icon: Bi) {
        self.change(|state| replace(&mut state.icon, Some(icon)));
    }

    /// Removes the icon; the view then displays nothing.
    pub fn clear_icon(&self) {
        self.change(|state| replace(&mut state.icon, None));
    }

    /// Sets the color override (theme token, hex value or color name).
    pub fn set_color(&self, color: impl Into<String>) {
        let color = Some(color.into()).filter(|c| !c.trim().is_empty());
        self.change(|state| replace(&mut state.color, color));
    }

    pub fn clear_color(&self) {
        self.change(|state| replace(&mut state.color, None));
    }

    pub fn set_size(&self, size: f64) {
        self.change(|state| replace(&mut state.size, size));
    }

    /// Shrinks the size to `width` if it is smaller than the current height.
    pub fn set_pref_width(&self, width: f64) {
        self.change(|state| {
            let size = width.min(state.size);
            replace(&mut state.size, size)
        });
    }

    /// Shrinks the size to `height` if it is smaller than the current width.
    pub fn set_pref_height(&self, height: f64) {
        self.change(|state| {
            let size = height.min(state.size);
            replace(&mut state.size, size)
        });
    }

    /// Renders the current state on the calling thread.
    ///
    /// `None` when no icon is set.
    pub fn load_image(&self) -> Result<Option<RgbaImage>> {
        self.core.render_now()
    }

    /// The bitmap currently displayed.
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

    /// Number of background renders started so far.
    pub fn render_count(&self) -> usize {
        self.core.render_count()
    }

    fn change(&self, update: impl FnOnce(&mut IconState) -> bool) {
        if self.core.update(update) {
            self.debouncer.trigger();
        }
    }
}

impl Configurable for IconView {
    /// Applies the icon, color and size. The size becomes the smaller of the
    /// given width and height.
    fn apply_profile(&mut self, profile: &ViewProfile) {
        let size = match (profile.width, profile.height) {
            (Some(w), Some(h)) => Some(w.min(h)),
            (w, h) => w.or(h),
        };
        let (icon, color) = (profile.icon, profile.color.clone());

        self.change(|state| {
            let mut changed = false;
            if let Some(icon) = icon {
                changed |= replace(&mut state.icon, Some(icon));
            }
            if let Some(color) = color {
                changed |= replace(&mut state.color, Some(color));
            }
            if let Some(size) = size {
                changed |= replace(&mut state.size, size);
            }
            changed
        });
    }

    fn export_profile(&self) -> ViewProfile {
        let state = self.core.snapshot();
        ViewProfile {
            icon: state.icon,
            svg: None,
            color: state.color,
            width: Some(state.size),
            height: Some(state.size),
        }
    }
}

impl std::fmt::Debug for IconView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconView")
            .field("state", &self.core.snapshot())
            .field("debounce", &self.debouncer.delay())
            .finish()
    }
}
