//! Toolkit-agnostic view models that re-render after a debounce delay.
//!
//! A view holds what to draw (an icon or an SVG resource) together with a
//! color override and a size. Every property change restarts a debounce
//! timer; when it fires, a background thread renders the current state and
//! publishes the bitmap through the view's [`ImageSlot`]. Hosts register an
//! `on_image` listener to move the bitmap onto their own UI thread.
//!
//! ```text
//! Idle --change--> Debounce(delay) --fire--> Rendering --> Idle
//!                     ^    |                     |
//!                     +----+ change              | change
//!                     +--------------------------+
//! ```
//!
//! Renders are never cancelled; the last one to finish wins.

mod debounce;
mod icon_view;
mod svg_view;

pub use debounce::Debouncer;
pub use icon_view::IconView;
pub use svg_view::SvgImageView;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use image::RgbaImage;
use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::rasterizer::SvgLoader;

/// Delay between the last property change and the re-render.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// Construction-time settings shared by both views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub debounce: Duration,
    /// Initial [`IconView`] size.
    pub icon_size: f64,
    /// Initial [`SvgImageView`] fit width.
    pub svg_width: f64,
    /// Initial [`SvgImageView`] fit height.
    pub svg_height: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            icon_size: 24.0,
            svg_width: 100.0,
            svg_height: 100.0,
        }
    }
}

// ============================================================================
// ImageSlot
// ============================================================================

type Listener = Arc<dyn Fn(Option<Arc<RgbaImage>>) + Send + Sync>;

/// The bitmap a view currently displays.
#[derive(Default)]
pub struct ImageSlot {
    image: RwLock<Option<Arc<RgbaImage>>>,
    listener: RwLock<Option<Listener>>,
}

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The displayed bitmap, if any.
    pub fn get(&self) -> Option<Arc<RgbaImage>> {
        self.image.read().clone()
    }

    /// Replaces the bitmap and notifies the listener.
    ///
    /// The listener runs on the calling thread, outside the slot's locks.
    pub fn set(&self, image: Option<RgbaImage>) {
        let image = image.map(Arc::new);
        *self.image.write() = image.clone();

        let listener = self.listener.read().clone();
        if let Some(listener) = listener {
            listener(image);
        }
    }

    /// Registers the listener, replacing any previous one.
    pub fn set_listener(&self, listener: impl Fn(Option<Arc<RgbaImage>>) + Send + Sync + 'static) {
        *self.listener.write() = Some(Arc::new(listener));
    }

    pub fn clear_listener(&self) {
        *self.listener.write() = None;
    }
}

impl std::fmt::Debug for ImageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSlot")
            .field("image", &self.get().map(|img| img.dimensions()))
            .field("listener", &self.listener.read().is_some())
            .finish()
    }
}

// ============================================================================
// Shared view machinery
// ============================================================================

/// View state that knows how to render itself.
pub(crate) trait ViewState: Clone + Send + 'static {
    /// Renders the state; `None` when there is nothing to show.
    fn render(&self, loader: &SvgLoader) -> Result<Option<RgbaImage>>;

    /// Called with the freshly published image if the state has not changed
    /// since the render started.
    fn rendered(&mut self, _image: &RgbaImage) {}
}

/// Assigns `value` and returns true if it differs from the old one.
pub(crate) fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

struct Versioned<S> {
    value: S,
    version: u64,
}

/// State, loader and output slot shared between a view and its render threads.
pub(crate) struct ViewCore<S> {
    state: Mutex<Versioned<S>>,
    loader: Arc<SvgLoader>,
    slot: ImageSlot,
    renders: AtomicUsize,
    name: &'static str,
}

impl<S: ViewState> ViewCore<S> {
    pub(crate) fn new(name: &'static str, state: S, loader: Arc<SvgLoader>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(Versioned { value: state, version: 0 }),
            loader,
            slot: ImageSlot::new(),
            renders: AtomicUsize::new(0),
            name,
        })
    }

    /// A debouncer that starts a background render when it fires.
    pub(crate) fn debouncer(self: &Arc<Self>, delay: Duration) -> Debouncer {
        let core: Weak<Self> = Arc::downgrade(self);
        Debouncer::new(delay, move || {
            if let Some(core) = core.upgrade() {
                core.spawn_refresh();
            }
        })
    }

    pub(crate) fn slot(&self) -> &ImageSlot {
        &self.slot
    }

    pub(crate) fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Copy of the current state.
    pub(crate) fn snapshot(&self) -> S {
        self.state.lock().value.clone()
    }

    /// Mutates the state. Returns true if `update` reported a change.
    pub(crate) fn update(&self, update: impl FnOnce(&mut S) -> bool) -> bool {
        let mut state = self.state.lock();
        let changed = update(&mut state.value);
        if changed {
            state.version += 1;
        }
        changed
    }

    /// Renders the current state without publishing it.
    pub(crate) fn render_now(&self) -> Result<Option<RgbaImage>> {
        self.snapshot().render(&self.loader)
    }

    /// Renders and publishes on the calling thread.
    ///
    /// Failures are logged and the previous image stays in place.
    pub(crate) fn refresh(&self) {
        let (snapshot, version) = {
            let state = self.state.lock();
            (state.value.clone(), state.version)
        };

        match snapshot.render(&self.loader) {
            Ok(image) => {
                if let Some(image) = &image {
                    let mut state = self.state.lock();
                    if state.version == version {
                        state.value.rendered(image);
                    }
                }
                self.slot.set(image);
            }
            Err(e) => tracing::error!(view = self.name, error = %e, "Render failed"),
        }
    }

    fn spawn_refresh(self: Arc<Self>) {
        let count = self.renders.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(view = self.name, count, "Starting background render");

        let name = format!("svgfx-render-{}", self.name);
        if let Err(e) = thread::Builder::new().name(name).spawn(move || self.refresh()) {
            tracing::error!(error = %e, "Failed to spawn render thread");
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::{Duration, Instant};

    /// Polls `done` until it holds or five seconds pass.
    pub(crate) fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        done()
    }
}
