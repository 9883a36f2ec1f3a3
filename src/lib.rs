//! svgfx-renderer: SVG icon rendering and a remote image cache for UI views
//!
//! This crate rasterizes bundled Bootstrap icons and arbitrary SVG resources
//! with color overrides, caches remote images on disk, and provides view
//! models that re-render after a debounce delay.
//!
//! # Example
//!
//! ```
//! use svgfx_renderer::{Bi, RasterOptions, Resources, SvgLoader};
//!
//! let loader = SvgLoader::new(Resources::bundled());
//!
//! // Theme tokens resolve through the bundled stylesheet.
//! let icon = loader
//!     .render_icon(Bi::XCircle, &RasterOptions::new().with_color("--danger").size(32.0, 32.0))
//!     .unwrap();
//! assert_eq!(icon.dimensions(), (32, 32));
//!
//! // A single dimension keeps the document's aspect ratio.
//! let wide = loader.bi("cash-stack", &RasterOptions::new().height(48.0)).unwrap();
//! assert_eq!(wide.height(), 48);
//! ```
//!
//! # Views and profiles
//!
//! [`IconView`] and [`SvgImageView`] hold their visual state and re-render
//! in the background once changes settle. Their state can be exchanged as a
//! [`ViewProfile`] through the [`Configurable`] trait:
//!
//! ```no_run
//! use std::sync::Arc;
//! use svgfx_renderer::{Bi, Configurable, IconView, Resources, SvgLoader, ViewProfile};
//!
//! let loader = Arc::new(SvgLoader::new(Resources::bundled()));
//! let mut view = IconView::new(loader);
//!
//! view.apply_profile(&ViewProfile::new().with_icon(Bi::Gear).with_color("#6c757d"));
//! let json = view.export_profile().to_json().unwrap();
//! ```
//!
//! # Remote images
//!
//! ```no_run
//! use svgfx_renderer::{CacheConfig, ImageCache, Resources};
//!
//! let cache = ImageCache::new(CacheConfig::default(), Resources::bundled()).unwrap();
//! let cover = cache.load_image_default("https://example.com/cover.jpg");
//! assert_eq!(cover.dimensions(), (70, 100));
//! ```

pub mod assets;
pub mod cache;
pub mod color;
pub mod logging;
pub mod rasterizer;

mod config;
mod error;
mod icon;
mod profile;
mod view;

pub use assets::Resources;
pub use cache::{CacheConfig, CacheEntry, Fetch, HttpFetcher, ImageCache, cache_key};
pub use color::{ColorSpec, Theme};
pub use config::SvgfxConfig;
pub use error::{Result, SvgfxError};
pub use icon::{Bi, SizePx, UnknownIcon};
pub use profile::{Configurable, ViewProfile};
pub use rasterizer::{RasterOptions, SvgLoader, resolve_target_size};
pub use view::{Debouncer, IconView, ImageSlot, SvgImageView, ViewSettings};
