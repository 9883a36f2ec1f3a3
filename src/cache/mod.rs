//! Disk-backed remote image cache.
//!
//! Images are downloaded once, normalized to the requested box (see
//! [`pipeline`]) and persisted as `<cache dir>/<sanitized url>.png`. Entries
//! are served from disk until they are older than the configured expiry
//! (24 hours by default). Any failure to produce an image falls back to the
//! bundled placeholder, so the loading calls never fail.
//!
//! The cache does no locking: concurrent writers of the same key race, which
//! is harmless because the content for a key is the same.

pub mod fetch;
pub mod pipeline;
pub mod pool;

pub use fetch::{Fetch, HttpFetcher};
pub use pool::download_pool;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime};

use image::RgbaImage;
use rayon::ThreadPool;

use crate::assets::{PLACEHOLDER, Resources};
use crate::error::Result;
use crate::icon::SizePx;
use crate::rasterizer::{SvgDocument, render};

/// Default box used by [`ImageCache::load_image_default`].
pub const DEFAULT_BOX: SizePx = SizePx { width: 70, height: 100 };

/// Default entry lifetime.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Default number of download workers.
pub const DEFAULT_WORKERS: usize = 5;

/// Name of the cache directory under the user's home.
pub const CACHE_DIR_NAME: &str = ".imagecache";

/// `<home>/.imagecache`, or `./.imagecache` when no home directory is known.
pub fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
}

/// Maps a URL to its cache key: every character outside `[A-Za-z0-9.-]`
/// becomes `_`.
pub fn cache_key(url: &str) -> String {
    url.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

fn is_blank(url: &str) -> bool {
    let url = url.trim();
    url.is_empty() || url == "null"
}

// ============================================================================
// Configuration
// ============================================================================

/// Settings for an [`ImageCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Directory holding cached PNG files.
    pub dir: PathBuf,
    /// Entries older than this are downloaded again.
    pub expiry: Duration,
    /// Recompression quality, 0.0 to 1.0.
    pub quality: f32,
    /// Size of the background download pool.
    pub workers: usize,
    /// User agent sent with downloads.
    pub user_agent: String,
    /// Request timeout; `None` keeps the HTTP client's default.
    pub timeout: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            expiry: DEFAULT_EXPIRY,
            quality: pipeline::DEFAULT_QUALITY,
            workers: DEFAULT_WORKERS,
            user_agent: concat!("svgfx-renderer/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
        }
    }
}

impl CacheConfig {
    /// Default settings with a different cache directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), ..Self::default() }
    }
}

// ============================================================================
// CacheEntry
// ============================================================================

/// A cached file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Sanitized URL.
    pub key: String,
    /// Location of the PNG file.
    pub path: PathBuf,
    /// Last modification time of the file.
    pub modified: SystemTime,
}

impl CacheEntry {
    /// Time since the entry was written. Future timestamps count as zero.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.modified).unwrap_or(Duration::ZERO)
    }

    /// Returns true once the entry is strictly older than `expiry`.
    pub fn is_expired(&self, now: SystemTime, expiry: Duration) -> bool {
        self.age(now) > expiry
    }
}

// ============================================================================
// ImageCache
// ============================================================================

/// Downloads, normalizes and caches remote images.
pub struct ImageCache {
    inner: Arc<CacheInner>,
    pool: ThreadPool,
}

struct CacheInner {
    config: CacheConfig,
    resources: Resources,
    fetcher: Box<dyn Fetch>,
    placeholder: OnceLock<Option<RgbaImage>>,
}

impl ImageCache {
    /// Creates a cache that downloads over HTTP.
    pub fn new(config: CacheConfig, resources: Resources) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.user_agent, config.timeout)?;
        Self::with_fetcher(config, resources, fetcher)
    }

    /// Creates a cache with a custom download implementation.
    pub fn with_fetcher(
        config: CacheConfig,
        resources: Resources,
        fetcher: impl Fetch + 'static,
    ) -> Result<Self> {
        let pool = pool::download_pool(config.workers)?;
        tracing::debug!(dir = %config.dir.display(), workers = pool.current_num_threads(), "Image cache ready");
        Ok(Self {
            inner: Arc::new(CacheInner {
                config,
                resources,
                fetcher: Box::new(fetcher),
                placeholder: OnceLock::new(),
            }),
            pool,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Location of the cache file for `url`, whether or not it exists.
    pub fn cache_path(&self, url: &str) -> PathBuf {
        self.inner.cache_path(url)
    }

    /// The cache entry for `url`, if a file exists (fresh or not).
    pub fn lookup(&self, url: &str) -> Option<CacheEntry> {
        self.inner.lookup(url)
    }

    /// Loads an image fitted to `width x height`.
    ///
    /// Serves a fresh cache entry when present, otherwise downloads. Blank
    /// URLs and failures yield the placeholder, fitted to the same box.
    pub fn load_image(&self, url: &str, width: u32, height: u32) -> RgbaImage {
        self.inner.load_image(url, width, height)
    }

    /// [`load_image`](Self::load_image) with the default 70x100 box.
    pub fn load_image_default(&self, url: &str) -> RgbaImage {
        self.load_image(url, DEFAULT_BOX.width, DEFAULT_BOX.height)
    }

    /// Loads on the worker pool and hands the result to `on_loaded`.
    ///
    /// The callback runs on a pool thread.
    pub fn load_image_async<F>(&self, url: impl Into<String>, width: u32, height: u32, on_loaded: F)
    where
        F: FnOnce(RgbaImage) + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let url = url.into();
        self.pool.spawn(move || on_loaded(inner.load_image(&url, width, height)));
    }

    /// [`load_image_async`](Self::load_image_async) with the default 70x100 box.
    pub fn load_image_default_async<F>(&self, url: impl Into<String>, on_loaded: F)
    where
        F: FnOnce(RgbaImage) + Send + 'static,
    {
        self.load_image_async(url, DEFAULT_BOX.width, DEFAULT_BOX.height, on_loaded);
    }

    /// Downloads, normalizes and persists `url`, returning the PNG payload.
    ///
    /// `None` on network or decode failure; write failures are only logged.
    pub fn fetch_payload(&self, url: &str, width: u32, height: u32) -> Option<Vec<u8>> {
        self.inner.fetch_payload(url, width.max(1), height.max(1))
    }

    /// The placeholder fitted to `width x height`.
    pub fn placeholder(&self, width: u32, height: u32) -> RgbaImage {
        self.inner.placeholder(width.max(1), height.max(1))
    }

    /// Removes the entry for `url`. Returns true if a file was deleted.
    pub fn evict(&self, url: &str) -> bool {
        let path = self.cache_path(url);
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to evict cache entry");
                false
            }
        }
    }

    /// Deletes every expired `.png` entry in the cache directory.
    pub fn purge_expired(&self) -> usize {
        let config = &self.inner.config;
        let Ok(dir) = fs::read_dir(&config.dir) else {
            return 0;
        };

        let now = SystemTime::now();
        let mut removed = 0;
        for entry in dir.flatten() {
            let path = entry.path();
            if !is_cache_file(&path) {
                continue;
            }
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| now.duration_since(modified).unwrap_or(Duration::ZERO) > config.expiry)
                .unwrap_or(false);
            if expired && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        tracing::debug!(removed, "Expired cache entries purged");
        removed
    }
}

impl CacheInner {
    fn cache_path(&self, url: &str) -> PathBuf {
        self.config.dir.join(format!("{}.png", cache_key(url)))
    }

    fn lookup(&self, url: &str) -> Option<CacheEntry> {
        let path = self.cache_path(url);
        let modified = fs::metadata(&path).ok()?.modified().ok()?;
        Some(CacheEntry { key: cache_key(url), path, modified })
    }

    fn load_image(&self, url: &str, width: u32, height: u32) -> RgbaImage {
        let (width, height) = (width.max(1), height.max(1));
        if is_blank(url) {
            tracing::debug!("Blank image URL; using placeholder");
            return self.placeholder(width, height);
        }

        if let Some(image) = self.load_cached(url, width, height) {
            return image;
        }

        self.fetch_payload(url, width, height)
            .and_then(|payload| decode_fitted(url, &payload, width, height))
            .unwrap_or_else(|| self.placeholder(width, height))
    }

    /// Reads a fresh entry. Unreadable or undecodable files count as misses.
    fn load_cached(&self, url: &str, width: u32, height: u32) -> Option<RgbaImage> {
        let entry = self.lookup(url)?;
        if entry.is_expired(SystemTime::now(), self.config.expiry) {
            tracing::debug!(key = %entry.key, "Cache entry expired");
            return None;
        }

        let bytes = fs::read(&entry.path)
            .inspect_err(|e| {
                tracing::warn!(path = %entry.path.display(), error = %e, "Failed to read cache entry");
            })
            .ok()?;
        let image = decode_fitted(url, &bytes, width, height)?;
        tracing::trace!(key = %entry.key, "Cache hit");
        Some(image)
    }

    fn fetch_payload(&self, url: &str, width: u32, height: u32) -> Option<Vec<u8>> {
        let bytes = self
            .fetcher
            .fetch(url)
            .inspect_err(|e| tracing::warn!(url, error = %e, "Error downloading image"))
            .ok()?;

        let payload = pipeline::normalize(&bytes, width, height, self.config.quality)
            .inspect_err(|e| tracing::warn!(url, error = %e, "Downloaded image is unusable"))
            .ok()?;

        self.persist(url, &payload);
        Some(payload)
    }

    fn persist(&self, url: &str, payload: &[u8]) {
        let path = self.cache_path(url);
        let written = fs::create_dir_all(&self.config.dir).and_then(|()| fs::write(&path, payload));
        match written {
            Ok(()) => tracing::debug!(path = %path.display(), bytes = payload.len(), "Image cached"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to write cache entry"),
        }
    }

    fn placeholder(&self, width: u32, height: u32) -> RgbaImage {
        let base = self.placeholder.get_or_init(|| {
            render_placeholder(&self.resources)
                .inspect_err(|e| tracing::error!(error = %e, "Placeholder unavailable"))
                .ok()
        });
        match base {
            Some(base) => pipeline::fill_image(base, width, height),
            None => RgbaImage::new(width, height),
        }
    }
}

fn decode_fitted(url: &str, bytes: &[u8], width: u32, height: u32) -> Option<RgbaImage> {
    image::load_from_memory(bytes)
        .inspect_err(|e| tracing::warn!(url, error = %e, "Error reading bytes from image"))
        .ok()
        .map(|decoded| pipeline::fill_image(&decoded.to_rgba8(), width, height))
}

fn render_placeholder(resources: &Resources) -> Result<RgbaImage> {
    let data = resources.open(PLACEHOLDER)?;
    let doc = SvgDocument::parse(PLACEHOLDER, &data)?;
    let size = crate::rasterizer::resolve_target_size(doc.intrinsic_size(), None, None);
    render::rasterize(PLACEHOLDER, doc.as_str(), size)
}

/// Returns true if `path` has the extension cache entries are written with.
pub fn is_cache_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "png")
}
