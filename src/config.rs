//! Library configuration loaded from JSON.
//!
//! Every field has a default, so an empty object (or no file at all) yields
//! the stock setup: cache under `~/.imagecache`, 24 hour expiry, quality
//! 0.1, five download workers and a two second debounce.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assets::Resources;
use crate::cache::{self, CacheConfig};
use crate::error::{Result, SvgfxError};
use crate::view::ViewSettings;

/// Environment variable that overrides [`SvgfxConfig::cache_dir`].
pub const CACHE_DIR_ENV: &str = "SVGFX_CACHE_DIR";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct SvgfxConfig {
    /// Directory for cached images.
    pub cache_dir: PathBuf,
    /// Cache entry lifetime in seconds.
    pub cache_expiry_secs: u64,
    /// Recompression quality, 0.0 to 1.0.
    pub quality: f32,
    /// Background download workers.
    pub workers: usize,
    /// HTTP request timeout in seconds. Absent keeps the client default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub user_agent: String,
    /// Debounce delay for views, in milliseconds.
    pub debounce_ms: u64,
    pub icon_size: f64,
    pub svg_width: f64,
    pub svg_height: f64,
    /// Directory searched for resources before the bundled set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_dir: Option<PathBuf>,
}

impl Default for SvgfxConfig {
    fn default() -> Self {
        let cache = CacheConfig::default();
        let view = ViewSettings::default();
        Self {
            cache_dir: cache.dir,
            cache_expiry_secs: cache.expiry.as_secs(),
            quality: cache.quality,
            workers: cache.workers,
            request_timeout_secs: None,
            user_agent: cache.user_agent,
            debounce_ms: view.debounce.as_millis() as u64,
            icon_size: view.icon_size,
            svg_width: view.svg_width,
            svg_height: view.svg_height,
            resource_dir: None,
        }
    }
}

impl SvgfxConfig {
    /// Parses a configuration document and applies environment overrides.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self =
            serde_json::from_str(json).map_err(|e| SvgfxError::Config(e.to_string()))?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                tracing::debug!(path = %path.display(), "Loading configuration");
                Self::from_json(&json)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No configuration file; using defaults");
                let mut config = Self::default();
                config.apply_env();
                Ok(config)
            }
            Err(e) => Err(SvgfxError::io(path.display().to_string(), e)),
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SvgfxError::Config(e.to_string()))
    }

    fn apply_env(&mut self) {
        if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
            self.cache_dir = PathBuf::from(dir);
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(SvgfxError::Config(format!(
                "quality must be between 0 and 1, got {}",
                self.quality
            )));
        }
        if self.workers == 0 {
            return Err(SvgfxError::Config("workers must be at least 1".into()));
        }
        Ok(())
    }

    /// Settings for [`ImageCache`](crate::ImageCache).
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            dir: self.cache_dir.clone(),
            expiry: Duration::from_secs(self.cache_expiry_secs),
            quality: self.quality,
            workers: self.workers,
            user_agent: self.user_agent.clone(),
            timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Settings for [`IconView`](crate::IconView) and
    /// [`SvgImageView`](crate::SvgImageView).
    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            icon_size: self.icon_size,
            svg_width: self.svg_width,
            svg_height: self.svg_height,
        }
    }

    /// Resource lookup rooted at [`resource_dir`](Self::resource_dir) when set.
    pub fn resources(&self) -> Resources {
        match &self.resource_dir {
            Some(dir) => Resources::with_root(dir),
            None => Resources::bundled(),
        }
    }

    /// Default configuration file location, `<home>/.imagecache/svgfx.json`.
    pub fn default_path() -> PathBuf {
        cache::default_cache_dir().join("svgfx.json")
    }
}
