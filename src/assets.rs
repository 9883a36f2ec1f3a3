//! Bundled resources and resource lookup.
//!
//! The icon set, the theme stylesheet and the placeholder image are compiled
//! into the binary. A [`Resources`] handle can additionally point at a
//! directory on disk (consulted first) and hold in-memory entries registered
//! at runtime.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, SvgfxError};

/// Resource path of the theme stylesheet used for theme-token colors.
pub const THEME_STYLESHEET: &str = "themes/default.css";

/// Resource path of the placeholder shown when a remote image is unavailable.
pub const PLACEHOLDER: &str = "noimage.svg";

macro_rules! bundled {
    ($($path:literal),* $(,)?) => {
        &[$(($path, include_bytes!(concat!("../assets/", $path)) as &[u8])),*]
    };
}

static BUNDLED: &[(&str, &[u8])] = bundled![
    "icons/bi/bi-arrow-left-circle.svg",
    "icons/bi/bi-arrow-left-square-fill.svg",
    "icons/bi/bi-arrow-repeat.svg",
    "icons/bi/bi-bank.svg",
    "icons/bi/bi-box-arrow-in-down.svg",
    "icons/bi/bi-box-arrow-up.svg",
    "icons/bi/bi-calculator.svg",
    "icons/bi/bi-cart-x.svg",
    "icons/bi/bi-cash-coin.svg",
    "icons/bi/bi-cash-stack.svg",
    "icons/bi/bi-clock.svg",
    "icons/bi/bi-currency-dollar.svg",
    "icons/bi/bi-database-fill-x.svg",
    "icons/bi/bi-door-open.svg",
    "icons/bi/bi-gear.svg",
    "icons/bi/bi-grid.svg",
    "icons/bi/bi-lock.svg",
    "icons/bi/bi-palette.svg",
    "icons/bi/bi-percent.svg",
    "icons/bi/bi-person-add.svg",
    "icons/bi/bi-printer.svg",
    "icons/bi/bi-receipt.svg",
    "icons/bi/bi-rulers.svg",
    "icons/bi/bi-save.svg",
    "icons/bi/bi-trash.svg",
    "icons/bi/bi-upc-scan.svg",
    "icons/bi/bi-x-circle.svg",
    "themes/default.css",
    "noimage.svg",
];

/// Looks up a compiled-in resource.
pub fn bundled(path: &str) -> Option<&'static [u8]> {
    let path = normalize(path);
    BUNDLED
        .iter()
        .find(|(candidate, _)| *candidate == path)
        .map(|(_, data)| *data)
}

/// Strips a leading slash so `/icons/x.svg` and `icons/x.svg` resolve alike.
fn normalize(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Resource resolver shared by the rasterizer and the image cache.
///
/// Lookup order: in-memory entries, the configured directory, bundled data.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    root: Option<PathBuf>,
    entries: HashMap<String, Arc<[u8]>>,
}

impl Resources {
    /// Resources backed only by the bundled data.
    pub fn bundled() -> Self {
        Self::default()
    }

    /// Resources that consult `root` before the bundled data.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()), entries: HashMap::new() }
    }

    /// The directory consulted before the bundled data, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Registers an in-memory resource, replacing any previous entry.
    pub fn insert(&mut self, path: impl AsRef<str>, data: impl Into<Vec<u8>>) {
        let data: Vec<u8> = data.into();
        self.entries.insert(normalize(path.as_ref()).to_string(), Arc::from(data));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_entry(mut self, path: impl AsRef<str>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }

    /// Reads a resource.
    ///
    /// Returns [`SvgfxError::ResourceNotFound`] when no source has it and
    /// [`SvgfxError::Io`] when the file exists on disk but cannot be read.
    pub fn open(&self, path: &str) -> Result<Cow<'static, [u8]>> {
        let key = normalize(path);

        if let Some(data) = self.entries.get(key) {
            return Ok(Cow::Owned(data.to_vec()));
        }

        if let Some(root) = &self.root {
            let file = root.join(key);
            if file.is_file() {
                return std::fs::read(&file)
                    .map(Cow::Owned)
                    .map_err(|e| SvgfxError::io(file.display().to_string(), e));
            }
        }

        bundled(key)
            .map(Cow::Borrowed)
            .ok_or_else(|| SvgfxError::not_found(path))
    }

    /// Returns true if [`open`](Self::open) would find the resource.
    pub fn contains(&self, path: &str) -> bool {
        let key = normalize(path);
        self.entries.contains_key(key)
            || self.root.as_ref().is_some_and(|root| root.join(key).is_file())
            || bundled(key).is_some()
    }
}
