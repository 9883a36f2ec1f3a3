//! Error types for rasterization, caching and configuration.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = SvgfxError> = std::result::Result<T, E>;

/// Main error type.
///
/// Resource and transcoding failures are fatal to the caller. Network and
/// cache failures are recovered inside [`ImageCache`](crate::ImageCache) and
/// only surface from the lower-level fetch APIs.
#[derive(Debug, Error)]
pub enum SvgfxError {
    /// A bundled or on-disk resource could not be found.
    #[error("Resource not found: {path}")]
    ResourceNotFound {
        /// Resource path as requested.
        path: String,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File the operation was targeting.
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The SVG document could not be parsed or rasterized.
    #[error("Transcoding failed for {label}: {message}")]
    Transcode {
        /// Resource path or caller-supplied label.
        label: String,
        /// Human-readable reason.
        message: String,
    },

    /// A color string is neither a theme token, a hex value nor a known name.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// The theme stylesheet could not be parsed.
    #[error("Stylesheet error: {0}")]
    Stylesheet(String),

    /// The HTTP request failed or returned a non-success status.
    #[error("Network error for {url}: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Human-readable reason.
        message: String,
    },

    /// Image bytes could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// A raster could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),

    /// The background download pool could not be started.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Configuration file is missing or malformed.
    #[error("Config error: {0}")]
    Config(String),
}

impl SvgfxError {
    /// Create a resource-not-found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::ResourceNotFound { path: path.into() }
    }

    /// Create an I/O error for the given path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Create a transcoding error.
    pub fn transcode(label: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Transcode { label: label.into(), message: message.to_string() }
    }

    /// Create a network error.
    pub fn network(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Network { url: url.into(), message: message.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = SvgfxError::not_found("icons/bi/bi-missing.svg");
        assert_eq!(err.to_string(), "Resource not found: icons/bi/bi-missing.svg");

        let err = SvgfxError::transcode("logo.svg", "unexpected end of stream");
        assert!(err.to_string().contains("logo.svg"));
        assert!(err.to_string().contains("unexpected end of stream"));
    }
}
