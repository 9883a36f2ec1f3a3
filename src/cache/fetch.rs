//! Image download seam.

use std::time::Duration;

use crate::error::{Result, SvgfxError};

/// Downloads the raw bytes behind a URL.
///
/// Implemented by [`HttpFetcher`] and by any `Fn(&str) -> Result<Vec<u8>>`
/// closure, which is how tests substitute the network.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

impl<F> Fetch for F
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self(url)
    }
}

/// Single-GET HTTP fetcher. No retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Builds a client with the given user agent and optional request timeout.
    ///
    /// `None` keeps the client's default timeout.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SvgfxError::network("<client>", e))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| SvgfxError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SvgfxError::network(url, format!("HTTP {}", status.as_u16())));
        }

        let bytes = response.bytes().map_err(|e| SvgfxError::network(url, e))?;
        tracing::debug!(url, bytes = bytes.len(), "Image downloaded");
        Ok(bytes.to_vec())
    }
}
