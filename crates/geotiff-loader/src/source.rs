//! Raster byte sources.
//!
//! A source yields the complete file contents; it owns no decoding logic.
//! Failures surface as [`OverlayError::Fetch`] so callers can drop the
//! affected layer without touching the others.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use overlay_common::{OverlayError, OverlayResult};
use tracing::debug;

/// Something that can produce the raw bytes of a raster file.
#[async_trait]
pub trait RasterSource: Send + Sync {
    /// Fetch the full file contents.
    async fn fetch(&self) -> OverlayResult<Bytes>;

    /// Human-readable location for logs and errors.
    fn describe(&self) -> String;
}

/// Raster stored on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RasterSource for FileSource {
    async fn fetch(&self) -> OverlayResult<Bytes> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| OverlayError::fetch(self.describe(), e.to_string()))?;
        Ok(Bytes::from(data))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Raster served over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(url: impl Into<String>) -> OverlayResult<Self> {
        Self::with_timeout(url, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> OverlayResult<Self> {
        let url = url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OverlayError::fetch(url.clone(), e.to_string()))?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl RasterSource for HttpSource {
    async fn fetch(&self) -> OverlayResult<Bytes> {
        debug!(url = %self.url, "Fetching raster");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| OverlayError::fetch(&self.url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OverlayError::fetch(&self.url, format!("HTTP {}", status)));
        }

        response
            .bytes()
            .await
            .map_err(|e| OverlayError::fetch(&self.url, e.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Raster already held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    data: Bytes,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

#[async_trait]
impl RasterSource for MemorySource {
    async fn fetch(&self) -> OverlayResult<Bytes> {
        Ok(self.data.clone())
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }
}
