//! Bundle size lookups via bundlephobia.

use crate::error::{NpmError, Result};
use async_trait::async_trait;
use pkglens_core::HttpCache;
use serde::Deserialize;
use std::sync::Arc;

const SOURCE_NAME: &str = "bundlephobia";

pub const BUNDLEPHOBIA_BASE: &str = "https://bundlephobia.com";

/// Minified and gzipped size of a package build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSize {
    /// Minified size in bytes.
    pub size: u64,
    /// Minified + gzipped size in bytes.
    pub gzip: u64,
    #[serde(default)]
    pub dependency_count: Option<u32>,
}

/// Source of bundle size figures.
#[async_trait]
pub trait BundleSizeClient: Send + Sync {
    async fn get_size(&self, name: &str, version: &str) -> Result<BundleSize>;
}

#[derive(Clone)]
pub struct Bundlephobia {
    cache: Arc<HttpCache>,
    base_url: String,
}

impl Bundlephobia {
    pub fn new(cache: Arc<HttpCache>) -> Self {
        Self {
            cache,
            base_url: BUNDLEPHOBIA_BASE.to_string(),
        }
    }

    pub fn size_url(&self, name: &str, version: &str) -> String {
        format!(
            "{}/api/size?package={}",
            self.base_url,
            urlencoding::encode(&format!("{name}@{version}"))
        )
    }
}

#[async_trait]
impl BundleSizeClient for Bundlephobia {
    async fn get_size(&self, name: &str, version: &str) -> Result<BundleSize> {
        let url = self.size_url(name, version);
        let data = self
            .cache
            .get_cached(&url)
            .await
            .map_err(|e| NpmError::from_fetch(SOURCE_NAME, name, e))?;

        serde_json::from_slice(&data).map_err(|e| NpmError::api_response_error(SOURCE_NAME, name, e))
    }
}

/// Formats a byte count the way bundle reports do: `512 B`, `1.5 kB`, `2.3 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let value = bytes as f64;
    if value < KB {
        format!("{bytes} B")
    } else if value < KB * KB {
        format!("{:.1} kB", value / KB)
    } else {
        format!("{:.1} MB", value / (KB * KB))
    }
}
