//! npm registry client.
//!
//! Fetches single-version documents from
//! <https://registry.npmjs.org/{package}/{version}>, where `version` is an
//! exact version or a dist-tag such as `latest`. The document is the
//! published package.json plus registry fields, so it deserializes into a
//! [`Manifest`].
//!
//! All HTTP requests go through the shared [`HttpCache`].

use crate::error::{NpmError, Result};
use crate::manifest::Manifest;
use async_trait::async_trait;
use pkglens_core::HttpCache;
use std::sync::Arc;

const SOURCE_NAME: &str = "npm registry";

pub const REGISTRY_BASE: &str = "https://registry.npmjs.org";

/// Base URL for package pages on npmjs.com
pub const NPMJS_URL: &str = "https://www.npmjs.com/package";

/// Returns the URL for a package's page on npmjs.com.
///
/// Each path segment is URL-encoded; the scope separator is kept.
pub fn package_url(name: &str) -> String {
    let encoded: Vec<_> = name.split('/').map(urlencoding::encode).collect();
    format!("{}/{}", NPMJS_URL, encoded.join("/"))
}

/// Source of published package documents.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetches the document for `version` (an exact version or dist-tag).
    async fn get_version(&self, name: &str, version: &str) -> Result<Manifest>;
}

/// Client for the npm registry.
#[derive(Clone)]
pub struct NpmRegistry {
    cache: Arc<HttpCache>,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a client for the public registry.
    pub fn new(cache: Arc<HttpCache>) -> Self {
        Self::with_base_url(cache, REGISTRY_BASE)
    }

    /// Creates a client for a registry mirror.
    pub fn with_base_url(cache: Arc<HttpCache>, base_url: impl Into<String>) -> Self {
        Self {
            cache,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL of a version document. Scoped names keep their `@` and encode
    /// the slash, which is what the registry expects.
    pub fn version_url(&self, name: &str, version: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            name.replace('/', "%2F"),
            urlencoding::encode(version)
        )
    }
}

#[async_trait]
impl RegistryClient for NpmRegistry {
    async fn get_version(&self, name: &str, version: &str) -> Result<Manifest> {
        let url = self.version_url(name, version);
        let data = self
            .cache
            .get_cached(&url)
            .await
            .map_err(|e| NpmError::from_fetch(SOURCE_NAME, name, e))?;

        parse_version_document(name, &data)
    }
}

fn parse_version_document(name: &str, data: &[u8]) -> Result<Manifest> {
    serde_json::from_slice(data).map_err(|e| NpmError::api_response_error(SOURCE_NAME, name, e))
}
