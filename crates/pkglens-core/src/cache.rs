use crate::error::{LensError, Result};
use dashmap::DashMap;
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maximum number of cached entries to prevent unbounded memory growth.
const MAX_CACHE_ENTRIES: usize = 1000;

/// Default freshness window for cached responses.
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

/// Timeout applied to every outgoing request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Validates that a URL uses HTTPS protocol.
///
/// In test mode, HTTP URLs are allowed for mockito compatibility.
#[inline]
fn ensure_https(url: &str) -> Result<()> {
    #[cfg(not(test))]
    if !url.starts_with("https://") {
        return Err(LensError::CacheError(format!("URL must use HTTPS: {url}")));
    }
    #[cfg(test)]
    let _ = url;
    Ok(())
}

/// Cached HTTP response with validation headers.
///
/// The body is wrapped in `Arc` so every consumer of the same URL shares one
/// buffer.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: Arc<Vec<u8>>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub fetched_at: Instant,
}

impl CachedResponse {
    fn is_fresh(&self, max_age: Duration) -> bool {
        self.fetched_at.elapsed() < max_age
    }
}

/// HTTP cache with freshness window and ETag / Last-Modified revalidation.
///
/// Entries younger than `max_age` are served straight from memory. Older
/// entries are revalidated with `If-None-Match` / `If-Modified-Since`; a 304
/// refreshes the timestamp and keeps the body. When revalidation fails on the
/// network level the stale body is served instead.
///
/// # Examples
///
/// ```no_run
/// use pkglens_core::cache::HttpCache;
///
/// # async fn example() -> pkglens_core::error::Result<()> {
/// let cache = HttpCache::new();
///
/// let first = cache.get_cached("https://registry.npmjs.org/react/latest").await?;
/// let second = cache.get_cached("https://registry.npmjs.org/react/latest").await?;
///
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// # Ok(())
/// # }
/// ```
pub struct HttpCache {
    entries: DashMap<String, CachedResponse>,
    client: Client,
    max_age: Duration,
    enabled: bool,
}

impl HttpCache {
    /// Creates a cache with the default five minute freshness window.
    pub fn new() -> Self {
        Self::with_max_age(DEFAULT_MAX_AGE)
    }

    /// Creates a cache whose entries stay fresh for `max_age`.
    pub fn with_max_age(max_age: Duration) -> Self {
        let client = Client::builder()
            .user_agent(concat!("pkglens/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("failed to configure HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            entries: DashMap::new(),
            client,
            max_age,
            enabled: true,
        }
    }

    /// Creates a pass-through instance that never stores responses.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Retrieves data from URL, consulting the cache first.
    ///
    /// # Errors
    ///
    /// Returns `LensError::RegistryError` when the network request fails and
    /// nothing is cached, and `LensError::HttpStatus` for non-2xx answers.
    pub async fn get_cached(&self, url: &str) -> Result<Arc<Vec<u8>>> {
        if !self.enabled {
            return self.fetch(url).await.map(|response| response.body);
        }

        if self.entries.len() >= MAX_CACHE_ENTRIES {
            self.evict_entries();
        }

        // Clone out of the map so no shard lock is held across await points
        let cached = self.entries.get(url).map(|entry| entry.value().clone());

        if let Some(cached) = cached {
            if cached.is_fresh(self.max_age) {
                tracing::trace!("cache hit: {}", url);
                return Ok(cached.body);
            }

            return match self.conditional_request(url, &cached).await {
                Ok(Some(new_body)) => Ok(new_body),
                Ok(None) => {
                    if let Some(mut entry) = self.entries.get_mut(url) {
                        entry.fetched_at = Instant::now();
                    }
                    Ok(cached.body)
                }
                Err(e) => {
                    tracing::warn!("revalidation failed, serving stale entry: {}", e);
                    Ok(cached.body)
                }
            };
        }

        self.fetch_and_store(url).await
    }

    /// Performs a conditional request using the cached validation headers.
    ///
    /// Returns `Ok(None)` on 304 Not Modified.
    async fn conditional_request(
        &self,
        url: &str,
        cached: &CachedResponse,
    ) -> Result<Option<Arc<Vec<u8>>>> {
        ensure_https(url)?;
        let mut request = self.client.get(url);

        if let Some(etag) = &cached.etag {
            request = request.header(header::IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = &cached.last_modified {
            request = request.header(header::IF_MODIFIED_SINCE, last_modified);
        }

        let response = request.send().await.map_err(|e| LensError::RegistryError {
            url: url.to_string(),
            source: e,
        })?;

        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(None);
        }

        let fresh = Self::read_response(url, response).await?;
        let body = Arc::clone(&fresh.body);
        self.entries.insert(url.to_string(), fresh);

        Ok(Some(body))
    }

    /// Fetches a fresh response and stores it.
    pub(crate) async fn fetch_and_store(&self, url: &str) -> Result<Arc<Vec<u8>>> {
        let fresh = self.fetch(url).await?;
        let body = Arc::clone(&fresh.body);
        self.entries.insert(url.to_string(), fresh);
        Ok(body)
    }

    async fn fetch(&self, url: &str) -> Result<CachedResponse> {
        ensure_https(url)?;
        tracing::debug!("fetching fresh: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LensError::RegistryError {
                url: url.to_string(),
                source: e,
            })?;

        Self::read_response(url, response).await
    }

    async fn read_response(url: &str, response: reqwest::Response) -> Result<CachedResponse> {
        let status = response.status();
        if !status.is_success() {
            return Err(LensError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let last_modified = response
            .headers()
            .get(header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response
            .bytes()
            .await
            .map_err(|e| LensError::RegistryError {
                url: url.to_string(),
                source: e,
            })?;

        Ok(CachedResponse {
            body: Arc::new(body.to_vec()),
            etag,
            last_modified,
            fetched_at: Instant::now(),
        })
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evicts the oldest tenth of the entries.
    fn evict_entries(&self) {
        let target_removals = MAX_CACHE_ENTRIES / 10;

        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().fetched_at))
            .collect();
        by_age.sort_by_key(|(_, time)| *time);

        let mut removed = 0;
        for (url, _) in by_age.iter().take(target_removals) {
            self.entries.remove(url);
            removed += 1;
        }

        tracing::debug!("evicted {} cache entries", removed);
    }
}

impl Default for HttpCache {
    fn default() -> Self {
        Self::new()
    }
}
