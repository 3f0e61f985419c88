use thiserror::Error;

/// Core error types for pkglens.
///
/// Covers the plumbing shared by every crate in the workspace: HTTP fetches,
/// cache bookkeeping, filesystem access, and URI handling. Domain-specific
/// failures (manifest syntax, invalid package names) live in `pkglens-npm`.
///
/// # Examples
///
/// ```
/// use pkglens_core::error::{LensError, Result};
///
/// fn fetch(url: &str) -> Result<()> {
///     if !url.starts_with("https://") {
///         return Err(LensError::CacheError(format!("URL must use HTTPS: {url}")));
///     }
///     Ok(())
/// }
///
/// assert!(fetch("http://example.com").is_err());
/// ```
#[derive(Error, Debug)]
pub enum LensError {
    #[error("failed to parse {file_type}: {source}")]
    ParseError {
        file_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("request failed for {url}: {source}")]
    RegistryError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URI: {0}")]
    InvalidUri(String),
}

impl LensError {
    /// Returns `true` when the remote end answered with 404.
    ///
    /// Registry clients use this to tell "package does not exist" apart from
    /// transport failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 404, .. })
    }
}

/// Convenience type alias for `Result<T, LensError>`.
pub type Result<T> = std::result::Result<T, LensError>;
