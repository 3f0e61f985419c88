//! Errors specific to package.json handling.
//!
//! These cover manifest syntax, malformed `files` entries, package-name
//! validation, and talking to the npm registry or bundlephobia.

use thiserror::Error;

/// Errors specific to package.json handling.
#[derive(Error, Debug)]
pub enum NpmError {
    /// Manifest text is not valid JSON.
    #[error("Invalid JSON at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Manifest JSON does not fit the expected shape.
    #[error("Failed to parse package.json: {source}")]
    JsonParseError {
        #[source]
        source: serde_json::Error,
    },

    /// An entry of the `files` array is not a string.
    #[error("Entry {index} of the files field is not a string")]
    InvalidFilesEntry { index: usize },

    /// The `files` field is present but is not an array.
    #[error("The files field must be an array")]
    InvalidFilesField,

    /// Name rejected by the registry naming rules.
    #[error("Invalid package name '{name}': {reason}")]
    InvalidPackageName { name: String, reason: String },

    /// Package not found on the npm registry.
    #[error("Package '{package}' not found on npm registry")]
    PackageNotFound { package: String },

    /// A remote metadata source failed.
    #[error("Request to {source_name} failed for '{package}': {source}")]
    RegistryError {
        source_name: &'static str,
        package: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to deserialize a remote API response.
    #[error("Failed to parse {source_name} response for '{package}': {source}")]
    ApiResponseError {
        source_name: &'static str,
        package: String,
        #[source]
        source: serde_json::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for npm operations.
pub type Result<T> = std::result::Result<T, NpmError>;

impl NpmError {
    /// Create a registry error from any error type.
    pub fn registry_error(
        source_name: &'static str,
        package: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::RegistryError {
            source_name,
            package: package.into(),
            source: Box::new(error),
        }
    }

    /// Create an API response error.
    pub fn api_response_error(
        source_name: &'static str,
        package: impl Into<String>,
        error: serde_json::Error,
    ) -> Self {
        Self::ApiResponseError {
            source_name,
            package: package.into(),
            source: error,
        }
    }

    /// Create an invalid package name error.
    pub fn invalid_package_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPackageName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Maps a core fetch error, turning 404 into [`NpmError::PackageNotFound`].
    pub fn from_fetch(
        source_name: &'static str,
        package: &str,
        err: pkglens_core::LensError,
    ) -> Self {
        if err.is_not_found() {
            Self::PackageNotFound {
                package: package.to_string(),
            }
        } else {
            Self::registry_error(source_name, package, err)
        }
    }
}

/// Convert to the core error for interoperability.
impl From<NpmError> for pkglens_core::LensError {
    fn from(err: NpmError) -> Self {
        match err {
            NpmError::JsonParseError { source } => Self::Json(source),
            NpmError::Io(e) => Self::Io(e),
            other => Self::ParseError {
                file_type: "package.json".into(),
                source: Box::new(other),
            },
        }
    }
}
