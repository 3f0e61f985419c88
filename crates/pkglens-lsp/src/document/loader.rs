//! Document loading from the filesystem.
//!
//! An editor may already have a manifest open when the server starts and
//! never send `didOpen` for it. Handlers that receive a request for an
//! unknown document pull it from disk through [`ensure_document_loaded`].
//!
//! Files above 10MB are rejected; non-UTF-8 files fail to load.

use super::state::{DocumentKind, DocumentState, ServerState};
use pkglens_core::{LensError, Result};
use std::path::PathBuf;
use tower_lsp_server::ls_types::Uri;

/// Maximum allowed file size in bytes (10MB).
const MAX_FILE_SIZE: u64 = 10_000_000;

/// Large file warning threshold (1MB).
const LARGE_FILE_THRESHOLD: u64 = 1_000_000;

/// Loads document content from disk.
///
/// # Errors
///
/// - `LensError::InvalidUri` - URI is not a file:// URI
/// - `LensError::CacheError` - file exceeds the size limit
/// - `LensError::Io` - file read error (not found, permission denied, etc.)
///
/// # Examples
///
/// ```no_run
/// use pkglens_lsp::document::load_document_from_disk;
/// use tower_lsp_server::ls_types::Uri;
///
/// # async fn example() -> pkglens_core::Result<()> {
/// let uri = Uri::from_file_path("/path/to/package.json").unwrap();
/// let content = load_document_from_disk(&uri).await?;
/// println!("Loaded {} bytes", content.len());
/// # Ok(())
/// # }
/// ```
pub async fn load_document_from_disk(uri: &Uri) -> Result<String> {
    let Some(path) = file_path(uri) else {
        tracing::debug!("Cannot load non-file URI: {:?}", uri);
        return Err(LensError::InvalidUri(uri.as_str().to_string()));
    };

    let metadata = tokio::fs::metadata(&path)
        .await
        .inspect_err(|e| log_io_error("reading metadata for", &path, e))?;

    let size = metadata.len();
    if size > MAX_FILE_SIZE {
        tracing::error!(
            "Document exceeds maximum size: {} bytes (limit: {} bytes)",
            size,
            MAX_FILE_SIZE
        );
        return Err(LensError::CacheError(format!(
            "file too large: {size} bytes (max: {MAX_FILE_SIZE} bytes)"
        )));
    }
    if size > LARGE_FILE_THRESHOLD {
        tracing::warn!("Document is large: {} bytes for {:?}", size, path);
    }

    let content = tokio::fs::read_to_string(&path)
        .await
        .inspect_err(|e| log_io_error("reading", &path, e))?;

    tracing::debug!("Loaded document: {:?} ({} bytes)", path, content.len());
    Ok(content)
}

/// Filesystem path of a `file:` URI.
///
/// Other schemes (`untitled:`, `git:` diff views and the like) have no
/// on-disk counterpart and yield `None`.
pub fn file_path(uri: &Uri) -> Option<PathBuf> {
    let is_file = uri
        .as_str()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("file:"));
    if !is_file {
        return None;
    }
    uri.to_file_path().map(|path| path.into_owned())
}

fn log_io_error(action: &str, path: &std::path::Path, e: &std::io::Error) {
    match e.kind() {
        std::io::ErrorKind::NotFound => {
            tracing::debug!("File not found while {} {:?}", action, path);
        }
        std::io::ErrorKind::PermissionDenied => {
            tracing::warn!("Permission denied while {} {:?}", action, path);
        }
        _ => {
            tracing::error!("IO error while {} {:?}: {}", action, path, e);
        }
    }
}

/// Makes sure `uri` is in the document store, loading it from disk if needed.
///
/// Returns `false` for unsupported file names and unreadable files.
pub async fn ensure_document_loaded(uri: &Uri, state: &ServerState) -> bool {
    if state.documents.contains_key(uri) {
        return true;
    }

    let Some(kind) = DocumentKind::from_uri(uri) else {
        tracing::debug!("Unsupported file type: {:?}", uri);
        return false;
    };

    tracing::info!("Loading document from disk (cold start): {:?}", uri);
    match load_document_from_disk(uri).await {
        Ok(content) => {
            state.update_document(uri.clone(), DocumentState::new(kind, content));
            true
        }
        Err(e) => {
            tracing::warn!("Failed to load document {:?}: {}", uri, e);
            false
        }
    }
}
