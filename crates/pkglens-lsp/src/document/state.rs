use crate::config::CacheConfig;
use dashmap::DashMap;
use pkglens_core::HttpCache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_lsp_server::ls_types::Uri;

/// Files the server annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// `package.json`: file lenses and dependency hovers.
    PackageJson,
    /// `pnpm-workspace.yaml`: catalog entry hovers.
    PnpmWorkspace,
}

impl DocumentKind {
    /// Detects the kind from a bare file name.
    pub fn from_filename(filename: &str) -> Option<Self> {
        match filename {
            "package.json" => Some(Self::PackageJson),
            "pnpm-workspace.yaml" => Some(Self::PnpmWorkspace),
            _ => None,
        }
    }

    /// Detects the kind from the last segment of a URI path.
    pub fn from_uri(uri: &Uri) -> Option<Self> {
        let path = uri.path();
        let filename = path.as_str().split('/').next_back()?;
        Self::from_filename(filename)
    }
}

/// State for a single open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    pub kind: DocumentKind,
    /// Full text as last synchronized by the client.
    pub content: String,
}

impl DocumentState {
    pub fn new(kind: DocumentKind, content: String) -> Self {
        Self { kind, content }
    }
}

/// Global server state shared by all handlers.
///
/// Documents live in a `DashMap` so handlers can read them concurrently.
/// The HTTP cache sits behind a lock because a configuration change
/// replaces it wholesale.
///
/// # Examples
///
/// ```
/// use pkglens_lsp::document::ServerState;
///
/// let state = ServerState::new();
/// assert_eq!(state.document_count(), 0);
/// ```
pub struct ServerState {
    /// Open documents by URI
    pub documents: DashMap<Uri, DocumentState>,
    workspace_roots: RwLock<Vec<PathBuf>>,
    cache: RwLock<Arc<HttpCache>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            workspace_roots: RwLock::new(Vec::new()),
            cache: RwLock::new(Arc::new(HttpCache::new())),
        }
    }

    /// Retrieves a cloned copy of the document so no map lock is held
    /// across awaits.
    pub fn get_document(&self, uri: &Uri) -> Option<DocumentState> {
        self.documents.get(uri).map(|doc| doc.clone())
    }

    /// Updates or inserts document state.
    pub fn update_document(&self, uri: Uri, state: DocumentState) {
        self.documents.insert(uri, state);
    }

    /// Removes document state and returns the removed entry.
    pub fn remove_document(&self, uri: &Uri) -> Option<(Uri, DocumentState)> {
        self.documents.remove(uri)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub async fn set_workspace_roots(&self, roots: Vec<PathBuf>) {
        tracing::debug!("workspace roots: {:?}", roots);
        *self.workspace_roots.write().await = roots;
    }

    /// The innermost workspace root containing `path`.
    ///
    /// Bounds the upward `node_modules` walk so it never leaves the
    /// workspace the file belongs to.
    pub async fn workspace_root_for(&self, path: &Path) -> Option<PathBuf> {
        self.workspace_roots
            .read()
            .await
            .iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .cloned()
    }

    /// The HTTP cache currently in use.
    pub async fn http_cache(&self) -> Arc<HttpCache> {
        Arc::clone(&*self.cache.read().await)
    }

    /// Replaces the HTTP cache according to `config`.
    ///
    /// Previously cached responses are dropped.
    pub async fn set_cache(&self, config: &CacheConfig) {
        let cache = if config.enabled {
            HttpCache::with_max_age(Duration::from_secs(config.refresh_interval_secs))
        } else {
            HttpCache::disabled()
        };
        *self.cache.write().await = Arc::new(cache);
        tracing::debug!(
            "HTTP cache configured: enabled={}, refresh_interval={}s",
            config.enabled,
            config.refresh_interval_secs
        );
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
