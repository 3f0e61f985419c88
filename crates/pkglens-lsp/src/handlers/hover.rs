//! Hover over dependency names.
//!
//! Works on dependency keys in package.json and on catalog entries in
//! pnpm-workspace.yaml. The installed copy is found by walking
//! `node_modules` upward from the document, bounded by the workspace root.

use crate::config::LensConfig;
use crate::document::{DocumentKind, ServerState, ensure_document_loaded, file_path};
use pkglens_core::LineIndex;
use pkglens_npm::{
    Bundlephobia, Manifest, MetadataAggregator, NpmRegistry, find_install_dir, locate,
    locate_catalog_entry, render_markdown,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp_server::ls_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind, Range};

/// A dependency the cursor is on, in either supported file.
#[derive(Debug, Clone, PartialEq)]
struct HoverTarget {
    name: String,
    range_text: String,
    name_range: Range,
}

pub async fn handle_hover(
    state: Arc<ServerState>,
    params: HoverParams,
    config: Arc<RwLock<LensConfig>>,
) -> Option<Hover> {
    let hover_config = config.read().await.hover.clone();
    if !hover_config.enabled {
        return None;
    }

    let cache = state.http_cache().await;
    let aggregator = MetadataAggregator::new(
        Arc::new(NpmRegistry::new(Arc::clone(&cache))),
        Arc::new(Bundlephobia::new(cache)),
        hover_config.aggregator_options(),
    );
    hover_with(&state, &params, &aggregator).await
}

async fn hover_with(
    state: &ServerState,
    params: &HoverParams,
    aggregator: &MetadataAggregator,
) -> Option<Hover> {
    let uri = &params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    if !ensure_document_loaded(uri, state).await {
        tracing::warn!("Could not load document for hover: {:?}", uri);
        return None;
    }
    let doc = state.get_document(uri)?;

    let offset = LineIndex::new(&doc.content).offset(&doc.content, position)?;
    let target = find_target(doc.kind, &doc.content, offset)?;

    let installed = match file_path(uri) {
        Some(path) => installed_manifest(state, &target.name, &path).await,
        None => None,
    };

    let metadata = aggregator
        .describe(&target.name, installed.as_ref(), Some(target.range_text.as_str()))
        .await;

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: render_markdown(&metadata),
        }),
        range: Some(target.name_range),
    })
}

/// Manifest of the copy of `name` that `document` resolves to, if any.
async fn installed_manifest(state: &ServerState, name: &str, document: &Path) -> Option<Manifest> {
    let boundary = state.workspace_root_for(document).await;
    let dir = find_install_dir(name, document, boundary.as_deref()).await?;
    Manifest::read(&dir.join("package.json"))
        .await
        .inspect_err(|e| tracing::debug!("unreadable manifest in {}: {}", dir.display(), e))
        .ok()
}

fn find_target(kind: DocumentKind, content: &str, offset: usize) -> Option<HoverTarget> {
    match kind {
        DocumentKind::PackageJson => locate(content, offset).map(|location| HoverTarget {
            name: location.name,
            range_text: location.version,
            name_range: location.name_range,
        }),
        DocumentKind::PnpmWorkspace => locate_catalog_entry(content, offset).map(|entry| HoverTarget {
            name: entry.name,
            range_text: entry.version,
            name_range: entry.name_range,
        }),
    }
}
