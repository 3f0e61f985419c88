//! Code lenses over the `files` field of package.json.
//!
//! `textDocument/codeLens` only places the lenses: one on the `"files"` key
//! for the whole package and one per pattern. Counting files touches the
//! disk, so titles are filled in by `codeLens/resolve`.

use crate::config::{LensConfig, format_title};
use crate::document::{DocumentKind, ServerState, ensure_document_loaded, file_path};
use crate::handlers::commands::SHOW_FILES_COMMAND;
use pkglens_core::LineIndex;
use pkglens_npm::{
    FileSetResolver, FilesField, JsonTree, Manifest, ResolveOptions, extract_file_patterns,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_lsp_server::ls_types::{CodeLens, CodeLensParams, Command, Uri};

/// Payload carried from `codeLens` to `codeLens/resolve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensData {
    pub uri: Uri,
    /// Pattern index, or `None` for the whole-package lens.
    pub index: Option<usize>,
    /// Raw pattern text, used to detect edits between the two requests.
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Places unresolved lenses for every entry of `files`.
pub async fn handle_code_lens(
    state: Arc<ServerState>,
    params: CodeLensParams,
    config: Arc<RwLock<LensConfig>>,
) -> Option<Vec<CodeLens>> {
    if !config.read().await.files.enabled {
        return None;
    }

    let uri = params.text_document.uri;
    if file_path(&uri).is_none() {
        tracing::debug!("no package directory for {:?}", uri);
        return None;
    }
    if !ensure_document_loaded(&uri, &state).await {
        tracing::warn!("Could not load document for code lens: {:?}", uri);
        return None;
    }

    let doc = state.get_document(&uri)?;
    if doc.kind != DocumentKind::PackageJson {
        return None;
    }

    let field = files_field(&doc.content)?;
    let index = LineIndex::new(&doc.content);

    let mut lenses = Vec::with_capacity(field.patterns.len() + 1);
    lenses.push(unresolved(
        index.range(&doc.content, field.key_span.start, field.key_span.end),
        LensData {
            uri: uri.clone(),
            index: None,
            pattern: None,
        },
    ));
    for (i, pattern) in field.patterns.iter().enumerate() {
        lenses.push(unresolved(
            index.range(&doc.content, pattern.span.start, pattern.span.end),
            LensData {
                uri: uri.clone(),
                index: Some(i),
                pattern: Some(raw_pattern(&pattern.pattern, pattern.negated)),
            },
        ));
    }

    tracing::debug!("{} code lenses for {:?}", lenses.len(), uri);
    Some(lenses)
}

/// Counts the files behind a lens and attaches the show-files command.
///
/// Returns the lens untouched when its data is missing or stale.
pub async fn handle_code_lens_resolve(
    state: Arc<ServerState>,
    lens: CodeLens,
    config: Arc<RwLock<LensConfig>>,
) -> CodeLens {
    match resolve_lens(&state, &lens, &config).await {
        Some(command) => CodeLens {
            command: Some(command),
            ..lens
        },
        None => lens,
    }
}

async fn resolve_lens(
    state: &ServerState,
    lens: &CodeLens,
    config: &RwLock<LensConfig>,
) -> Option<Command> {
    let data: LensData = lens
        .data
        .clone()
        .and_then(|value| serde_json::from_value(value).ok())?;

    if !ensure_document_loaded(&data.uri, state).await {
        return None;
    }
    let doc = state.get_document(&data.uri)?;
    let field = files_field(&doc.content)?;

    let path = file_path(&data.uri)?;
    let base_dir = path.parent()?;
    let resolver = FileSetResolver::new(base_dir);
    let files_config = config.read().await.files.clone();

    let (files, template) = match data.index {
        None => {
            let main = doc.content.parse::<Manifest>().ok().and_then(|m| m.main);
            let options = ResolveOptions {
                include_default_packed_files: files_config.include_default_packed_files,
                main,
            };
            let files = resolver.resolve(&field.patterns, &options).await;
            (files, files_config.all_files_title)
        }
        Some(i) => {
            let pattern = field.patterns.get(i)?;
            if data.pattern.as_deref() != Some(raw_pattern(&pattern.pattern, pattern.negated).as_str()) {
                tracing::debug!("stale code lens for pattern {} in {:?}", i, data.uri);
                return None;
            }
            if pattern.negated {
                let files = resolver.resolve_excluded_by(&field.patterns, i).await;
                (files, files_config.excluded_title)
            } else {
                let files = resolver.resolve_pattern(&field.patterns, i).await;
                (files, files_config.pattern_title)
            }
        }
    };

    let relative = files.relative_to(base_dir);
    Some(Command {
        title: format_title(&template, relative.len()),
        command: SHOW_FILES_COMMAND.to_string(),
        arguments: Some(vec![
            serde_json::to_value(&data.uri).ok()?,
            serde_json::to_value(lens.range.start).ok()?,
            serde_json::to_value(relative).ok()?,
        ]),
    })
}

fn files_field(content: &str) -> Option<FilesField> {
    let tree = JsonTree::parse(content)
        .inspect_err(|e| tracing::debug!("package.json does not parse: {}", e))
        .ok()?;
    extract_file_patterns(&tree)
        .inspect_err(|e| tracing::debug!("unusable files field: {}", e))
        .ok()
        .flatten()
}

fn raw_pattern(pattern: &str, negated: bool) -> String {
    if negated {
        format!("!{pattern}")
    } else {
        pattern.to_string()
    }
}

fn unresolved(range: tower_lsp_server::ls_types::Range, data: LensData) -> CodeLens {
    CodeLens {
        range,
        command: None,
        data: serde_json::to_value(data).ok(),
    }
}
