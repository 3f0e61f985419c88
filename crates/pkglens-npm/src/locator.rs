//! Dependency entry lookup and install directory discovery.

use crate::json_tree::{JsonTree, NodeId, NodeKind};
use crate::manifest::DependencySection;
use crate::package_name;
use pkglens_core::LineIndex;
use std::path::{Path, PathBuf};
use tower_lsp_server::ls_types::Range;

/// A dependency declaration found under the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyLocation {
    pub name: String,
    /// Version range text as written.
    pub version: String,
    pub section: DependencySection,
    /// Range of the name, quotes excluded.
    pub name_range: Range,
    /// Range of the version text, quotes excluded.
    pub version_range: Range,
}

/// Finds the dependency whose *name* is at `offset`.
///
/// Matches only a string key of a pair whose value is also a string, inside
/// one of the four dependency maps at the top level of the manifest. Names
/// rejected by the registry naming rules, unparseable text and cursors on
/// the version side all yield `None`.
///
/// # Examples
///
/// ```
/// use pkglens_npm::locator::locate;
///
/// let text = r#"{"dependencies": {"react": "^18.2.0"}}"#;
/// let offset = text.find("react").unwrap();
///
/// let location = locate(text, offset).unwrap();
/// assert_eq!(location.name, "react");
/// assert_eq!(location.version, "^18.2.0");
///
/// let on_version = text.find("^18").unwrap();
/// assert!(locate(text, on_version).is_none());
/// ```
pub fn locate(text: &str, offset: usize) -> Option<DependencyLocation> {
    let tree = JsonTree::parse(text).ok()?;
    locate_in_tree(&tree, text, offset)
}

/// Like [`locate`], over an already parsed tree.
pub fn locate_in_tree(tree: &JsonTree, text: &str, offset: usize) -> Option<DependencyLocation> {
    let key = tree.node_at_offset(offset)?;
    if tree.node(key).kind != NodeKind::String {
        return None;
    }

    let property = tree.parent(key)?;
    if tree.property_key(property) != Some(key) {
        return None;
    }
    let value = tree.property_value_node(property)?;
    let version = tree.string_value(value)?;

    let section = dependency_section_of(tree, property)?;
    let name = tree.string_value(key)?;
    if !package_name::is_valid(name) {
        tracing::debug!("ignoring invalid package name '{}'", name);
        return None;
    }

    let index = LineIndex::new(text);
    let (name_start, name_end) = tree.string_content_span(key)?;
    let (version_start, version_end) = tree.string_content_span(value)?;

    Some(DependencyLocation {
        name: name.to_string(),
        version: version.to_string(),
        section,
        name_range: index.range(text, name_start, name_end),
        version_range: index.range(text, version_start, version_end),
    })
}

/// The section a dependency pair belongs to, when its map is a top-level
/// dependency property.
fn dependency_section_of(tree: &JsonTree, pair: NodeId) -> Option<DependencySection> {
    let map = tree.parent(pair)?;
    if tree.node(map).kind != NodeKind::Object {
        return None;
    }
    let section_property = tree.parent(map)?;
    if tree.parent(section_property)? != tree.root() {
        return None;
    }
    let section_key = tree.property_key(section_property)?;
    DependencySection::from_key(tree.string_value(section_key)?)
}

/// Every dependency declared in the manifest, in source order.
pub fn all_dependencies(tree: &JsonTree, text: &str) -> Vec<DependencyLocation> {
    let mut found = Vec::new();
    for section in DependencySection::ALL {
        let Some(map) = tree.find_path(&[section.key()]) else {
            continue;
        };
        for &pair in &tree.node(map).children {
            let Some(key) = tree.property_key(pair) else {
                continue;
            };
            if let Some(location) = locate_in_tree(tree, text, tree.node(key).offset) {
                found.push(location);
            }
        }
    }
    found
}

/// Finds the directory `name` is installed in, searching
/// `node_modules/<name>` in each ancestor of `from`.
///
/// `from` may be a file or directory; symlinks in it are resolved first.
/// A candidate counts only if both the directory and its package.json
/// exist. The walk stops after checking `boundary` when given, otherwise at
/// the filesystem root. Directories named `node_modules` are not searched
/// themselves, matching Node's lookup order.
pub async fn find_install_dir(name: &str, from: &Path, boundary: Option<&Path>) -> Option<PathBuf> {
    if !package_name::is_valid(name) {
        return None;
    }

    let start = match tokio::fs::canonicalize(from).await {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!("cannot canonicalize {}: {}", from.display(), e);
            from.to_path_buf()
        }
    };
    let start = match tokio::fs::metadata(&start).await {
        Ok(meta) if meta.is_dir() => start,
        _ => start.parent()?.to_path_buf(),
    };

    let boundary = match boundary {
        Some(b) => Some(tokio::fs::canonicalize(b).await.unwrap_or_else(|_| b.to_path_buf())),
        None => None,
    };

    let mut current = Some(start.as_path());
    while let Some(dir) = current {
        if dir.file_name().is_none_or(|n| n != "node_modules") {
            let candidate = dir.join("node_modules").join(name);
            if is_dir(&candidate).await && is_file(&candidate.join("package.json")).await {
                return Some(candidate);
            }
        }

        if boundary.as_deref() == Some(dir) {
            break;
        }
        current = dir.parent();
    }

    None
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file())
}
