//! package.json model.
//!
//! Two views of the same text are used: [`Manifest`] is a serde value view
//! with the fields annotations care about, and [`extract_file_patterns`]
//! reads the `files` array from a [`JsonTree`] so each pattern keeps its
//! source span.
//!
//! Field deserializers are lenient: a field with an unexpected shape reads
//! as absent instead of failing the whole manifest.

use crate::error::{NpmError, Result};
use crate::json_tree::{JsonTree, NodeKind};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

/// Parsed package.json.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_license")]
    pub license: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub main: Option<String>,
    /// `None` when absent or when any entry is not a string.
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub files: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub peer_dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub optional_dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_url")]
    pub repository: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub homepage: Option<String>,
    #[serde(default, deserialize_with = "lenient_url")]
    pub bugs: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub module_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub module: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub types: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub typings: Option<String>,
    #[serde(default)]
    pub exports: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub deprecated: Option<String>,
}

impl FromStr for Manifest {
    type Err = NpmError;

    fn from_str(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        serde_json::from_str(text).map_err(|source| NpmError::JsonParseError { source })
    }
}

impl Manifest {
    /// Reads and parses the manifest at `path`.
    pub async fn read(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        text.parse()
    }

    /// Returns the dependency map for a section.
    pub fn section(&self, section: DependencySection) -> &BTreeMap<String, String> {
        match section {
            DependencySection::Dependencies => &self.dependencies,
            DependencySection::DevDependencies => &self.dev_dependencies,
            DependencySection::PeerDependencies => &self.peer_dependencies,
            DependencySection::OptionalDependencies => &self.optional_dependencies,
        }
    }

    /// Finds the declared range for `name`, checking sections in order.
    pub fn dependency_range(&self, name: &str) -> Option<&str> {
        DependencySection::ALL
            .iter()
            .find_map(|&section| self.section(section).get(name))
            .map(String::as_str)
    }

    /// The type declaration entry, from `types` or its older `typings` alias.
    pub fn types_entry(&self) -> Option<&str> {
        self.types.as_deref().or(self.typings.as_deref())
    }

    /// Whether the package ships ES modules.
    ///
    /// True for `"type": "module"`, a `module` entry, or an `import`
    /// condition anywhere in `exports`.
    pub fn is_esm(&self) -> bool {
        self.module_type.as_deref() == Some("module")
            || self.module.is_some()
            || self.exports.as_ref().is_some_and(|e| has_condition(e, "import"))
    }

    /// Whether the package ships its own type declarations.
    pub fn has_types(&self) -> bool {
        self.types_entry().is_some()
            || self.exports.as_ref().is_some_and(|e| has_condition(e, "types"))
    }
}

fn has_condition(exports: &Value, condition: &str) -> bool {
    match exports {
        Value::Object(map) => map
            .iter()
            .any(|(key, value)| key == condition || has_condition(value, condition)),
        Value::Array(items) => items.iter().any(|item| has_condition(item, condition)),
        _ => false,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Accepts `"MIT"` or the legacy `{ "type": "MIT" }` form.
fn lenient_license<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get("type").and_then(Value::as_str).map(str::to_string),
        _ => None,
    })
}

/// Accepts `"https://..."` or `{ "url": "https://..." }`.
fn lenient_url<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get("url").and_then(Value::as_str).map(str::to_string),
        _ => None,
    })
}

fn lenient_string_list<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(None);
    };
    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

fn lenient_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(map) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(name, range)| match range {
            Value::String(range) => Some((name, range)),
            _ => None,
        })
        .collect())
}

/// Section in package.json where a dependency is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencySection {
    /// Production dependencies (`dependencies`)
    Dependencies,
    /// Development dependencies (`devDependencies`)
    DevDependencies,
    /// Peer dependency requirements (`peerDependencies`)
    PeerDependencies,
    /// Optional dependencies (`optionalDependencies`)
    OptionalDependencies,
}

impl DependencySection {
    pub const ALL: [Self; 4] = [
        Self::Dependencies,
        Self::DevDependencies,
        Self::PeerDependencies,
        Self::OptionalDependencies,
    ];

    /// The property name used in package.json.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
            Self::PeerDependencies => "peerDependencies",
            Self::OptionalDependencies => "optionalDependencies",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.key() == key)
    }
}

/// One entry of the `files` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    /// Glob text with any leading `!` removed.
    pub pattern: String,
    pub negated: bool,
    /// Byte span of the string literal, quotes included.
    pub span: Range<usize>,
}

impl FilePattern {
    pub fn new(raw: &str, span: Range<usize>) -> Self {
        match raw.strip_prefix('!') {
            Some(rest) => Self {
                pattern: rest.to_string(),
                negated: true,
                span,
            },
            None => Self {
                pattern: raw.to_string(),
                negated: false,
                span,
            },
        }
    }
}

/// The `files` property with its key location and patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesField {
    /// Byte span of the `"files"` key literal.
    pub key_span: Range<usize>,
    pub patterns: Vec<FilePattern>,
}

/// Reads the top-level `files` array.
///
/// Returns `Ok(None)` when there is no `files` property. A `files` value that
/// is not an array, or any non-string entry, is an error: the whole field is
/// unusable rather than partially annotated.
pub fn extract_file_patterns(tree: &JsonTree) -> Result<Option<FilesField>> {
    let Some(property) = tree.find_property(tree.root(), "files") else {
        return Ok(None);
    };
    let (Some(key), Some(value)) = (tree.property_key(property), tree.property_value_node(property))
    else {
        return Ok(None);
    };

    let array = tree.node(value);
    if array.kind != NodeKind::Array {
        return Err(NpmError::InvalidFilesField);
    }

    let mut patterns = Vec::with_capacity(array.children.len());
    for (index, &entry) in array.children.iter().enumerate() {
        let Some(raw) = tree.string_value(entry) else {
            return Err(NpmError::InvalidFilesEntry { index });
        };
        let node = tree.node(entry);
        patterns.push(FilePattern::new(raw, node.offset..node.end()));
    }

    let key_node = tree.node(key);
    Ok(Some(FilesField {
        key_span: key_node.offset..key_node.end(),
        patterns,
    }))
}
