//! package.json analysis for pkglens.
//!
//! - [`json_tree`]: lossless JSON parse tree with byte offsets
//! - [`manifest`]: manifest model and `files` pattern extraction
//! - [`files`]: published file-set resolution
//! - [`locator`]: dependency entry under the cursor, install directory lookup
//! - [`pnpm`]: pnpm-workspace.yaml catalog entries
//! - [`metadata`]: package metadata aggregation and hover rendering

pub mod builtins;
pub mod bundle;
pub mod error;
pub mod files;
pub mod json_tree;
pub mod locator;
pub mod manifest;
pub mod metadata;
pub mod package_name;
pub mod pnpm;
pub mod registry;
pub mod repository;

pub use bundle::{BundleSize, BundleSizeClient, Bundlephobia};
pub use error::{NpmError, Result};
pub use files::{FileSetResolver, ResolveOptions, ResolvedFileSet};
pub use json_tree::JsonTree;
pub use locator::{DependencyLocation, find_install_dir, locate};
pub use manifest::{DependencySection, FilePattern, FilesField, Manifest, extract_file_patterns};
pub use metadata::{AggregatorOptions, MetadataAggregator, PackageMetadata, render_markdown};
pub use pnpm::{CatalogEntry, locate_catalog_entry};
pub use registry::{NpmRegistry, RegistryClient, package_url};
