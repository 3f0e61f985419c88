//! Package metadata aggregation for hovers.
//!
//! Combines the installed manifest, the registry's `latest` document,
//! bundlephobia figures and shields.io badges into one [`PackageMetadata`].
//! Every source is optional: a failed or disabled source leaves its fields
//! empty and never fails the whole description.

use crate::builtins;
use crate::bundle::{BundleSize, BundleSizeClient, format_bytes};
use crate::manifest::Manifest;
use crate::registry::{RegistryClient, package_url};
use crate::repository::{distinct_homepage, github_slug, repository_url};
use std::sync::Arc;

const SHIELDS_BASE: &str = "https://img.shields.io";

/// Best-effort description of a dependency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageMetadata {
    pub name: String,
    /// Version range declared by the manifest being edited.
    pub declared_range: Option<String>,
    pub installed_version: Option<String>,
    /// Whether the installed version satisfies the declared range.
    pub satisfies_range: Option<bool>,
    pub latest_version: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    pub deprecated: Option<String>,
    pub npm_url: Option<String>,
    pub repository: Option<String>,
    pub homepage: Option<String>,
    pub stars_badge: Option<String>,
    pub types_badge: Option<String>,
    pub esm: Option<bool>,
    pub has_types: Option<bool>,
    pub bundle_size: Option<BundleSize>,
    /// Documentation link when the name is a Node.js built-in.
    pub builtin_docs: Option<String>,
}

/// Which optional sources [`MetadataAggregator`] consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorOptions {
    pub show_bundle_size: bool,
    pub show_types_badge: bool,
    pub show_stars_badge: bool,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            show_bundle_size: false,
            show_types_badge: false,
            show_stars_badge: true,
        }
    }
}

/// Composes [`PackageMetadata`] from the registry, bundlephobia and the
/// installed manifest.
#[derive(Clone)]
pub struct MetadataAggregator {
    registry: Arc<dyn RegistryClient>,
    bundles: Arc<dyn BundleSizeClient>,
    options: AggregatorOptions,
}

impl MetadataAggregator {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        bundles: Arc<dyn BundleSizeClient>,
        options: AggregatorOptions,
    ) -> Self {
        Self {
            registry,
            bundles,
            options,
        }
    }

    pub fn options(&self) -> AggregatorOptions {
        self.options
    }

    /// Describes `name`. Never fails; unavailable data is left empty.
    ///
    /// Built-in modules short-circuit to a documentation link without any
    /// network traffic, unless an installed copy exists: userland packages
    /// such as `events` or `buffer` share their name with a builtin.
    pub async fn describe(
        &self,
        name: &str,
        installed: Option<&Manifest>,
        declared_range: Option<&str>,
    ) -> PackageMetadata {
        let mut metadata = PackageMetadata {
            name: name.to_string(),
            declared_range: declared_range.map(str::to_string),
            ..Default::default()
        };

        if installed.is_none()
            && let Some(docs) = builtins::docs_url(name)
        {
            metadata.builtin_docs = Some(docs);
            return metadata;
        }

        metadata.npm_url = Some(package_url(name));
        metadata.installed_version = installed.and_then(|m| m.version.clone());

        let bundle_version = metadata
            .installed_version
            .clone()
            .unwrap_or_else(|| "latest".to_string());
        let bundle_lookup = async {
            if self.options.show_bundle_size {
                Some(self.bundles.get_size(name, &bundle_version).await)
            } else {
                None
            }
        };

        let (latest, bundle) = tokio::join!(self.registry.get_version(name, "latest"), bundle_lookup);

        let latest = latest
            .inspect_err(|e| tracing::debug!("registry lookup for {} failed: {}", name, e))
            .ok();
        metadata.bundle_size = bundle.and_then(|result| {
            result
                .inspect_err(|e| tracing::debug!("bundle size for {} failed: {}", name, e))
                .ok()
        });

        if let Some(latest) = &latest {
            metadata.latest_version.clone_from(&latest.version);
            metadata.deprecated.clone_from(&latest.deprecated);
        }

        if let (Some(installed), Some(range)) = (&metadata.installed_version, declared_range) {
            metadata.satisfies_range = satisfies(installed, range);
        }

        if let Some(source) = installed.or(latest.as_ref()) {
            metadata.description.clone_from(&source.description);
            metadata.license.clone_from(&source.license);
            metadata.repository = repository_url(source);
            metadata.homepage = source
                .homepage
                .as_deref()
                .and_then(|h| distinct_homepage(h, metadata.repository.as_deref()));
            metadata.esm = Some(source.is_esm());
            metadata.has_types = Some(source.has_types());
        }

        if self.options.show_stars_badge
            && let Some((owner, repo)) = metadata.repository.as_deref().and_then(github_slug)
        {
            metadata.stars_badge = Some(format!(
                "{SHIELDS_BASE}/github/stars/{owner}/{repo}?style=social"
            ));
        }
        if self.options.show_types_badge {
            metadata.types_badge = Some(format!("{SHIELDS_BASE}/npm/types/{name}"));
        }

        metadata
    }
}

/// `None` when either side does not parse as npm semver, e.g. for
/// `workspace:*` or git ranges.
fn satisfies(version: &str, range: &str) -> Option<bool> {
    let range = node_semver::Range::parse(range).ok()?;
    let version = node_semver::Version::parse(version).ok()?;
    Some(range.satisfies(&version))
}

/// Renders the hover text for a dependency.
pub fn render_markdown(metadata: &PackageMetadata) -> String {
    if let Some(docs) = &metadata.builtin_docs {
        return format!(
            "# {}\n\nNode.js built-in module\n\n[Documentation]({})\n",
            metadata.name, docs
        );
    }

    let mut markdown = match &metadata.npm_url {
        Some(url) => format!("# [{}]({})\n\n", metadata.name, url),
        None => format!("# {}\n\n", metadata.name),
    };

    if let Some(description) = &metadata.description {
        markdown.push_str(&format!("{}\n\n", description));
    }

    if let Some(message) = &metadata.deprecated {
        markdown.push_str(&format!("⚠️ **Deprecated**: {}\n\n", message));
    }

    if let Some(installed) = &metadata.installed_version {
        let suffix = match metadata.satisfies_range {
            Some(false) => " *(does not satisfy range)*",
            _ => "",
        };
        markdown.push_str(&format!("**Installed**: `{}`{}\n\n", installed, suffix));
    }
    if let Some(range) = &metadata.declared_range {
        markdown.push_str(&format!("**Requirement**: `{}`\n\n", range));
    }
    if let Some(latest) = &metadata.latest_version {
        markdown.push_str(&format!("**Latest**: `{}`\n\n", latest));
    }
    if let Some(license) = &metadata.license {
        markdown.push_str(&format!("**License**: {}\n\n", license));
    }

    let badges: Vec<_> = [
        metadata.stars_badge.as_ref().map(|url| format!("![GitHub stars]({url})")),
        metadata.types_badge.as_ref().map(|url| format!("![types]({url})")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !badges.is_empty() {
        markdown.push_str(&format!("{}\n\n", badges.join(" ")));
    }

    let mut flags = Vec::new();
    if metadata.esm == Some(true) {
        flags.push("ESM");
    }
    if metadata.has_types == Some(true) {
        flags.push("TypeScript types");
    }
    if !flags.is_empty() {
        markdown.push_str(&format!("{}\n\n", flags.join(" · ")));
    }

    if let Some(size) = &metadata.bundle_size {
        markdown.push_str(&format!(
            "**Bundle size**: {} minified, {} gzipped\n\n",
            format_bytes(size.size),
            format_bytes(size.gzip)
        ));
    }

    let links: Vec<_> = [
        metadata.npm_url.as_ref().map(|url| format!("[npm]({url})")),
        metadata.repository.as_ref().map(|url| format!("[repository]({url})")),
        metadata.homepage.as_ref().map(|url| format!("[homepage]({url})")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !links.is_empty() {
        markdown.push_str(&links.join(" | "));
        markdown.push('\n');
    }

    markdown
}
