//! Published file-set resolution.
//!
//! Computes which files `npm pack` would put in the tarball for a given
//! `files` list: positive patterns are expanded against the package
//! directory, every negated pattern in the list (regardless of position)
//! and a built-in ignore list narrow the result, and the implicitly packed
//! files can be folded in afterwards.
//!
//! Matching is done on package-relative paths with `/` separators. A pattern
//! that names a directory also covers everything beneath it, so `lib` and
//! `lib/**` select the same files. `{a,b}` alternations are expanded
//! before matching.

use crate::manifest::FilePattern;
use futures::future::join_all;
use glob::{MatchOptions, Pattern};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Names that are never packed, matched against every path component.
const BUILTIN_IGNORES: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    "CVS",
    ".DS_Store",
    "._*",
    "Thumbs.db",
    "*.orig",
    "*.swp",
    ".*.swp",
    ".lock-wscript",
    ".wafpickle-*",
    "config.gypi",
    "npm-debug.log",
    ".npmrc",
    "package-lock.json",
    "npm-shrinkwrap.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
];

static IGNORE_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    BUILTIN_IGNORES
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect()
});

/// README candidates in priority order.
const README_CANDIDATES: &[&str] = &["README.md", "README", "readme.md", "readme"];

/// LICENSE candidates in priority order.
const LICENSE_CANDIDATES: &[&str] = &[
    "LICENSE",
    "LICENSE.md",
    "LICENSE.txt",
    "LICENCE",
    "LICENCE.md",
    "LICENCE.txt",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Options for [`FileSetResolver::resolve`].
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Fold in package.json, README, LICENSE and the `main` entry.
    pub include_default_packed_files: bool,
    /// The manifest's `main` field.
    pub main: Option<String>,
}

/// Deduplicated, ordered set of absolute file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFileSet {
    files: BTreeSet<PathBuf>,
}

impl ResolvedFileSet {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.files.insert(path)
    }

    pub fn into_paths(self) -> Vec<PathBuf> {
        self.files.into_iter().collect()
    }

    /// Paths relative to `base`, with `/` separators.
    pub fn relative_to(&self, base: &Path) -> Vec<String> {
        self.files
            .iter()
            .filter_map(|path| path.strip_prefix(base).ok())
            .map(to_slash)
            .collect()
    }
}

impl Extend<PathBuf> for ResolvedFileSet {
    fn extend<I: IntoIterator<Item = PathBuf>>(&mut self, iter: I) {
        self.files.extend(iter);
    }
}

impl FromIterator<PathBuf> for ResolvedFileSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// A `files` entry compiled into glob matchers.
#[derive(Debug, Clone)]
struct CompiledPattern {
    globs: Vec<Pattern>,
    /// Leading components without glob metacharacters; the walk starts here.
    literal_prefix: PathBuf,
}

impl CompiledPattern {
    /// Compiles every brace alternative of `raw`.
    fn compile_all(raw: &str) -> Vec<Self> {
        expand_braces(raw)
            .iter()
            .filter_map(|alternative| Self::compile(alternative))
            .collect()
    }

    fn compile(raw: &str) -> Option<Self> {
        let normalized = normalize_pattern(raw)?;

        let mut sources = vec![normalized.clone()];
        if !normalized.ends_with("**") {
            sources.push(format!("{normalized}/**"));
        }

        let globs = match sources
            .iter()
            .map(|s| Pattern::new(s))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(globs) => globs,
            Err(e) => {
                tracing::debug!("ignoring invalid files pattern '{}': {}", raw, e);
                return None;
            }
        };

        let literal_prefix = normalized
            .split('/')
            .take_while(|part| !part.contains(['*', '?', '[', '{']))
            .collect::<PathBuf>();

        Some(Self {
            globs,
            literal_prefix,
        })
    }

    fn matches(&self, relative: &str) -> bool {
        self.globs
            .iter()
            .any(|glob| glob.matches_with(relative, MATCH_OPTIONS))
    }
}

/// Upper bound on alternatives produced from one pattern.
const MAX_BRACE_EXPANSIONS: usize = 256;

/// Expands `{a,b}` alternations, nested ones included.
///
/// Braces without a top-level comma or without a closing brace stay
/// literal. Expansion stops growing at [`MAX_BRACE_EXPANSIONS`].
fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close, alternatives)) = first_alternation(pattern) else {
        return vec![pattern.to_string()];
    };

    let (head, tail) = (&pattern[..open], &pattern[close + 1..]);
    let mut expanded = Vec::new();
    for alternative in alternatives {
        for rest in expand_braces(&format!("{head}{alternative}{tail}")) {
            if expanded.len() == MAX_BRACE_EXPANSIONS {
                tracing::debug!("brace expansion of '{}' truncated", pattern);
                return expanded;
            }
            expanded.push(rest);
        }
    }
    expanded
}

/// Byte positions of the first `{...}` group holding a top-level comma,
/// plus its comma-separated parts.
fn first_alternation(pattern: &str) -> Option<(usize, usize, Vec<&str>)> {
    let bytes = pattern.as_bytes();
    let mut search_from = 0;

    while let Some(found) = pattern[search_from..].find('{') {
        let open = search_from + found;
        let mut depth = 0;
        let mut splits = Vec::new();
        let mut close = None;

        for (i, &b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                b',' if depth == 1 => splits.push(i),
                _ => {}
            }
        }

        match close {
            Some(close) if !splits.is_empty() => {
                let mut parts = Vec::with_capacity(splits.len() + 1);
                let mut start = open + 1;
                for split in splits {
                    parts.push(&pattern[start..split]);
                    start = split + 1;
                }
                parts.push(&pattern[start..close]);
                return Some((open, close, parts));
            }
            _ => search_from = open + 1,
        }
    }
    None
}

/// Strips `./` and `/` prefixes and trailing slashes.
///
/// Returns `None` for patterns that are empty or climb out of the package.
fn normalize_pattern(raw: &str) -> Option<String> {
    let mut pattern = raw.trim();
    loop {
        if let Some(rest) = pattern.strip_prefix("./") {
            pattern = rest;
        } else if let Some(rest) = pattern.strip_prefix('/') {
            pattern = rest;
        } else {
            break;
        }
    }
    let pattern = pattern.trim_end_matches('/');

    if pattern.is_empty() || pattern == "." || pattern.split('/').any(|part| part == "..") {
        tracing::debug!("ignoring files pattern '{}'", raw);
        return None;
    }
    Some(pattern.to_string())
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_builtin_ignored(name: &str) -> bool {
    IGNORE_PATTERNS
        .iter()
        .any(|p| p.matches_with(name, MATCH_OPTIONS))
}

/// True when any component between `base` and `base/prefix` is a symlink.
fn prefix_crosses_symlink(base: &Path, prefix: &Path) -> bool {
    let mut current = base.to_path_buf();
    for component in prefix.components() {
        current.push(component);
        if std::fs::symlink_metadata(&current).is_ok_and(|m| m.file_type().is_symlink()) {
            return true;
        }
    }
    false
}

/// Walks `base` for regular files matched by `include` and by none of
/// `excludes` or the built-in ignore list. Symlinks are never followed.
fn expand(
    base: &Path,
    include: &CompiledPattern,
    excludes: &[CompiledPattern],
) -> BTreeSet<PathBuf> {
    let mut matched = BTreeSet::new();

    if prefix_crosses_symlink(base, &include.literal_prefix) {
        return matched;
    }
    let root = base.join(&include.literal_prefix);
    if !root.exists() {
        return matched;
    }

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| entry.file_type().is_dir() && is_builtin_ignored(name))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(base) else {
            continue;
        };
        let relative_str = to_slash(relative);

        if relative_str.split('/').any(is_builtin_ignored) {
            continue;
        }
        if !include.matches(&relative_str) {
            continue;
        }
        if excludes.iter().any(|exclude| exclude.matches(&relative_str)) {
            continue;
        }

        matched.insert(entry.path().to_path_buf());
    }

    matched
}

/// Resolves `files` patterns for one package directory.
///
/// # Examples
///
/// ```no_run
/// # use pkglens_npm::files::{FileSetResolver, ResolveOptions};
/// # use pkglens_npm::manifest::FilePattern;
/// # #[tokio::main]
/// # async fn main() {
/// let resolver = FileSetResolver::new("/work/my-package");
/// let patterns = vec![
///     FilePattern::new("lib/**", 0..8),
///     FilePattern::new("!lib/*.test.js", 9..25),
/// ];
///
/// let files = resolver.resolve(&patterns, &ResolveOptions::default()).await;
/// println!("{} files in package", files.len());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileSetResolver {
    base_dir: PathBuf,
}

impl FileSetResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolves the whole pattern list.
    ///
    /// Each positive pattern is expanded on the blocking pool; the results
    /// are merged into one set, so completion order is irrelevant.
    pub async fn resolve(&self, patterns: &[FilePattern], options: &ResolveOptions) -> ResolvedFileSet {
        let excludes = compile_negations(patterns, None);
        let includes: Vec<_> = patterns
            .iter()
            .filter(|p| !p.negated)
            .flat_map(|p| CompiledPattern::compile_all(&p.pattern))
            .collect();

        let mut result = self.expand_all(includes, excludes).await;

        if options.include_default_packed_files {
            let defaults = self.default_packed_files(options.main.as_deref()).await;
            result.extend(defaults);
        }

        tracing::debug!(
            "resolved {} files from {} patterns in {}",
            result.len(),
            patterns.len(),
            self.base_dir.display()
        );
        result
    }

    /// Files contributed by the positive pattern at `index`, under every
    /// negation in the list.
    ///
    /// Returns an empty set when `index` is out of range or negated.
    pub async fn resolve_pattern(&self, patterns: &[FilePattern], index: usize) -> ResolvedFileSet {
        let Some(pattern) = patterns.get(index).filter(|p| !p.negated) else {
            return ResolvedFileSet::default();
        };
        let includes = CompiledPattern::compile_all(&pattern.pattern);
        if includes.is_empty() {
            return ResolvedFileSet::default();
        }

        let excludes = compile_negations(patterns, None);
        self.expand_all(includes, excludes).await
    }

    /// Files the positive patterns would include that the negated pattern at
    /// `index` removes.
    ///
    /// Returns an empty set when `index` is out of range or not negated.
    pub async fn resolve_excluded_by(
        &self,
        patterns: &[FilePattern],
        index: usize,
    ) -> ResolvedFileSet {
        let Some(negation) = patterns.get(index).filter(|p| p.negated) else {
            return ResolvedFileSet::default();
        };
        let targets = CompiledPattern::compile_all(&negation.pattern);
        if targets.is_empty() {
            return ResolvedFileSet::default();
        }

        let others = compile_negations(patterns, Some(index));
        let includes: Vec<_> = patterns
            .iter()
            .filter(|p| !p.negated)
            .flat_map(|p| CompiledPattern::compile_all(&p.pattern))
            .collect();

        let candidates = self.expand_all(includes, others).await;
        candidates
            .into_paths()
            .into_iter()
            .filter(|path| {
                path.strip_prefix(&self.base_dir)
                    .is_ok_and(|relative| {
                        let relative = to_slash(relative);
                        targets.iter().any(|target| target.matches(&relative))
                    })
            })
            .collect()
    }

    async fn expand_all(
        &self,
        includes: Vec<CompiledPattern>,
        excludes: Arc<[CompiledPattern]>,
    ) -> ResolvedFileSet {
        let tasks = includes.into_iter().map(|include| {
            let base = self.base_dir.clone();
            let excludes = Arc::clone(&excludes);
            tokio::task::spawn_blocking(move || expand(&base, &include, &excludes))
        });

        let mut result = ResolvedFileSet::default();
        for outcome in join_all(tasks).await {
            match outcome {
                Ok(files) => result.extend(files),
                Err(e) => tracing::warn!("pattern expansion task failed: {}", e),
            }
        }
        result
    }

    /// package.json, the first README and LICENSE hit, and the `main` entry,
    /// each only if it exists.
    async fn default_packed_files(&self, main: Option<&str>) -> Vec<PathBuf> {
        let mut defaults = Vec::new();

        let manifest = self.base_dir.join("package.json");
        if is_file(&manifest).await {
            defaults.push(manifest);
        }

        let names = self.root_file_names().await;
        for candidates in [README_CANDIDATES, LICENSE_CANDIDATES] {
            if let Some(name) = first_present_candidate(candidates, &names) {
                defaults.push(self.base_dir.join(name));
            }
        }

        if let Some(main) = main
            && let Some(path) = self.resolve_main(main).await
        {
            defaults.push(path);
        }

        defaults
    }

    async fn root_file_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(&self.base_dir).await else {
            return names;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_regular = entry.file_type().await.is_ok_and(|t| t.is_file());
            if is_regular && let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        names
    }

    /// Resolves `main` the way Node does for a relative entry: as written,
    /// with a `.js` extension, or as a directory's `index.js`.
    async fn resolve_main(&self, main: &str) -> Option<PathBuf> {
        let normalized = normalize_pattern(main)?;
        let direct = self.base_dir.join(&normalized);

        for candidate in [
            direct.clone(),
            self.base_dir.join(format!("{normalized}.js")),
            direct.join("index.js"),
        ] {
            if is_file(&candidate).await {
                return Some(candidate);
            }
        }
        None
    }
}

fn compile_negations(patterns: &[FilePattern], skip: Option<usize>) -> Arc<[CompiledPattern]> {
    patterns
        .iter()
        .enumerate()
        .filter(|(i, p)| p.negated && Some(*i) != skip)
        .flat_map(|(_, p)| CompiledPattern::compile_all(&p.pattern))
        .collect()
}

/// First exact match in table order, then the first case-insensitive match.
/// Returns the on-disk spelling.
fn first_present_candidate<'a>(candidates: &[&str], names: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|candidate| names.iter().find(|name| name == candidate))
        .or_else(|| {
            candidates.iter().find_map(|candidate| {
                names.iter().find(|name| name.eq_ignore_ascii_case(candidate))
            })
        })
        .map(String::as_str)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path)
        .await
        .is_ok_and(|m| m.file_type().is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(files: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "x").unwrap();
        }
        dir
    }

    fn patterns(raw: &[&str]) -> Vec<FilePattern> {
        raw.iter()
            .enumerate()
            .map(|(i, p)| FilePattern::new(p, i..i + 1))
            .collect()
    }

    fn relative(dir: &TempDir, set: &ResolvedFileSet) -> Vec<String> {
        set.relative_to(dir.path())
    }

    #[tokio::test]
    async fn test_negation_excludes_matches() {
        let dir = fixture(&["lib/index.js", "lib/index.test.js", "lib/util/a.js"]);
        let resolver = FileSetResolver::new(dir.path());

        let set = resolver
            .resolve(&patterns(&["lib/**", "!lib/*.test.js"]), &ResolveOptions::default())
            .await;

        assert!(set.contains(&dir.path().join("lib/index.js")));
        assert!(!set.contains(&dir.path().join("lib/index.test.js")));
        assert!(set.contains(&dir.path().join("lib/util/a.js")));
    }

    #[tokio::test]
    async fn test_negation_position_is_irrelevant() {
        let dir = fixture(&["lib/a.js", "lib/a.test.js", "src/b.js", "src/b.test.js"]);
        let resolver = FileSetResolver::new(dir.path());
        let options = ResolveOptions::default();

        let before = resolver
            .resolve(&patterns(&["!**/*.test.js", "lib", "src"]), &options)
            .await;
        let after = resolver
            .resolve(&patterns(&["lib", "src", "!**/*.test.js"]), &options)
            .await;
        let middle = resolver
            .resolve(&patterns(&["src", "!**/*.test.js", "lib"]), &options)
            .await;

        assert_eq!(relative(&dir, &before), vec!["lib/a.js", "src/b.js"]);
        assert_eq!(before, after);
        assert_eq!(before, middle);
    }

    #[tokio::test]
    async fn test_negation_never_widens() {
        let dir = fixture(&["lib/a.js", "other/b.js"]);
        let resolver = FileSetResolver::new(dir.path());

        let set = resolver
            .resolve(&patterns(&["lib", "!nothing-here"]), &ResolveOptions::default())
            .await;
        assert_eq!(relative(&dir, &set), vec!["lib/a.js"]);

        let only_negations = resolver
            .resolve(&patterns(&["!lib"]), &ResolveOptions::default())
            .await;
        assert!(only_negations.is_empty());
    }

    #[tokio::test]
    async fn test_directory_pattern_matches_contents() {
        let dir = fixture(&["dist/index.js", "dist/nested/deep.js", "distribution.txt"]);
        let resolver = FileSetResolver::new(dir.path());

        for raw in ["dist", "dist/", "./dist", "/dist"] {
            let set = resolver
                .resolve(&patterns(&[raw]), &ResolveOptions::default())
                .await;
            assert_eq!(
                relative(&dir, &set),
                vec!["dist/index.js", "dist/nested/deep.js"],
                "pattern {raw}"
            );
        }
    }

    #[tokio::test]
    async fn test_negated_directory_excludes_contents() {
        let dir = fixture(&["lib/a.js", "lib/internal/b.js"]);
        let resolver = FileSetResolver::new(dir.path());

        let set = resolver
            .resolve(&patterns(&["lib", "!lib/internal"]), &ResolveOptions::default())
            .await;
        assert_eq!(relative(&dir, &set), vec!["lib/a.js"]);
    }

    #[tokio::test]
    async fn test_wildcards_match_dot_files_but_not_separators() {
        let dir = fixture(&["lib/.keep", "lib/a.js", "lib/sub/b.js"]);
        let resolver = FileSetResolver::new(dir.path());

        let set = resolver
            .resolve(&patterns(&["lib/*.js", "lib/.*"]), &ResolveOptions::default())
            .await;
        assert_eq!(relative(&dir, &set), vec!["lib/.keep", "lib/a.js"]);
    }

    #[tokio::test]
    async fn test_builtin_ignores() {
        let dir = fixture(&[
            "index.js",
            "node_modules/dep/index.js",
            ".git/config",
            "package-lock.json",
            "lib/.DS_Store",
            "lib/a.js",
        ]);
        let resolver = FileSetResolver::new(dir.path());

        let set = resolver
            .resolve(&patterns(&["**"]), &ResolveOptions::default())
            .await;
        assert_eq!(relative(&dir, &set), vec!["index.js", "lib/a.js"]);
    }

    #[tokio::test]
    async fn test_unmatched_and_invalid_patterns_are_empty() {
        let dir = fixture(&["lib/a.js"]);
        let resolver = FileSetResolver::new(dir.path());
        let options = ResolveOptions::default();

        assert!(resolver.resolve(&patterns(&["missing"]), &options).await.is_empty());
        assert!(resolver.resolve(&patterns(&["lib/[a"]), &options).await.is_empty());
        assert!(resolver.resolve(&patterns(&["../outside"]), &options).await.is_empty());
        assert!(resolver.resolve(&[], &options).await.is_empty());

        let set = resolver.resolve(&patterns(&["lib/[a", "lib"]), &options).await;
        assert_eq!(relative(&dir, &set), vec!["lib/a.js"]);
    }

    #[tokio::test]
    async fn test_default_files_use_disk_spelling_once() {
        let dir = fixture(&["Readme.md", "License", "package.json", "lib/a.js"]);
        let resolver = FileSetResolver::new(dir.path());
        let options = ResolveOptions {
            include_default_packed_files: true,
            main: None,
        };

        let set = resolver.resolve(&patterns(&["lib", "Readme.md"]), &options).await;
        assert_eq!(
            relative(&dir, &set),
            vec!["License", "Readme.md", "lib/a.js", "package.json"]
        );
    }

    #[tokio::test]
    async fn test_default_readme_priority() {
        let dir = fixture(&["README", "README.md"]);
        let resolver = FileSetResolver::new(dir.path());
        let options = ResolveOptions {
            include_default_packed_files: true,
            main: None,
        };

        let set = resolver.resolve(&[], &options).await;
        assert_eq!(relative(&dir, &set), vec!["README.md"]);
    }

    #[tokio::test]
    async fn test_default_files_disabled() {
        let dir = fixture(&["README.md", "package.json", "lib/a.js"]);
        let resolver = FileSetResolver::new(dir.path());

        let set = resolver
            .resolve(&patterns(&["lib"]), &ResolveOptions::default())
            .await;
        assert_eq!(relative(&dir, &set), vec!["lib/a.js"]);
    }

    #[tokio::test]
    async fn test_main_entry_resolution() {
        let dir = fixture(&["server.js", "cli/index.js"]);
        let resolver = FileSetResolver::new(dir.path());

        for (main, expected) in [
            ("./server.js", "server.js"),
            ("server", "server.js"),
            ("cli", "cli/index.js"),
        ] {
            let options = ResolveOptions {
                include_default_packed_files: true,
                main: Some(main.to_string()),
            };
            let set = resolver.resolve(&[], &options).await;
            assert_eq!(relative(&dir, &set), vec![expected], "main {main}");
        }

        let options = ResolveOptions {
            include_default_packed_files: true,
            main: Some("missing.js".to_string()),
        };
        assert!(resolver.resolve(&[], &options).await.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_not_followed() {
        let outside = fixture(&["secret.js"]);
        let dir = fixture(&["lib/a.js"]);
        std::os::unix::fs::symlink(outside.path(), dir.path().join("lib/linked")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.js"),
            dir.path().join("lib/file-link.js"),
        )
        .unwrap();
        let resolver = FileSetResolver::new(dir.path());

        let set = resolver
            .resolve(&patterns(&["lib"]), &ResolveOptions::default())
            .await;
        assert_eq!(relative(&dir, &set), vec!["lib/a.js"]);

        let set = resolver
            .resolve(&patterns(&["lib/linked"]), &ResolveOptions::default())
            .await;
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_pattern_applies_global_negations() {
        let dir = fixture(&["lib/a.js", "lib/a.test.js", "bin/cli.js"]);
        let resolver = FileSetResolver::new(dir.path());
        let list = patterns(&["lib", "bin", "!**/*.test.js"]);

        let lib = resolver.resolve_pattern(&list, 0).await;
        assert_eq!(relative(&dir, &lib), vec!["lib/a.js"]);

        let bin = resolver.resolve_pattern(&list, 1).await;
        assert_eq!(relative(&dir, &bin), vec!["bin/cli.js"]);

        assert!(resolver.resolve_pattern(&list, 2).await.is_empty());
        assert!(resolver.resolve_pattern(&list, 9).await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_excluded_by() {
        let dir = fixture(&["lib/a.js", "lib/a.test.js", "lib/b.spec.js", "docs/x.test.js"]);
        let resolver = FileSetResolver::new(dir.path());
        let list = patterns(&["lib", "!lib/*.test.js", "!lib/*.spec.js"]);

        let excluded = resolver.resolve_excluded_by(&list, 1).await;
        assert_eq!(relative(&dir, &excluded), vec!["lib/a.test.js"]);

        let excluded = resolver.resolve_excluded_by(&list, 2).await;
        assert_eq!(relative(&dir, &excluded), vec!["lib/b.spec.js"]);

        assert!(resolver.resolve_excluded_by(&list, 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_brace_patterns_include() {
        let dir = fixture(&["dist/a.js", "dist/a.cjs", "dist/a.map", "lib/b.js", "src/c.js"]);
        let resolver = FileSetResolver::new(dir.path());

        let files = resolver
            .resolve(&patterns(&["dist/*.{js,cjs}"]), &ResolveOptions::default())
            .await;
        assert_eq!(relative(&dir, &files), vec!["dist/a.cjs", "dist/a.js"]);

        let files = resolver
            .resolve(&patterns(&["{dist,lib}"]), &ResolveOptions::default())
            .await;
        assert_eq!(
            relative(&dir, &files),
            vec!["dist/a.cjs", "dist/a.js", "dist/a.map", "lib/b.js"]
        );

        let files = resolver.resolve_pattern(&patterns(&["{lib,src}/*.js"]), 0).await;
        assert_eq!(relative(&dir, &files), vec!["lib/b.js", "src/c.js"]);
    }

    #[tokio::test]
    async fn test_brace_patterns_exclude() {
        let dir = fixture(&["dist/a.js", "dist/a.cjs", "dist/a.map"]);
        let resolver = FileSetResolver::new(dir.path());
        let list = patterns(&["dist", "!dist/*.{map,cjs}"]);

        let files = resolver.resolve(&list, &ResolveOptions::default()).await;
        assert_eq!(relative(&dir, &files), vec!["dist/a.js"]);

        let excluded = resolver.resolve_excluded_by(&list, 1).await;
        assert_eq!(relative(&dir, &excluded), vec!["dist/a.cjs", "dist/a.map"]);
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(expand_braces("lib/*.js"), vec!["lib/*.js"]);
        assert_eq!(expand_braces("*.{js,cjs}"), vec!["*.js", "*.cjs"]);
        assert_eq!(
            expand_braces("{a,b}/{c,d}"),
            vec!["a/c", "a/d", "b/c", "b/d"]
        );
        assert_eq!(expand_braces("x.{js,{m,c}ts}"), vec!["x.js", "x.mts", "x.cts"]);
        assert_eq!(expand_braces("{x{a,b}"), vec!["{xa", "{xb"]);
        // no comma or no closing brace: literal
        assert_eq!(expand_braces("{lib}"), vec!["{lib}"]);
        assert_eq!(expand_braces("lib/{a,b"), vec!["lib/{a,b"]);
        assert_eq!(expand_braces("{a,b,}"), vec!["a", "b", ""]);
    }

    #[test]
    fn test_brace_alternatives_climbing_out_are_dropped() {
        let compiled = CompiledPattern::compile_all("{../secret,lib}");
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].literal_prefix, PathBuf::from("lib"));
    }

    #[test]
    fn test_normalize_pattern() {
        assert_eq!(normalize_pattern("./lib/").as_deref(), Some("lib"));
        assert_eq!(normalize_pattern("/dist").as_deref(), Some("dist"));
        assert_eq!(normalize_pattern("././a/*.js").as_deref(), Some("a/*.js"));
        assert_eq!(normalize_pattern(""), None);
        assert_eq!(normalize_pattern("./"), None);
        assert_eq!(normalize_pattern("a/../b"), None);
    }

    #[test]
    fn test_first_present_candidate() {
        let names = vec!["readme.MD".to_string(), "readme".to_string()];
        assert_eq!(first_present_candidate(README_CANDIDATES, &names), Some("readme"));

        let names = vec!["ReadMe.md".to_string()];
        assert_eq!(first_present_candidate(README_CANDIDATES, &names), Some("ReadMe.md"));

        let names = vec!["CHANGELOG.md".to_string()];
        assert_eq!(first_present_candidate(README_CANDIDATES, &names), None);
    }
}
