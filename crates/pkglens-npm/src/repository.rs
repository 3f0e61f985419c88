//! Repository, bugs and homepage URL normalization.
//!
//! package.json accepts many spellings for a repository: hosted shorthands
//! (`github:user/repo`, plain `user/repo`), git transport URLs
//! (`git+https://…`, `git://…`, `git+ssh://git@…`) and scp-like remotes
//! (`git@github.com:user/repo.git`). All of them are turned into a browsable
//! HTTPS URL without a `.git` suffix or `#commit-ish`.

use crate::manifest::Manifest;
use once_cell::sync::Lazy;
use regex::Regex;

static HOSTED_SHORTHAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(github|gitlab|bitbucket|gist):(.+)$").expect("valid regex"));

static BARE_SHORTHAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.-]+/[\w.-]+$").expect("valid regex"));

static SCP_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[\w.-]+@)?([\w-]+(?:\.[\w-]+)+):([^/\d][^:]*)$").expect("valid regex")
});

static GITHUB_SLUG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://github\.com/([\w.-]+)/([\w.-]+)$").expect("valid regex")
});

const URL_SCHEMES: &[&str] = &["https://", "http://", "git://", "ssh://"];

/// Normalizes a repository reference into a canonical HTTPS URL.
///
/// Returns `None` for values that do not look like a repository.
///
/// # Examples
///
/// ```
/// use pkglens_npm::repository::normalize_repository_url;
///
/// assert_eq!(
///     normalize_repository_url("git+https://github.com/user/repo.git#main").as_deref(),
///     Some("https://github.com/user/repo"),
/// );
/// assert_eq!(
///     normalize_repository_url("gitlab:group/project").as_deref(),
///     Some("https://gitlab.com/group/project"),
/// );
/// ```
pub fn normalize_repository_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.split('#').next().unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }

    if let Some(caps) = HOSTED_SHORTHAND.captures(raw) {
        let host = match &caps[1] {
            "gitlab" => "gitlab.com",
            "bitbucket" => "bitbucket.org",
            "gist" => "gist.github.com",
            _ => "github.com",
        };
        return Some(finish(&format!("https://{host}/{}", &caps[2])));
    }

    if BARE_SHORTHAND.is_match(raw) {
        return Some(finish(&format!("https://github.com/{raw}")));
    }

    if let Some(caps) = SCP_LIKE.captures(raw) {
        return Some(finish(&format!("https://{}/{}", &caps[1], &caps[2])));
    }

    let unprefixed = raw.strip_prefix("git+").unwrap_or(raw);
    let rest = URL_SCHEMES
        .iter()
        .find_map(|scheme| unprefixed.strip_prefix(scheme))?;

    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let url = match host.split_once(':') {
        // numeric port: drop it, the web UI is on the default port
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => {
            format!("https://{name}/{path}")
        }
        // `ssh://git@host:user/repo`
        Some((name, first_segment)) => format!("https://{name}/{first_segment}/{path}"),
        None => format!("https://{host}/{path}"),
    };

    Some(finish(&url))
}

fn finish(url: &str) -> String {
    let url = url.trim_end_matches('/');
    let url = url.strip_suffix(".git").unwrap_or(url);
    url.trim_end_matches('/').to_string()
}

/// Repository URL derived from a bugs tracker URL ending in `/issues`.
pub fn repository_from_bugs(bugs: &str) -> Option<String> {
    let trimmed = bugs.trim().trim_end_matches('/');
    let stripped = trimmed.strip_suffix("/issues")?;
    normalize_repository_url(stripped)
}

/// The repository URL for a manifest: the `repository` field when present,
/// otherwise the bugs tracker with `/issues` removed.
pub fn repository_url(manifest: &Manifest) -> Option<String> {
    match &manifest.repository {
        Some(repository) => normalize_repository_url(repository),
        None => manifest.bugs.as_deref().and_then(repository_from_bugs),
    }
}

/// The homepage, unless it only points back at the repository.
pub fn distinct_homepage(homepage: &str, repository: Option<&str>) -> Option<String> {
    let homepage = homepage.trim();
    if homepage.is_empty() {
        return None;
    }
    let same = repository.is_some_and(|repo| comparable(homepage) == comparable(repo));
    (!same).then(|| homepage.to_string())
}

fn comparable(url: &str) -> String {
    let url = url.strip_suffix("#readme").unwrap_or(url);
    let url = url.trim_end_matches('/');
    let url = url.strip_prefix("http://").map_or_else(
        || url.to_string(),
        |rest| format!("https://{rest}"),
    );
    url.to_ascii_lowercase()
}

/// `(owner, repo)` for a normalized GitHub URL.
pub fn github_slug(repository_url: &str) -> Option<(String, String)> {
    let caps = GITHUB_SLUG.captures(repository_url)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}
