//! Node.js built-in modules.

/// Modules importable with or without the `node:` scheme.
const BUILTIN_MODULES: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "inspector/promises",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Modules that only exist under the `node:` scheme.
const SCHEME_ONLY_MODULES: &[&str] = &["sea", "sqlite", "test", "test/reporters"];

const DOCS_BASE: &str = "https://nodejs.org/api";

/// Strips the `node:` scheme and returns the module name when `name`
/// refers to a built-in module.
pub fn builtin_module(name: &str) -> Option<&str> {
    match name.strip_prefix("node:") {
        Some(module) => (BUILTIN_MODULES.contains(&module) || SCHEME_ONLY_MODULES.contains(&module))
            .then_some(module),
        None => BUILTIN_MODULES.contains(&name).then_some(name),
    }
}

pub fn is_builtin(name: &str) -> bool {
    builtin_module(name).is_some()
}

/// Documentation page for a built-in module.
///
/// # Examples
///
/// ```
/// use pkglens_npm::builtins::docs_url;
///
/// assert_eq!(docs_url("fs/promises").as_deref(), Some("https://nodejs.org/api/fs.html"));
/// assert_eq!(docs_url("node:test").as_deref(), Some("https://nodejs.org/api/test.html"));
/// assert_eq!(docs_url("express"), None);
/// ```
pub fn docs_url(name: &str) -> Option<String> {
    let module = builtin_module(name)?;
    let page = match module {
        "stream/web" | "stream/consumers" => "webstreams",
        "sys" | "util/types" => "util",
        "constants" => "os",
        "sea" => "single-executable-applications",
        other => other.split('/').next().unwrap_or(other),
    };
    Some(format!("{DOCS_BASE}/{page}.html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_detection() {
        assert!(is_builtin("fs"));
        assert!(is_builtin("node:fs"));
        assert!(is_builtin("fs/promises"));
        assert!(is_builtin("node:test"));
        assert!(!is_builtin("test"));
        assert!(!is_builtin("express"));
        assert!(!is_builtin("node:express"));
        assert!(!is_builtin("@types/node"));
    }

    #[test]
    fn test_builtin_module_strips_scheme() {
        assert_eq!(builtin_module("node:path/posix"), Some("path/posix"));
        assert_eq!(builtin_module("path"), Some("path"));
    }

    #[test]
    fn test_docs_urls() {
        assert_eq!(
            docs_url("node:child_process").as_deref(),
            Some("https://nodejs.org/api/child_process.html")
        );
        assert_eq!(
            docs_url("stream/web").as_deref(),
            Some("https://nodejs.org/api/webstreams.html")
        );
        assert_eq!(
            docs_url("timers/promises").as_deref(),
            Some("https://nodejs.org/api/timers.html")
        );
        assert_eq!(docs_url("lodash"), None);
    }
}
