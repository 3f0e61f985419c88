use pkglens_npm::AggregatorOptions;
use serde::Deserialize;
use serde_json::Value;

/// Root configuration for the pkglens server.
///
/// Provided by the client via initialization options or
/// `workspace/didChangeConfiguration`. Every field has a default.
///
/// # Examples
///
/// ```
/// use pkglens_lsp::config::LensConfig;
///
/// let json = r#"{
///     "files": {
///         "include_default_packed_files": true,
///         "pattern_title": "{count} {files} matched"
///     }
/// }"#;
///
/// let config: LensConfig = serde_json::from_str(json).unwrap();
/// assert!(config.files.enabled);
/// assert!(config.files.include_default_packed_files);
/// ```
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct LensConfig {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub hover: HoverConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl LensConfig {
    /// Reads the configuration out of a `didChangeConfiguration` payload.
    ///
    /// Accepts settings nested under a `pkglens` key or given directly.
    /// Returns `None` when the payload does not deserialize.
    pub fn from_settings(settings: Value) -> Option<Self> {
        let settings = match settings {
            Value::Object(mut map) if map.contains_key("pkglens") => map.remove("pkglens")?,
            other => other,
        };
        match serde_json::from_value(settings) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring invalid configuration: {}", e);
                None
            }
        }
    }
}

/// Code lenses over the `files` field.
///
/// Title templates substitute `{count}` with the number of files and
/// `{files}` with `file` or `files`.
///
/// # Defaults
///
/// - `enabled`: `true`
/// - `include_default_packed_files`: `false`
/// - `pattern_title`: `"{count} {files}"`
/// - `all_files_title`: `"{count} {files} in package"`
/// - `excluded_title`: `"excludes {count} {files}"`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FilesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub include_default_packed_files: bool,
    /// Maximum length: 100 characters (truncated with warning if exceeded)
    #[serde(default = "default_pattern_title", deserialize_with = "deserialize_title")]
    pub pattern_title: String,
    #[serde(default = "default_all_files_title", deserialize_with = "deserialize_title")]
    pub all_files_title: String,
    #[serde(default = "default_excluded_title", deserialize_with = "deserialize_title")]
    pub excluded_title: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_default_packed_files: false,
            pattern_title: default_pattern_title(),
            all_files_title: default_all_files_title(),
            excluded_title: default_excluded_title(),
        }
    }
}

/// Dependency hovers.
///
/// # Defaults
///
/// - `enabled`: `true`
/// - `show_bundle_size`: `false`
/// - `show_types_badge`: `false`
/// - `show_stars_badge`: `true`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HoverConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub show_bundle_size: bool,
    #[serde(default)]
    pub show_types_badge: bool,
    #[serde(default = "default_true")]
    pub show_stars_badge: bool,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            show_bundle_size: false,
            show_types_badge: false,
            show_stars_badge: true,
        }
    }
}

impl HoverConfig {
    pub fn aggregator_options(&self) -> AggregatorOptions {
        AggregatorOptions {
            show_bundle_size: self.show_bundle_size,
            show_types_badge: self.show_types_badge,
            show_stars_badge: self.show_stars_badge,
        }
    }
}

/// HTTP caching of registry and bundlephobia responses.
///
/// Entries younger than `refresh_interval_secs` are served without
/// revalidation; older ones are revalidated with ETag / Last-Modified.
///
/// # Defaults
///
/// - `enabled`: `true`
/// - `refresh_interval_secs`: `300` (5 minutes)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            enabled: true,
        }
    }
}

/// Expands a title template for `count` files.
pub fn format_title(template: &str, count: usize) -> String {
    let noun = if count == 1 { "file" } else { "files" };
    template
        .replace("{count}", &count.to_string())
        .replace("{files}", noun)
}

// Default value functions
const fn default_true() -> bool {
    true
}

fn default_pattern_title() -> String {
    "{count} {files}".to_string()
}

fn default_all_files_title() -> String {
    "{count} {files} in package".to_string()
}

fn default_excluded_title() -> String {
    "excludes {count} {files}".to_string()
}

const fn default_refresh_interval() -> u64 {
    300 // 5 minutes
}

/// Maximum length for lens titles
const MAX_TITLE_LENGTH: usize = 100;

fn validate_title(text: String) -> String {
    if text.chars().count() > MAX_TITLE_LENGTH {
        tracing::warn!(
            "lens title exceeded max length of {} chars, truncating",
            MAX_TITLE_LENGTH
        );
        text.chars().take(MAX_TITLE_LENGTH).collect()
    } else {
        text
    }
}

fn deserialize_title<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    Ok(validate_title(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = LensConfig::default();
        assert!(config.files.enabled);
        assert!(!config.files.include_default_packed_files);
        assert_eq!(config.files.pattern_title, "{count} {files}");
        assert_eq!(config.files.all_files_title, "{count} {files} in package");
        assert_eq!(config.files.excluded_title, "excludes {count} {files}");
        assert!(config.hover.enabled);
        assert!(!config.hover.show_bundle_size);
        assert!(!config.hover.show_types_badge);
        assert!(config.hover.show_stars_badge);
        assert_eq!(config.cache.refresh_interval_secs, 300);
    }

    #[test]
    fn test_empty_config_deserialization() {
        let config: LensConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LensConfig::default());
    }

    #[test]
    fn test_partial_config_deserialization() {
        let json = r#"{
            "hover": { "show_bundle_size": true },
            "cache": { "enabled": false }
        }"#;

        let config: LensConfig = serde_json::from_str(json).unwrap();
        assert!(config.hover.show_bundle_size);
        assert!(config.hover.show_stars_badge);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.refresh_interval_secs, 300);
        assert_eq!(config.files, FilesConfig::default());
    }

    #[test]
    fn test_title_truncation() {
        let json = json!({ "pattern_title": "a".repeat(150) });
        let config: FilesConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.pattern_title, "a".repeat(100));

        let json = json!({ "excluded_title": "é".repeat(100) });
        let config: FilesConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.excluded_title.chars().count(), 100);
    }

    #[test]
    fn test_from_settings() {
        let nested = json!({ "pkglens": { "files": { "enabled": false } } });
        let config = LensConfig::from_settings(nested).unwrap();
        assert!(!config.files.enabled);

        let direct = json!({ "hover": { "enabled": false } });
        let config = LensConfig::from_settings(direct).unwrap();
        assert!(!config.hover.enabled);

        let invalid = json!({ "files": { "enabled": "yes" } });
        assert!(LensConfig::from_settings(invalid).is_none());
    }

    #[test]
    fn test_format_title() {
        assert_eq!(format_title("{count} {files}", 0), "0 files");
        assert_eq!(format_title("{count} {files}", 1), "1 file");
        assert_eq!(
            format_title("excludes {count} {files}", 12),
            "excludes 12 files"
        );
    }

    #[test]
    fn test_aggregator_options() {
        let hover = HoverConfig {
            show_bundle_size: true,
            ..Default::default()
        };
        let options = hover.aggregator_options();
        assert!(options.show_bundle_size);
        assert!(!options.show_types_badge);
        assert!(options.show_stars_badge);
    }
}
