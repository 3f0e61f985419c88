//! npm package name validation.
//!
//! Applies the registry rules that make a name unusable. Style warnings that
//! only affect new publications (uppercase letters, length over 214, core
//! module names) are not enforced, since existing packages may still carry
//! them.

use crate::error::{NpmError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static SCOPED_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:@([^/]+?)/)?([^/]+?)$").expect("valid regex"));

/// Characters `encodeURIComponent` leaves untouched.
static URL_SAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-_.!~*'()]+$").expect("valid regex"));

const BLOCKED_NAMES: &[&str] = &["node_modules", "favicon.ico"];

/// Checks `name` against the registry naming rules.
///
/// # Examples
///
/// ```
/// use pkglens_npm::package_name::validate;
///
/// assert!(validate("@scope/left-pad").is_ok());
/// assert!(validate("JSONStream").is_ok());
/// assert!(validate(".hidden").is_err());
/// assert!(validate("with space").is_err());
/// ```
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(NpmError::invalid_package_name(
            name,
            "name length must be greater than zero",
        ));
    }
    if name.starts_with('.') {
        return Err(NpmError::invalid_package_name(
            name,
            "name cannot start with a period",
        ));
    }
    if name.starts_with('_') {
        return Err(NpmError::invalid_package_name(
            name,
            "name cannot start with an underscore",
        ));
    }
    if name.trim() != name {
        return Err(NpmError::invalid_package_name(
            name,
            "name cannot contain leading or trailing spaces",
        ));
    }
    if BLOCKED_NAMES
        .iter()
        .any(|blocked| blocked.eq_ignore_ascii_case(name))
    {
        return Err(NpmError::invalid_package_name(name, "name is blocklisted"));
    }

    let url_friendly = SCOPED_NAME.captures(name).is_some_and(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .all(|part| URL_SAFE.is_match(part.as_str()))
    });
    if !url_friendly {
        return Err(NpmError::invalid_package_name(
            name,
            "name can only contain URL-friendly characters",
        ));
    }

    Ok(())
}

pub fn is_valid(name: &str) -> bool {
    validate(name).is_ok()
}
