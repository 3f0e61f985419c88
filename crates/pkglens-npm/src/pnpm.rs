//! pnpm-workspace.yaml catalog entries.
//!
//! Catalogs declare shared version ranges:
//!
//! ```yaml
//! catalog:
//!   react: ^18.2.0
//! catalogs:
//!   legacy:
//!     react: ^17.0.2
//! ```
//!
//! The file is scanned line by line; only the two catalog sections are
//! understood, which is enough to locate entries under the cursor.

use crate::package_name;
use pkglens_core::LineIndex;
use std::ops::Range as Span;
use tower_lsp_server::ls_types::Range;

/// A catalog entry found under the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub version: String,
    /// Named catalog, or `None` for the default `catalog:` section.
    pub catalog: Option<String>,
    pub name_range: Range,
    pub version_range: Range,
}

#[derive(Debug, Clone, PartialEq)]
enum Section {
    Other,
    Default,
    Named {
        current: Option<(String, usize)>,
    },
}

/// One `key: value` line with byte spans relative to the document.
#[derive(Debug)]
struct KeyValueLine<'a> {
    indent: usize,
    key: &'a str,
    /// Span of the whole key token, quotes included.
    key_token: Span<usize>,
    key_content: Span<usize>,
    value: &'a str,
    value_content: Span<usize>,
}

/// Finds the catalog entry whose name is at `offset`.
pub fn locate_catalog_entry(text: &str, offset: usize) -> Option<CatalogEntry> {
    let mut section = Section::Other;
    let mut line_start = 0;

    for raw in text.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\n', '\r']);
        let start = line_start;
        line_start += raw.len();

        let Some(parsed) = parse_line(line, start) else {
            continue;
        };

        if parsed.indent == 0 {
            section = match parsed.key {
                "catalog" => Section::Default,
                "catalogs" => Section::Named { current: None },
                _ => Section::Other,
            };
            continue;
        }

        let catalog = match &mut section {
            Section::Other => continue,
            Section::Default => None,
            Section::Named { current } => {
                if parsed.value.is_empty() {
                    *current = Some((parsed.key.to_string(), parsed.indent));
                    continue;
                }
                match current {
                    Some((name, indent)) if parsed.indent > *indent => Some(name.clone()),
                    _ => continue,
                }
            }
        };

        if parsed.value.is_empty() {
            continue;
        }
        if offset < parsed.key_token.start || offset > parsed.key_token.end {
            continue;
        }
        if !package_name::is_valid(parsed.key) {
            return None;
        }

        let index = LineIndex::new(text);
        return Some(CatalogEntry {
            name: parsed.key.to_string(),
            version: parsed.value.to_string(),
            catalog,
            name_range: index.range(text, parsed.key_content.start, parsed.key_content.end),
            version_range: index.range(
                text,
                parsed.value_content.start,
                parsed.value_content.end,
            ),
        });
    }

    None
}

fn parse_line(line: &str, line_offset: usize) -> Option<KeyValueLine<'_>> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    let rest = &line[indent..];
    if rest.is_empty() || rest.starts_with('#') || rest.starts_with('-') {
        return None;
    }
    let base = line_offset + indent;

    let (key, key_token, key_content, after_key) = match rest.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let close = rest[1..].find(quote)? + 1;
            (
                &rest[1..close],
                base..base + close + 1,
                base + 1..base + close,
                close + 1,
            )
        }
        _ => {
            let colon = find_key_colon(rest)?;
            let key = rest[..colon].trim_end();
            (key, base..base + key.len(), base..base + key.len(), colon)
        }
    };

    let after = &rest[after_key..];
    let after = after.trim_start_matches(' ');
    let value_part = after.strip_prefix(':')?;
    let value_at = rest.len() - value_part.len();

    let trimmed = value_part.trim_start();
    let value_start = value_at + (value_part.len() - trimmed.len());
    let (value, value_content) = match trimmed.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let close = trimmed[1..].find(quote)? + 1;
            (
                &trimmed[1..close],
                base + value_start + 1..base + value_start + close,
            )
        }
        Some('#') | None => ("", base + value_start..base + value_start),
        Some(_) => {
            let end = trimmed.find(" #").unwrap_or(trimmed.len());
            let value = trimmed[..end].trim_end();
            (value, base + value_start..base + value_start + value.len())
        }
    };

    Some(KeyValueLine {
        indent,
        key,
        key_token,
        key_content,
        value,
        value_content,
    })
}

/// Position of the `:` ending a bare key: followed by a space or line end.
fn find_key_colon(rest: &str) -> Option<usize> {
    rest.char_indices()
        .find(|&(i, c)| c == ':' && rest[i + 1..].chars().next().is_none_or(|n| n == ' '))
        .map(|(i, _)| i)
}
