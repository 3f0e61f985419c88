//! Lossless JSON parse tree with byte offsets.
//!
//! Value-only deserializers throw away where things came from. Annotations
//! need exact source ranges, so the manifest is additionally parsed into an
//! arena of [`Node`]s that remember their byte span, their parent, and (for
//! strings) their decoded value.
//!
//! Properties are first-class nodes: an object's children are `Property`
//! nodes whose two children are the key string and the value.

use crate::error::{NpmError, Result};

/// Index of a node inside a [`JsonTree`].
pub type NodeId = usize;

/// Nesting limit; deeper documents are rejected instead of recursing further.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    Property,
    String,
    Number,
    Boolean,
    Null,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Byte offset of the first character (the opening quote for strings).
    pub offset: usize,
    /// Byte length, including quotes and brackets.
    pub length: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Decoded value for strings, raw text for numbers and booleans.
    pub value: Option<String>,
}

impl Node {
    /// Byte offset one past the last character.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Parsed document. The root value is always node `0`.
///
/// # Examples
///
/// ```
/// use pkglens_npm::json_tree::{JsonTree, NodeKind};
///
/// let text = r#"{"files": ["dist"]}"#;
/// let tree = JsonTree::parse(text).unwrap();
///
/// let files = tree.find_path(&["files"]).unwrap();
/// assert_eq!(tree.node(files).kind, NodeKind::Array);
///
/// let entry = tree.node(files).children[0];
/// assert_eq!(tree.string_value(entry), Some("dist"));
/// assert_eq!(&text[tree.node(entry).offset..tree.node(entry).end()], "\"dist\"");
/// ```
#[derive(Debug, Clone)]
pub struct JsonTree {
    nodes: Vec<Node>,
}

impl JsonTree {
    /// Parses strict JSON (RFC 8259), tolerating a leading byte order mark.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser {
            text,
            pos: 0,
            nodes: Vec::new(),
            depth: 0,
        };

        if text.starts_with('\u{FEFF}') {
            parser.pos = '\u{FEFF}'.len_utf8();
        }

        parser.parse_value(None)?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(parser.error("unexpected trailing characters"));
        }

        Ok(Self {
            nodes: parser.nodes,
        })
    }

    pub const fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the decoded value of a string node.
    pub fn string_value(&self, id: NodeId) -> Option<&str> {
        let node = self.nodes.get(id)?;
        match node.kind {
            NodeKind::String => node.value.as_deref(),
            _ => None,
        }
    }

    /// Byte span of a string's contents, quotes excluded.
    pub fn string_content_span(&self, id: NodeId) -> Option<(usize, usize)> {
        let node = self.nodes.get(id)?;
        (node.kind == NodeKind::String).then(|| (node.offset + 1, node.end() - 1))
    }

    /// Returns the key node of a property.
    pub fn property_key(&self, property: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(property)?;
        (node.kind == NodeKind::Property)
            .then(|| node.children.first().copied())
            .flatten()
    }

    /// Returns the value node of a property.
    pub fn property_value_node(&self, property: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(property)?;
        (node.kind == NodeKind::Property)
            .then(|| node.children.get(1).copied())
            .flatten()
    }

    /// Finds the property named `key` directly inside `object`.
    ///
    /// Duplicate keys resolve to the last occurrence, matching how JSON
    /// deserializers treat them.
    pub fn find_property(&self, object: NodeId, key: &str) -> Option<NodeId> {
        let node = self.nodes.get(object)?;
        if node.kind != NodeKind::Object {
            return None;
        }
        node.children.iter().rev().copied().find(|&property| {
            self.property_key(property)
                .and_then(|k| self.string_value(k))
                == Some(key)
        })
    }

    /// Follows object keys from the root and returns the value node.
    pub fn find_path(&self, path: &[&str]) -> Option<NodeId> {
        let mut current = self.root();
        for key in path {
            let property = self.find_property(current, key)?;
            current = self.property_value_node(property)?;
        }
        Some(current)
    }

    /// Returns the innermost node whose span contains `offset`.
    ///
    /// Spans are half-open: the byte right after a closing quote belongs to
    /// the enclosing node.
    pub fn node_at_offset(&self, offset: usize) -> Option<NodeId> {
        let mut current = self.root();
        let root = self.nodes.first()?;
        if offset < root.offset || offset >= root.end() {
            return None;
        }

        'descend: loop {
            for &child in &self.nodes[current].children {
                let node = &self.nodes[child];
                if offset >= node.offset && offset < node.end() {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    nodes: Vec<Node>,
    depth: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> NpmError {
        NpmError::Syntax {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    fn push_node(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            offset: self.pos,
            length: 0,
            parent,
            children: Vec::new(),
            value: None,
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    fn finish(&mut self, id: NodeId) {
        let node = &mut self.nodes[id];
        node.length = self.pos - node.offset;
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        Ok(())
    }

    fn parse_value(&mut self, parent: Option<NodeId>) -> Result<NodeId> {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.parse_object(parent),
            Some(b'[') => self.parse_array(parent),
            Some(b'"') => self.parse_string(parent),
            Some(b't') => self.parse_literal(parent, "true", NodeKind::Boolean),
            Some(b'f') => self.parse_literal(parent, "false", NodeKind::Boolean),
            Some(b'n') => self.parse_literal(parent, "null", NodeKind::Null),
            Some(b'-' | b'0'..=b'9') => self.parse_number(parent),
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_object(&mut self, parent: Option<NodeId>) -> Result<NodeId> {
        let id = self.push_node(NodeKind::Object, parent);
        self.pos += 1;
        self.enter()?;

        self.skip_ws();
        if !self.eat(b'}') {
            loop {
                self.skip_ws();
                if self.peek() != Some(b'"') {
                    return Err(self.error("expected property name"));
                }
                let property = self.push_node(NodeKind::Property, Some(id));
                self.parse_string(Some(property))?;

                self.skip_ws();
                if !self.eat(b':') {
                    return Err(self.error("expected ':'"));
                }
                self.parse_value(Some(property))?;
                self.finish(property);

                self.skip_ws();
                if self.eat(b',') {
                    continue;
                }
                if self.eat(b'}') {
                    break;
                }
                return Err(self.error("expected ',' or '}'"));
            }
        }

        self.depth -= 1;
        self.finish(id);
        Ok(id)
    }

    fn parse_array(&mut self, parent: Option<NodeId>) -> Result<NodeId> {
        let id = self.push_node(NodeKind::Array, parent);
        self.pos += 1;
        self.enter()?;

        self.skip_ws();
        if !self.eat(b']') {
            loop {
                self.parse_value(Some(id))?;
                self.skip_ws();
                if self.eat(b',') {
                    continue;
                }
                if self.eat(b']') {
                    break;
                }
                return Err(self.error("expected ',' or ']'"));
            }
        }

        self.depth -= 1;
        self.finish(id);
        Ok(id)
    }

    fn parse_string(&mut self, parent: Option<NodeId>) -> Result<NodeId> {
        let id = self.push_node(NodeKind::String, parent);
        self.pos += 1;

        let mut value = String::new();
        loop {
            let Some(c) = self.text[self.pos..].chars().next() else {
                return Err(self.error("unterminated string"));
            };
            self.pos += c.len_utf8();
            match c {
                '"' => break,
                '\\' => {
                    let escaped = self.parse_escape()?;
                    value.push(escaped);
                }
                c if (c as u32) < 0x20 => {
                    return Err(self.error("control character in string"));
                }
                c => value.push(c),
            }
        }

        self.nodes[id].value = Some(value);
        self.finish(id);
        Ok(id)
    }

    fn parse_escape(&mut self) -> Result<char> {
        let Some(c) = self.peek() else {
            return Err(self.error("unterminated escape"));
        };
        self.pos += 1;
        let decoded = match c {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let first = self.parse_hex4()?;
                let mut units = vec![first];
                if (0xD800..=0xDBFF).contains(&first)
                    && self.text[self.pos..].starts_with("\\u")
                {
                    let checkpoint = self.pos;
                    self.pos += 2;
                    let second = self.parse_hex4()?;
                    if (0xDC00..=0xDFFF).contains(&second) {
                        units.push(second);
                    } else {
                        self.pos = checkpoint;
                    }
                }
                char::decode_utf16(units)
                    .next()
                    .and_then(|r| r.ok())
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            }
            _ => return Err(self.error("invalid escape sequence")),
        };
        Ok(decoded)
    }

    fn parse_hex4(&mut self) -> Result<u16> {
        let digits = self
            .text
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| self.error("truncated unicode escape"))?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(self.error("invalid unicode escape"));
        }
        let unit =
            u16::from_str_radix(digits, 16).map_err(|_| self.error("invalid unicode escape"))?;
        self.pos += 4;
        Ok(unit)
    }

    fn parse_literal(
        &mut self,
        parent: Option<NodeId>,
        literal: &str,
        kind: NodeKind,
    ) -> Result<NodeId> {
        if !self.text[self.pos..].starts_with(literal) {
            return Err(self.error("invalid literal"));
        }
        let id = self.push_node(kind, parent);
        self.pos += literal.len();
        if kind == NodeKind::Boolean {
            self.nodes[id].value = Some(literal.to_string());
        }
        self.finish(id);
        Ok(id)
    }

    fn parse_number(&mut self, parent: Option<NodeId>) -> Result<NodeId> {
        let start = self.pos;
        self.eat(b'-');

        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.skip_digits(),
            _ => return Err(self.error("invalid number")),
        }

        if self.eat(b'.') {
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error("expected digit after decimal point"));
            }
            self.skip_digits();
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.error("expected digit in exponent"));
            }
            self.skip_digits();
        }

        let end = self.pos;
        self.pos = start;
        let id = self.push_node(NodeKind::Number, parent);
        self.pos = end;
        self.nodes[id].value = Some(self.text[start..end].to_string());
        self.finish(id);
        Ok(id)
    }

    fn skip_digits(&mut self) {
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span<'a>(text: &'a str, tree: &JsonTree, id: NodeId) -> &'a str {
        let node = tree.node(id);
        &text[node.offset..node.end()]
    }

    #[test]
    fn test_parse_object_structure() {
        let text = r#"{ "name": "demo", "private": true, "count": -1.5e3, "x": null }"#;
        let tree = JsonTree::parse(text).unwrap();

        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::Object);
        assert_eq!(root.children.len(), 4);
        assert_eq!(span(text, &tree, tree.root()), text);

        let name = tree.find_path(&["name"]).unwrap();
        assert_eq!(tree.string_value(name), Some("demo"));
        assert_eq!(span(text, &tree, name), "\"demo\"");

        let private = tree.find_path(&["private"]).unwrap();
        assert_eq!(tree.node(private).kind, NodeKind::Boolean);

        let count = tree.find_path(&["count"]).unwrap();
        assert_eq!(tree.node(count).value.as_deref(), Some("-1.5e3"));

        let x = tree.find_path(&["x"]).unwrap();
        assert_eq!(tree.node(x).kind, NodeKind::Null);
    }

    #[test]
    fn test_property_spans_key_through_value() {
        let text = r#"{"dependencies": {"react": "^18.2.0"}}"#;
        let tree = JsonTree::parse(text).unwrap();

        let deps = tree.find_path(&["dependencies"]).unwrap();
        let property = tree.find_property(deps, "react").unwrap();
        assert_eq!(span(text, &tree, property), r#""react": "^18.2.0""#);

        let key = tree.property_key(property).unwrap();
        let value = tree.property_value_node(property).unwrap();
        assert_eq!(span(text, &tree, key), "\"react\"");
        assert_eq!(span(text, &tree, value), "\"^18.2.0\"");
        assert_eq!(tree.parent(key), Some(property));
        assert_eq!(tree.parent(property), Some(deps));
    }

    #[test]
    fn test_node_at_offset_descends_to_leaf() {
        let text = r#"{"dependencies": {"react": "^18.2.0"}}"#;
        let tree = JsonTree::parse(text).unwrap();

        let inside_key = text.find("react").unwrap() + 2;
        let node = tree.node_at_offset(inside_key).unwrap();
        assert_eq!(tree.string_value(node), Some("react"));

        let inside_value = text.find("^18").unwrap();
        let node = tree.node_at_offset(inside_value).unwrap();
        assert_eq!(tree.string_value(node), Some("^18.2.0"));

        let on_colon = text.find("\": \"^").unwrap() + 1;
        let node = tree.node_at_offset(on_colon).unwrap();
        assert_eq!(tree.node(node).kind, NodeKind::Property);

        assert_eq!(tree.node_at_offset(text.len()), None);
    }

    #[test]
    fn test_string_escapes_decoded() {
        let text = r#"["a\"b", "tab\there", "é", "🚀", "\/"]"#;
        let tree = JsonTree::parse(text).unwrap();

        let values: Vec<_> = tree
            .node(tree.root())
            .children
            .iter()
            .map(|&id| tree.string_value(id).unwrap().to_string())
            .collect();
        assert_eq!(values, vec!["a\"b", "tab\there", "é", "🚀", "/"]);
    }

    #[test]
    fn test_lone_surrogate_replaced() {
        let tree = JsonTree::parse(r#"["\ud800x"]"#).unwrap();
        let entry = tree.node(tree.root()).children[0];
        assert_eq!(tree.string_value(entry), Some("\u{FFFD}x"));
    }

    #[test]
    fn test_multibyte_offsets_are_bytes() {
        let text = r#"{"描述": "ok"}"#;
        let tree = JsonTree::parse(text).unwrap();
        let value = tree.find_path(&["描述"]).unwrap();
        assert_eq!(span(text, &tree, value), "\"ok\"");
        assert_eq!(tree.string_content_span(value), Some((text.len() - 4, text.len() - 2)));
    }

    #[test]
    fn test_byte_order_mark_skipped() {
        let text = "\u{FEFF}{\"a\": 1}";
        let tree = JsonTree::parse(text).unwrap();
        assert_eq!(tree.node(tree.root()).offset, 3);
    }

    #[test]
    fn test_duplicate_keys_use_last() {
        let text = r#"{"main": "a.js", "main": "b.js"}"#;
        let tree = JsonTree::parse(text).unwrap();
        let main = tree.find_path(&["main"]).unwrap();
        assert_eq!(tree.string_value(main), Some("b.js"));
    }

    #[test]
    fn test_syntax_errors() {
        for bad in [
            "",
            "{",
            r#"{"a" 1}"#,
            r#"{"a": 1,}"#,
            "[1, 2,]",
            r#"{"a": tru}"#,
            r#"{"a": 01}"#,
            r#"{"a": 1.}"#,
            r#"{"a": "x"} trailing"#,
            "{\"a\": \"line\nbreak\"}",
            r#"{"a": "\q"}"#,
            r#"{'a': 1}"#,
            r#"{"a": "\u+041"}"#,
            r#"{"a": "\u-041"}"#,
            r#"{"a": "\u 041"}"#,
            r#"{"a": "\u00"}"#,
        ] {
            assert!(JsonTree::parse(bad).is_err(), "should reject: {bad:?}");
        }
    }

    #[test]
    fn test_error_reports_offset() {
        let err = JsonTree::parse(r#"{"a" 1}"#).unwrap_err();
        match err {
            NpmError::Syntax { offset, .. } => assert_eq!(offset, 5),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(JsonTree::parse(&deep).is_err());

        let fine = format!("{}{}", "[".repeat(16), "]".repeat(16));
        assert!(JsonTree::parse(&fine).is_ok());
    }
}
