//! # WKT Text Tree
//!
//! A purely structural tree built by tokenizing WKT text. It knows nothing
//! about CRSs: a node is a keyword or literal value plus an ordered list of
//! children.
//!
//! ## Grammar
//!
//! ```text
//! node     := quoted | token [ open children close ]
//! open     := '[' | '('
//! close    := ']' | ')'        (must match the opening bracket)
//! children := node { ',' node }
//! quoted   := '"' { any character, '""' for a literal quote } '"'
//! token    := any run of characters except brackets, comma, quote, space
//! ```
//!
//! Nesting is bounded by [`MAX_RECURSION_LEVEL`]: deeper input fails with a
//! parse error instead of exhausting the call stack.

use std::fmt;

use crate::error::{Error, Result};

/// Maximum bracket nesting accepted by the tokenizer.
pub const MAX_RECURSION_LEVEL: usize = 16;

/// A node of the WKT text tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WktNode {
    value: String,
    quoted: bool,
    children: Vec<WktNode>,
}

impl WktNode {
    /// Create a bare (unquoted) node.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: false,
            children: Vec::new(),
        }
    }

    /// Create a quoted string leaf. `value` is the unescaped content.
    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: true,
            children: Vec::new(),
        }
    }

    /// Keyword or literal value, without quotes.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    pub fn children(&self) -> &[WktNode] {
        &self.children
    }

    pub fn add_child(&mut self, child: WktNode) {
        self.children.push(child);
    }

    /// True when this node is an unquoted keyword equal to `name`,
    /// ignoring case.
    pub fn is(&self, name: &str) -> bool {
        !self.quoted && self.value.eq_ignore_ascii_case(name)
    }

    /// The `occurrence`-th (0-based) child keyword named `name`, ignoring case.
    pub fn look_for_child(&self, name: &str, occurrence: usize) -> Option<&WktNode> {
        self.children
            .iter()
            .filter(|child| child.is(name))
            .nth(occurrence)
    }

    /// The first child keyword matching any of `names`.
    pub fn look_for_any_child(&self, names: &[&str]) -> Option<&WktNode> {
        self.children
            .iter()
            .find(|child| names.iter().any(|name| child.is(name)))
    }

    pub fn count_children_of_name(&self, name: &str) -> usize {
        self.children.iter().filter(|child| child.is(name)).count()
    }

    /// Children that are keyword nodes with brackets, i.e. not plain values.
    pub fn keyword_children(&self) -> impl Iterator<Item = &WktNode> {
        self.children
            .iter()
            .filter(|child| !child.quoted && !child.children.is_empty())
    }

    /// Value of the `index`-th child, whatever its quoting.
    pub fn child_value(&self, index: usize) -> Option<&str> {
        self.children.get(index).map(|child| child.value.as_str())
    }

    /// Parse the whole of `text` as a single node.
    ///
    /// Anything but whitespace after the node is an error.
    pub fn parse(text: &str) -> Result<WktNode> {
        let (node, end) = Self::create_from(text, 0)?;
        let rest = skip_whitespace(text.as_bytes(), end);
        if rest < text.len() {
            return Err(Error::parse_at(
                format!("Unexpected content after end of WKT: '{}'", excerpt(text, rest)),
                rest,
            ));
        }
        Ok(node)
    }

    /// Tokenize one node starting at byte offset `start`.
    ///
    /// Returns the node and the offset just past its last character.
    pub fn create_from(text: &str, start: usize) -> Result<(WktNode, usize)> {
        if start > text.len() {
            return Err(Error::parse_at("Start offset past end of input", start));
        }
        if !text.is_char_boundary(start) {
            return Err(Error::parse_at("Start offset inside a character", start));
        }
        parse_node(text, start, 0)
    }
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'[' | b']' | b'(' | b')' | b',' | b'"') || b.is_ascii_whitespace()
}

fn excerpt(text: &str, pos: usize) -> String {
    text[pos..].chars().take(20).collect()
}

fn parse_node(text: &str, start: usize, level: usize) -> Result<(WktNode, usize)> {
    if level >= MAX_RECURSION_LEVEL {
        return Err(Error::parse_at(
            format!("Too many nesting levels (maximum is {})", MAX_RECURSION_LEVEL),
            start,
        ));
    }

    let bytes = text.as_bytes();
    let mut pos = skip_whitespace(bytes, start);

    if pos < bytes.len() && bytes[pos] == b'"' {
        return parse_quoted(text, pos);
    }

    let token_start = pos;
    while pos < bytes.len() && !is_delimiter(bytes[pos]) {
        pos += 1;
    }
    if pos == token_start {
        return Err(if pos >= bytes.len() {
            Error::parse_at("Unexpected end of input", pos)
        } else {
            Error::parse_at(
                format!("Empty keyword or value before '{}'", bytes[pos] as char),
                pos,
            )
        });
    }
    let mut node = WktNode::new(&text[token_start..pos]);

    let after_token = skip_whitespace(bytes, pos);
    let close = match bytes.get(after_token) {
        Some(b'[') => b']',
        Some(b'(') => b')',
        _ => return Ok((node, pos)),
    };
    pos = skip_whitespace(bytes, after_token + 1);

    if bytes.get(pos) == Some(&close) {
        return Ok((node, pos + 1));
    }

    loop {
        let (child, end) = parse_node(text, pos, level + 1)?;
        node.children.push(child);
        pos = skip_whitespace(bytes, end);
        match bytes.get(pos) {
            Some(b',') => pos += 1,
            Some(&b) if b == close => return Ok((node, pos + 1)),
            Some(b']') | Some(b')') => {
                return Err(Error::parse_at(
                    format!(
                        "Mismatched closing bracket '{}' in {}, expected '{}'",
                        bytes[pos] as char, node.value, close as char
                    ),
                    pos,
                ))
            }
            Some(_) => {
                return Err(Error::parse_at(
                    format!(
                        "Expected ',' or '{}' in {}, got '{}'",
                        close as char,
                        node.value,
                        excerpt(text, pos)
                    ),
                    pos,
                ))
            }
            None => {
                return Err(Error::parse_at(
                    format!("Missing closing '{}' for {}", close as char, node.value),
                    pos,
                ))
            }
        }
    }
}

fn parse_quoted(text: &str, open: usize) -> Result<(WktNode, usize)> {
    let bytes = text.as_bytes();
    let mut value = String::new();
    let mut pos = open + 1;
    let mut segment_start = pos;
    while pos < bytes.len() {
        if bytes[pos] == b'"' {
            value.push_str(&text[segment_start..pos]);
            if bytes.get(pos + 1) == Some(&b'"') {
                value.push('"');
                pos += 2;
                segment_start = pos;
                continue;
            }
            return Ok((WktNode::quoted(value), pos + 1));
        }
        pos += 1;
    }
    Err(Error::parse_at("Unterminated quoted string", open))
}

impl fmt::Display for WktNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.value.replace('"', "\"\""))?;
        } else {
            f.write_str(&self.value)?;
        }
        if !self.children.is_empty() {
            f.write_str("[")?;
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}", child)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_tree() {
        let node = WktNode::parse(r#"UNIT["degree",0.0174532925199433]"#).unwrap();
        assert_eq!(node.value(), "UNIT");
        assert_eq!(node.children().len(), 2);
        assert!(node.children()[0].is_quoted());
        assert_eq!(node.child_value(0), Some("degree"));
        assert_eq!(node.child_value(1), Some("0.0174532925199433"));
    }

    #[test]
    fn test_parentheses_and_whitespace() {
        let node = WktNode::parse("  AXIS ( \"Lat\" , NORTH )  ").unwrap();
        assert_eq!(node.value(), "AXIS");
        assert_eq!(node.child_value(1), Some("NORTH"));
        assert!(!node.children()[1].is_quoted());
    }

    #[test]
    fn test_doubled_quote_escape() {
        let node = WktNode::parse(r#"REMARK["say ""hi"""]"#).unwrap();
        assert_eq!(node.child_value(0), Some(r#"say "hi""#));
        assert_eq!(node.to_string(), r#"REMARK["say ""hi"""]"#);
    }

    #[test]
    fn test_look_for_child_case_insensitive() {
        let node = WktNode::parse(r#"GEOGCS["x",AXIS["a",NORTH],axis["b",EAST]]"#).unwrap();
        assert_eq!(node.count_children_of_name("AXIS"), 2);
        assert_eq!(
            node.look_for_child("AXIS", 1).and_then(|a| a.child_value(0)),
            Some("b")
        );
        assert!(node.look_for_child("AXIS", 2).is_none());
        assert!(node.look_for_child("x", 0).is_none(), "quoted values are not keywords");
    }

    #[test]
    fn test_unterminated_bracket() {
        let err = WktNode::parse(r#"GEOGCS["WGS 84",DATUM["WGS_1984""#).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = WktNode::parse(r#"GEOGCS["WGS 84]"#).unwrap_err();
        match err {
            Error::Parse { message, offset } => {
                assert!(message.contains("Unterminated"));
                assert_eq!(offset, Some(7));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_brackets() {
        assert!(WktNode::parse("A[B,C)").is_err());
        assert!(WktNode::parse("A[B,,C]").is_err());
        assert!(WktNode::parse("A[B] trailing").is_err());
        assert!(WktNode::parse("").is_err());
    }

    #[test]
    fn test_empty_brackets() {
        let node = WktNode::parse("EMPTY[]").unwrap();
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_depth_guard() {
        let ok = format!("{}x{}", "A[".repeat(MAX_RECURSION_LEVEL - 1), "]".repeat(MAX_RECURSION_LEVEL - 1));
        assert!(WktNode::parse(&ok).is_ok());

        let too_deep = format!("{}x{}", "A[".repeat(MAX_RECURSION_LEVEL), "]".repeat(MAX_RECURSION_LEVEL));
        let err = WktNode::parse(&too_deep).unwrap_err();
        assert!(err.to_string().contains("nesting"));
    }

    #[test]
    fn test_create_from_offset() {
        let text = r#"junk UNIT["metre",1] tail"#;
        let (node, end) = WktNode::create_from(text, 5).unwrap();
        assert_eq!(node.value(), "UNIT");
        assert_eq!(&text[end..], " tail");
    }

    #[test]
    fn test_create_from_offset_inside_character() {
        let err = WktNode::create_from("é[x]", 1).unwrap_err();
        assert!(matches!(err, Error::Parse { offset: Some(1), .. }), "{:?}", err);
        assert!(WktNode::create_from("é[x]", 5).is_err());
        let (node, _) = WktNode::create_from("é X[1]", 3).unwrap();
        assert_eq!(node.value(), "X");
    }

    #[test]
    fn test_display_is_structural_inverse() {
        let text = r#"PROJCS["x",GEOGCS["y",DATUM["z",SPHEROID["s",6378137,298.257223563]]],UNIT["metre",1]]"#;
        let node = WktNode::parse(text).unwrap();
        assert_eq!(node.to_string(), text);
    }

    #[test]
    fn test_utf8_in_quotes() {
        let node = WktNode::parse("DATUM[\"Réseau géodésique français 1993\"]").unwrap();
        assert_eq!(node.child_value(0), Some("Réseau géodésique français 1993"));
    }
}
