//! Instance locations and their string renderings.
//!
//! A location is the sequence of property names and array indices leading
//! from the instance root to the value under test. It renders in one of two
//! notations:
//!
//! - [`PathNotation::Legacy`]: `.name` for identifier-like keys, `['key']`
//!   otherwise, `[3]` for indices (e.g. `.items[0]['first name']`)
//! - [`PathNotation::JsonPointer`]: RFC 6901 tokens (e.g. `/items/0/first name`)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Keys that render as `.name` in legacy notation.
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid")
});

/// Notation used to render a location as a `dataPath` string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathNotation {
    /// JavaScript accessor style: `.foo[0]['bar baz']`
    #[default]
    Legacy,
    /// JSON Pointer: `/foo/0/bar baz`
    JsonPointer,
}

/// A segment in an instance path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

impl PathSegment {
    /// Append this segment to `out` in the given notation
    pub fn render_into(&self, out: &mut String, notation: PathNotation) {
        match (self, notation) {
            (PathSegment::Index(index), PathNotation::Legacy) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
            (PathSegment::Index(index), PathNotation::JsonPointer) => {
                out.push('/');
                out.push_str(&index.to_string());
            }
            (PathSegment::Key(key), PathNotation::Legacy) => {
                if IDENTIFIER.is_match(key) {
                    out.push('.');
                    out.push_str(key);
                } else {
                    out.push_str("['");
                    out.push_str(&escape_legacy_key(key));
                    out.push_str("']");
                }
            }
            (PathSegment::Key(key), PathNotation::JsonPointer) => {
                out.push('/');
                out.push_str(&escape_pointer_token(key));
            }
        }
    }

    /// The raw token for this segment (key text or decimal index)
    pub fn token(&self) -> Cow<'_, str> {
        match self {
            PathSegment::Key(key) => Cow::Borrowed(key),
            PathSegment::Index(index) => Cow::Owned(index.to_string()),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Instance path (e.g., ["users", 0, "email"])
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InstancePath {
    segments: Vec<PathSegment>,
}

impl InstancePath {
    /// Create a new empty instance path
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Push a key segment onto the path
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    /// Push an index segment onto the path
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Pop the last segment from the path
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    /// Get the segments as a slice
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Check if the path is empty
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the length of the path
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Render this path in the given notation
    pub fn render(&self, notation: PathNotation) -> String {
        render(&self.segments, notation)
    }
}

impl From<Vec<PathSegment>> for InstancePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.render(PathNotation::JsonPointer))
        }
    }
}

/// Render a sequence of segments in the given notation.
///
/// Segments are concatenated left to right with no separator beyond what
/// each segment contributes; an empty sequence renders as `""`.
pub fn render(segments: &[PathSegment], notation: PathNotation) -> String {
    let mut out = String::new();
    for segment in segments {
        segment.render_into(&mut out, notation);
    }
    out
}

/// Escape a key for the single-quoted legacy bracket form.
///
/// Backslash and single quote are backslash-escaped, as are newline,
/// carriage return and tab. Everything else is emitted verbatim.
pub fn escape_legacy_key(key: &str) -> Cow<'_, str> {
    if !key.contains(['\\', '\'', '\n', '\r', '\t']) {
        return Cow::Borrowed(key);
    }
    let mut escaped = String::with_capacity(key.len() + 2);
    for c in key.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Escape a JSON Pointer reference token (`~` → `~0`, `/` → `~1`)
pub fn escape_pointer_token(token: &str) -> Cow<'_, str> {
    if token.contains(['~', '/']) {
        Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Undo [`escape_pointer_token`]. Returns `None` for a `~` not followed by `0` or `1`.
pub fn unescape_pointer_token(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Split a JSON Pointer into unescaped reference tokens.
///
/// `""` is the whole document and yields no tokens. Any other pointer must
/// start with `/`.
pub fn parse_json_pointer(pointer: &str) -> Option<Vec<String>> {
    if pointer.is_empty() {
        return Some(Vec::new());
    }
    let rest = pointer.strip_prefix('/')?;
    rest.split('/').map(unescape_pointer_token).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: Vec<PathSegment>) -> InstancePath {
        InstancePath::from(segments)
    }

    fn key(k: &str) -> PathSegment {
        PathSegment::Key(k.to_string())
    }

    #[test]
    fn test_empty_path_renders_empty() {
        let p = InstancePath::new();
        assert_eq!(p.render(PathNotation::Legacy), "");
        assert_eq!(p.render(PathNotation::JsonPointer), "");
        assert_eq!(p.to_string(), "(root)");
    }

    #[test]
    fn test_legacy_identifier_keys() {
        let p = path(vec![key("foo"), key("_bar$1"), key("$ref")]);
        assert_eq!(p.render(PathNotation::Legacy), ".foo._bar$1.$ref");
    }

    #[test]
    fn test_legacy_bracket_keys() {
        let p = path(vec![key("1"), key("first name"), key("a-b"), key("")]);
        assert_eq!(
            p.render(PathNotation::Legacy),
            "['1']['first name']['a-b']['']"
        );
    }

    #[test]
    fn test_legacy_bracket_escaping() {
        let p = path(vec![key("it's"), key("back\\slash"), key("line\nbreak")]);
        assert_eq!(
            p.render(PathNotation::Legacy),
            r"['it\'s']['back\\slash']['line\nbreak']"
        );
    }

    #[test]
    fn test_indices() {
        let mut p = InstancePath::new();
        p.push_key("items");
        p.push_index(0);
        p.push_index(12);
        assert_eq!(p.render(PathNotation::Legacy), ".items[0][12]");
        assert_eq!(p.render(PathNotation::JsonPointer), "/items/0/12");
    }

    #[test]
    fn test_json_pointer_escaping() {
        let p = path(vec![key("a/b"), key("m~n"), key("~/"), key("plain")]);
        assert_eq!(p.render(PathNotation::JsonPointer), "/a~1b/m~0n/~0~1/plain");
    }

    #[test]
    fn test_push_pop_tracks_depth() {
        let mut p = InstancePath::new();
        p.push_key("a");
        p.push_index(1);
        assert_eq!(p.len(), 2);
        assert_eq!(p.pop(), Some(PathSegment::Index(1)));
        assert_eq!(p.pop(), Some(key("a")));
        assert!(p.is_empty());
        assert_eq!(p.pop(), None);
    }

    #[test]
    fn test_pointer_round_trip_matches_segments() {
        let p = path(vec![
            key("foo"),
            key("1"),
            key("a/b~c"),
            PathSegment::Index(3),
            key("it's"),
        ]);
        let tokens = parse_json_pointer(&p.render(PathNotation::JsonPointer)).unwrap();
        let expected: Vec<String> = p.segments().iter().map(|s| s.token().into_owned()).collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_parse_json_pointer() {
        assert_eq!(parse_json_pointer(""), Some(vec![]));
        assert_eq!(parse_json_pointer("/"), Some(vec![String::new()]));
        assert_eq!(
            parse_json_pointer("/definitions/a~1b"),
            Some(vec!["definitions".to_string(), "a/b".to_string()])
        );
        assert_eq!(parse_json_pointer("definitions"), None);
        assert_eq!(parse_json_pointer("/bad~2escape"), None);
        assert_eq!(parse_json_pointer("/trailing~"), None);
    }

    #[test]
    fn test_unescape_order() {
        // "~01" is "~1" literally, not "/"
        assert_eq!(unescape_pointer_token("~01").as_deref(), Some("~1"));
    }
}
