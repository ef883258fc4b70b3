//! Field paths addressing locations inside a JSON value
//!
//! One addressing scheme is used both for paths generated while the
//! comparator recurses and for paths supplied by expectation documents:
//!
//! - object keys are joined with `.`
//! - array positions are written as `[n]`
//! - keys that themselves contain `.`, `[` or `]` are quoted: `["meta.createdAt"]`
//!
//! `data.items[0].id` therefore parses to
//! `[Key("data"), Key("items"), Index(0), Key("id")]` and renders back to the
//! same string. Rendering always produces a string that parses back to the
//! same path, so a path printed in an error can be pasted into a document.
//! When resolving, a purely numeric key also indexes into an
//! array so that dot-only paths such as `items.0.id` keep working.

use std::fmt::{self, Write};
use std::iter::Peekable;
use std::str::Chars;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};

/// A single step in a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parsed dot/bracket path
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path, addressing the whole value
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Parse a path such as `accounts[2].balance.available` or
    /// `meta["created.at"]`
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let invalid = |reason: &str| ValidationError::InvalidPath {
            path: input.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        if input.is_empty() {
            return Ok(Self(segments));
        }

        let mut chars = input.chars().peekable();
        loop {
            let mut key = String::new();
            while let Some(&c) = chars.peek() {
                match c {
                    '.' | '[' => break,
                    ']' => return Err(invalid("unbalanced ']'")),
                    _ => {
                        key.push(c);
                        chars.next();
                    }
                }
            }

            if key.is_empty() && chars.peek() != Some(&'[') {
                return Err(invalid("empty segment"));
            }
            if !key.is_empty() {
                segments.push(PathSegment::Key(key));
            }

            while chars.peek() == Some(&'[') {
                chars.next();
                segments.push(parse_bracket(&mut chars).map_err(invalid)?);
            }

            match chars.next() {
                None => break,
                Some('.') => continue,
                Some(_) => return Err(invalid("unexpected characters after index")),
            }
        }

        Ok(Self(segments))
    }

    /// Path of an object member below this one
    pub fn child_key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    /// Path of an array element below this one
    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Look the path up in `value`; any missing step yields `None`
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.0
            .iter()
            .try_fold(value, |current, segment| match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key),
                (PathSegment::Key(key), Value::Array(items)) => {
                    key.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                (PathSegment::Index(i), Value::Array(items)) => items.get(*i),
                _ => None,
            })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if is_plain_key(key) => {
                    if i > 0 {
                        f.write_char('.')?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Key(key) => {
                    f.write_str("[\"")?;
                    for c in key.chars() {
                        if c == '"' || c == '\\' {
                            f.write_char('\\')?;
                        }
                        f.write_char(c)?;
                    }
                    f.write_str("\"]")?;
                }
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Keys that can be written bare between dots
fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(&['.', '[', ']'][..])
}

/// Body of a `[...]` segment, after the opening bracket: either an index or
/// a quoted key where `\"` and `\\` are the only escapes
fn parse_bracket(chars: &mut Peekable<Chars<'_>>) -> Result<PathSegment, &'static str> {
    if chars.peek() == Some(&'"') {
        chars.next();
        let mut key = String::new();
        loop {
            match chars.next() {
                Some('"') => break,
                Some('\\') => match chars.next() {
                    Some(c @ ('"' | '\\')) => key.push(c),
                    Some(_) => return Err("unknown escape in quoted key"),
                    None => return Err("unterminated quoted key"),
                },
                Some(c) => key.push(c),
                None => return Err("unterminated quoted key"),
            }
        }
        return match chars.next() {
            Some(']') => Ok(PathSegment::Key(key)),
            _ => Err("expected ']' after quoted key"),
        };
    }

    let mut digits = String::new();
    loop {
        match chars.next() {
            Some(']') => break,
            Some(c) => digits.push(c),
            None => return Err("unclosed '['"),
        }
    }
    digits
        .parse::<usize>()
        .map(PathSegment::Index)
        .map_err(|_| "array index must be a non-negative integer")
}

impl std::str::FromStr for FieldPath {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn test_parse_mixed_path() {
        let path = FieldPath::parse("data.items[0].id").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("data".into()),
                PathSegment::Key("items".into()),
                PathSegment::Index(0),
                PathSegment::Key("id".into()),
            ]
        );
    }

    #[test_case("accounts[2].balance.available" ; "nested index")]
    #[test_case("matrix[1][3]" ; "consecutive indices")]
    #[test_case("[0].id" ; "leading index")]
    #[test_case("status" ; "single key")]
    #[test_case("" ; "root")]
    #[test_case(r#"["meta.createdAt"]"# ; "dotted key at root")]
    #[test_case(r#"data["a[0]"].id"# ; "bracketed key mid path")]
    #[test_case(r#"rows[0]["x.y"][2]"# ; "quoted key between indices")]
    #[test_case(r#"["a.\"b\""]"# ; "escaped quote")]
    fn test_display_roundtrips(input: &str) {
        assert_eq!(FieldPath::parse(input).unwrap().to_string(), input);
    }

    #[test_case("a..b" ; "empty segment")]
    #[test_case("a[x]" ; "non numeric index")]
    #[test_case("a[1" ; "unclosed bracket")]
    #[test_case("a[1]b" ; "trailing garbage")]
    #[test_case("a]" ; "stray close")]
    #[test_case(r#"a["b"# ; "unterminated quoted key")]
    #[test_case(r#"a["b"x]"# ; "junk after quoted key")]
    #[test_case(r#"a["\n"]"# ; "unknown escape")]
    #[test_case("a." ; "trailing dot")]
    fn test_parse_rejects(input: &str) {
        let err = FieldPath::parse(input).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPath { .. }));
    }

    #[test]
    fn test_built_paths_match_parsed_paths() {
        let built = FieldPath::root()
            .child_key("data")
            .child_key("items")
            .child_index(0)
            .child_key("id");
        assert_eq!(built, FieldPath::parse("data.items[0].id").unwrap());
        assert_eq!(built.to_string(), "data.items[0].id");
    }

    #[test]
    fn test_keys_with_separators() {
        let built = FieldPath::root().child_key("meta.createdAt");
        assert_eq!(built.to_string(), r#"["meta.createdAt"]"#);
        assert_eq!(FieldPath::parse(&built.to_string()).unwrap(), built);

        // Unquoted, the same text is two nested keys
        let nested = FieldPath::parse("meta.createdAt").unwrap();
        assert_ne!(nested, built);

        let value = json!({"meta.createdAt": "2025-06-01", "meta": {"createdAt": "x"}});
        assert_eq!(built.resolve(&value), Some(&json!("2025-06-01")));
        assert_eq!(nested.resolve(&value), Some(&json!("x")));

        let empty = FieldPath::root().child_key("");
        assert_eq!(empty.to_string(), r#"[""]"#);
        assert_eq!(FieldPath::parse(r#"[""]"#).unwrap(), empty);
    }

    #[test]
    fn test_resolve() {
        let value = json!({
            "data": {"items": [{"id": "A1"}, {"id": "B2"}]},
            "count": 2
        });

        let bracket = FieldPath::parse("data.items[1].id").unwrap();
        assert_eq!(bracket.resolve(&value), Some(&json!("B2")));

        let dotted = FieldPath::parse("data.items.0.id").unwrap();
        assert_eq!(dotted.resolve(&value), Some(&json!("A1")));

        let missing = FieldPath::parse("data.items[5].id").unwrap();
        assert_eq!(missing.resolve(&value), None);

        let through_scalar = FieldPath::parse("count.value").unwrap();
        assert_eq!(through_scalar.resolve(&value), None);

        assert_eq!(FieldPath::root().resolve(&value), Some(&value));
    }

    #[test]
    fn test_serde_as_string() {
        let path: FieldPath = serde_json::from_value(json!("a.b[3]")).unwrap();
        assert_eq!(path.to_string(), "a.b[3]");
        assert_eq!(serde_json::to_value(&path).unwrap(), json!("a.b[3]"));
        assert!(serde_json::from_value::<FieldPath>(json!("a[")).is_err());
    }
}
