use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::errors::{ExtractError, Result};

/// One dot-separated unit of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Case-sensitive key lookup in a mapping node.
    Field(String),
    /// `[]`: splice the elements of a sequence node into the working set.
    Flatten,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Flatten => f.write_str("[]"),
        }
    }
}

/// A parsed dotted path, e.g. `a.[].b.c`.
///
/// Parsing splits on `.` and cannot fail: the token `[]` is the flatten
/// marker, any other token (including an empty one) is a field name. There is
/// no escaping for a literal `.` or `[]` inside a field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocPath {
    raw: String,
    segments: Vec<Segment>,
}

impl DocPath {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('.')
            .map(|tok| {
                if tok == "[]" {
                    Segment::Flatten
                } else {
                    Segment::Field(tok.to_string())
                }
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    /// The path string as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Walk `doc` segment by segment and return the surviving nodes in
    /// encounter order.
    ///
    /// The working set starts as `[doc]`. Each segment is applied to every
    /// node in the set before the next segment is considered, so a `[]`
    /// segment fans out all sequence elements at that depth at once:
    /// `a.[].b.c` means "for every element of `a`, get `b.c`".
    ///
    /// A `[]` segment on a non-sequence node is always an error. A field
    /// lookup on a non-mapping node, or for a key that is missing or holds
    /// `null`, drops the node when `allow_empty` is true and errors
    /// otherwise. A null-valued key counts as absent.
    pub fn resolve<'a>(&self, doc: &'a Value, allow_empty: bool) -> Result<Vec<&'a Value>> {
        let mut nodes: Vec<&'a Value> = vec![doc];
        for seg in &self.segments {
            let mut next: Vec<&'a Value> = Vec::new();
            for &node in &nodes {
                match seg {
                    Segment::Flatten => match node {
                        Value::Array(items) => next.extend(items.iter()),
                        other => return Err(self.mismatch(seg, other)),
                    },
                    Segment::Field(name) => {
                        let found = match node {
                            Value::Object(map) => match map.get(name) {
                                Some(Value::Null) | None => None,
                                Some(v) => Some(v),
                            },
                            _ => None,
                        };
                        match found {
                            Some(v) => next.push(v),
                            None if allow_empty => continue,
                            None => return Err(self.mismatch(seg, node)),
                        }
                    }
                }
            }
            nodes = next;
        }
        tracing::trace!(path = %self.raw, matches = nodes.len(), "path resolved");
        Ok(nodes)
    }

    fn mismatch(&self, segment: &Segment, node: &Value) -> ExtractError {
        ExtractError::Resolution {
            path: self.raw.clone(),
            segment: segment.to_string(),
            node: node.clone(),
            source: None,
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DocPath {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Infallible> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for DocPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Serialize for DocPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for DocPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parse_splits_on_dots() {
        let path = DocPath::parse("a.[].b");
        assert_eq!(
            path.segments(),
            &[
                Segment::Field("a".into()),
                Segment::Flatten,
                Segment::Field("b".into()),
            ]
        );
        assert_eq!(path.as_str(), "a.[].b");
    }

    #[test]
    fn field_chain_resolves_single_node() {
        let doc = json!({"a": {"b": {"c": "d"}}});
        let path = DocPath::parse("a.b.c");
        let nodes = path.resolve(&doc, false).unwrap();
        assert_eq!(nodes, vec![&json!("d")]);
    }

    #[test]
    fn flatten_fans_out_per_element() {
        let doc = json!({"a": [{"b": 1}, {"b": 2}]});
        let nodes = DocPath::parse("a.[].b").resolve(&doc, false).unwrap();
        assert_eq!(nodes, vec![&json!(1), &json!(2)]);
    }

    #[test]
    fn field_into_sequence_is_an_error() {
        let doc = json!({"a": [{"b": 1}]});
        let err = DocPath::parse("a.b").resolve(&doc, false).unwrap_err();
        match err {
            ExtractError::Resolution { path, segment, node, .. } => {
                assert_eq!(path, "a.b");
                assert_eq!(segment, "b");
                assert_eq!(node, json!([{"b": 1}]));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn flatten_on_mapping_errors_even_with_allow_empty() {
        let doc = json!({"a": {"b": 1}});
        let err = DocPath::parse("a.[]").resolve(&doc, true).unwrap_err();
        assert!(matches!(err, ExtractError::Resolution { .. }));
    }

    #[test]
    fn allow_empty_skips_missing_and_null_fields() {
        let doc = json!({"a": [{"b": 1}, {"c": 2}, {"b": null}]});
        let nodes = DocPath::parse("a.[].b").resolve(&doc, true).unwrap();
        assert_eq!(nodes, vec![&json!(1)]);

        let err = DocPath::parse("a.[].b").resolve(&doc, false).unwrap_err();
        assert!(matches!(err, ExtractError::Resolution { .. }));
    }

    #[test]
    fn missing_root_field_with_allow_empty_is_empty() {
        let doc = json!({"a": 1});
        let nodes = DocPath::parse("z.y").resolve(&doc, true).unwrap();
        assert!(nodes.is_empty());
    }
}
