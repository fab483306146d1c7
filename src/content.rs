//! Content trees and key paths
//!
//! A `ContentNode` is the in-memory form of a localization resource: nested
//! objects and arrays whose leaves are strings. Object key order and array
//! positions are part of the value and survive every conversion in this crate.

use crate::mt::error::{MtError, MtResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// A node of a localization resource tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    /// Translatable string leaf
    Text(String),
    /// Non-string scalar (number, boolean, null); copied verbatim
    Literal(Value),
    /// Ordered sequence
    List(Vec<ContentNode>),
    /// Ordered mapping; insertion order is the document order
    Map(Vec<(String, ContentNode)>),
}

impl ContentNode {
    /// Parse a JSON document
    pub fn from_json_str(raw: &str) -> MtResult<Self> {
        serde_json::from_str(raw).map_err(|e| MtError::InvalidContent(e.to_string()))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, ContentNode::Map(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentNode::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Look up a direct child of a map by key
    pub fn get(&self, key: &str) -> Option<&ContentNode> {
        match self {
            ContentNode::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Keys of a map in document order; empty for every other variant
    pub fn keys(&self) -> Vec<&str> {
        match self {
            ContentNode::Map(entries) => entries.iter().map(|(k, _)| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Resolve a key path from this node
    pub fn get_path(&self, path: &KeyPath) -> Option<&ContentNode> {
        let mut node = self;
        for segment in path.segments() {
            node = match (segment, node) {
                (PathSegment::Key(key), ContentNode::Map(_)) => node.get(key)?,
                (PathSegment::Index(index), ContentNode::List(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Convert back into a `serde_json::Value`, keeping key order
    pub fn to_value(&self) -> Value {
        match self {
            ContentNode::Text(text) => Value::String(text.clone()),
            ContentNode::Literal(value) => value.clone(),
            ContentNode::List(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            ContentNode::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for ContentNode {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => ContentNode::Text(text),
            Value::Array(items) => ContentNode::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                ContentNode::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
            scalar => ContentNode::Literal(scalar),
        }
    }
}

impl From<&str> for ContentNode {
    fn from(value: &str) -> Self {
        ContentNode::Text(value.to_string())
    }
}

impl Serialize for ContentNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            ContentNode::Text(text) => serializer.serialize_str(text),
            ContentNode::Literal(value) => value.serialize(serializer),
            ContentNode::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ContentNode::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ContentNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ContentNode::from)
    }
}

/// Count every scalar leaf of a tree, strings and literals alike
///
/// This is the "keys" figure users see for a resource file; numbers, booleans
/// and nulls count even though they are never sent for translation.
pub fn count_keys(node: &ContentNode) -> usize {
    match node {
        ContentNode::Text(_) | ContentNode::Literal(_) => 1,
        ContentNode::List(items) => items.iter().map(count_keys).sum(),
        ContentNode::Map(entries) => entries.iter().map(|(_, v)| count_keys(v)).sum(),
    }
}

/// Count the translatable (string) leaves of a tree
///
/// Unlike [`count_keys`], literals are not counted.
pub fn count_translatable_leaves(node: &ContentNode) -> usize {
    match node {
        ContentNode::Text(_) => 1,
        ContentNode::Literal(_) => 0,
        ContentNode::List(items) => items.iter().map(count_translatable_leaves).sum(),
        ContentNode::Map(entries) => entries.iter().map(|(_, v)| count_translatable_leaves(v)).sum(),
    }
}

/// One step of a key path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Location of a node inside a content tree.
///
/// Displays as the dot-joined segment list (`config.api.endpoint`,
/// `items.0.label`), which is the form skip rules and reports use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath(Vec<PathSegment>);

impl KeyPath {
    pub fn root() -> Self {
        KeyPath(Vec::new())
    }

    pub fn child_key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        KeyPath(segments)
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        KeyPath(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Path without its last segment; the root's parent is the root
    pub fn parent(&self) -> KeyPath {
        let mut segments = self.0.clone();
        segments.pop();
        KeyPath(segments)
    }

    /// Last segment when it is an object key
    pub fn last_key(&self) -> Option<&str> {
        match self.0.last() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_preserves_key_order() {
        let node = ContentNode::from(json!({"zeta": "z", "alpha": "a", "mid": "m"}));
        assert_eq!(node.keys(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_non_string_scalars_become_literals() {
        let node = ContentNode::from(json!({"n": 3, "b": true, "x": null}));
        assert_eq!(node.get("n"), Some(&ContentNode::Literal(json!(3))));
        assert_eq!(node.get("b"), Some(&ContentNode::Literal(json!(true))));
        assert_eq!(node.get("x"), Some(&ContentNode::Literal(Value::Null)));
    }

    #[test]
    fn test_serialize_round_trip_keeps_order() {
        let source = r#"{"b":"Bee","a":["x",{"d":"Dee","c":"See"}],"n":1}"#;
        let node: ContentNode = serde_json::from_str(source).unwrap();
        assert_eq!(serde_json::to_string(&node).unwrap(), source);
    }

    #[test]
    fn test_get_path_through_lists() {
        let node = ContentNode::from(json!({"menu": [{"label": "Open"}, {"label": "Close"}]}));
        let path = KeyPath::root().child_key("menu").child_index(1).child_key("label");
        assert_eq!(node.get_path(&path).and_then(ContentNode::as_text), Some("Close"));
        assert!(node.get_path(&KeyPath::root().child_key("missing")).is_none());
    }

    #[test]
    fn test_key_path_display() {
        let path = KeyPath::root()
            .child_key("config")
            .child_key("api")
            .child_key("endpoint");
        assert_eq!(path.to_string(), "config.api.endpoint");
        assert_eq!(KeyPath::root().child_key("items").child_index(0).to_string(), "items.0");
        assert_eq!(KeyPath::root().to_string(), "");
    }

    #[test]
    fn test_key_path_parent_and_last_key() {
        let path = KeyPath::root().child_key("common").child_key("items_one");
        assert_eq!(path.last_key(), Some("items_one"));
        assert_eq!(path.parent(), KeyPath::root().child_key("common"));
        assert_eq!(KeyPath::root().parent(), KeyPath::root());
    }

    #[test]
    fn test_count_translatable_leaves() {
        let node = ContentNode::from(json!({
            "a": "x",
            "b": {"c": "y", "d": ["z", 4]},
            "e": false
        }));
        assert_eq!(count_translatable_leaves(&node), 3);
    }

    #[test]
    fn test_count_keys_includes_literals() {
        let node = ContentNode::from(json!({
            "a": "x",
            "b": {"c": "y", "d": ["z", 4], "empty": {}},
            "e": false,
            "f": null
        }));
        assert_eq!(count_keys(&node), 6);
        assert_eq!(count_keys(&ContentNode::from(json!({"a": 1, "b": 2, "c": 3}))), 3);
    }

    #[test]
    fn test_from_json_str() {
        let node = ContentNode::from_json_str(r#"{"b":"Bee","a":"Ay"}"#).unwrap();
        assert_eq!(node.keys(), vec!["b", "a"]);

        let err = ContentNode::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, MtError::InvalidContent(_)));
    }
}
