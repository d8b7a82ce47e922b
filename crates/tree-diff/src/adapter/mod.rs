//! Adapters between already-parsed documents and the neutral [`Tree`].
//!
//! Parsing text formats is left to the caller; adapters start from a
//! `serde_json::Value`. Each source kind has its own module and the
//! closed [`Source`] union dispatches over them.
//!
//! Normalization (whitespace collapsing, attribute sorting, blank text
//! removal) happens here, before diffing, and only when asked for in
//! [`AdapterOptions`]. The core never normalizes.

pub mod json;
pub mod markup;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tree_diff_util::{collapse_whitespace, is_blank};

use crate::tree::{Attributes, NodeId, Tree};

/// Where a node came from, for serializers that map operations back onto
/// the source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ref", rename_all = "snake_case")]
pub enum SourceRef {
    /// RFC 6901 pointer into a JSON document.
    JsonPointer(String),
    /// XPath-like location in a markup document, e.g. `/html/body/p[2]`.
    MarkupPath(String),
    /// Opaque handle assigned by an external adapter.
    Handle(u64),
}

/// A parsed source document.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// Plain JSON data.
    Json(&'a Value),
    /// JsonML markup: `[tag, {attrs}?, ...children]`.
    JsonMl(&'a Value),
}

/// Build the neutral tree of `source`.
pub fn to_tree(source: Source<'_>, options: &AdapterOptions) -> Result<Tree, AdapterError> {
    match source {
        Source::Json(value) => Ok(json::from_value(value, options)),
        Source::JsonMl(value) => {
            let node = markup::parse(value)?;
            Ok(markup::to_tree(&node, options))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterOptions {
    /// Collapse whitespace runs in text to single spaces and trim.
    pub collapse_whitespace: bool,
    /// Sort attributes (markup) or object members (JSON) by key.
    pub sort_attributes: bool,
    /// Drop markup text nodes that are empty or whitespace only.
    pub drop_blank_text: bool,
}

impl AdapterOptions {
    /// All normalizations on.
    pub fn normalized() -> Self {
        Self { collapse_whitespace: true, sort_attributes: true, drop_blank_text: true }
    }

    /// Normalized text, or `None` when it should be dropped.
    pub(crate) fn text(&self, text: &str) -> Option<String> {
        if self.drop_blank_text && is_blank(text) {
            return None;
        }
        Some(if self.collapse_whitespace {
            collapse_whitespace(text)
        } else {
            text.to_owned()
        })
    }

    pub(crate) fn attributes<I>(&self, attrs: I) -> Attributes
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut out: Attributes = attrs.into_iter().collect();
        if self.sort_attributes {
            out.sort_keys();
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("expected a JsonML node at {path}, found {found}")]
    NotANode { path: String, found: &'static str },
    #[error("JsonML element at {path} has no string tag")]
    MissingTag { path: String },
    #[error("attribute {key:?} at {path} is not a scalar")]
    InvalidAttribute { path: String, key: String },
    #[error("node {node} has label {label:?}, which has no JSON form")]
    UnexpectedLabel { node: NodeId, label: String },
    #[error("node {node} holds {value:?}, which is not a valid {kind}")]
    InvalidScalar { node: NodeId, kind: String, value: String },
}

/// JSON type name, for error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_ref_serializes_tagged() {
        let r = SourceRef::JsonPointer("/a/0".into());
        assert_eq!(serde_json::to_value(&r).unwrap(), json!({"kind": "json_pointer", "ref": "/a/0"}));
        let back: SourceRef = serde_json::from_value(json!({"kind": "handle", "ref": 7})).unwrap();
        assert_eq!(back, SourceRef::Handle(7));
    }

    #[test]
    fn text_normalization() {
        let raw = AdapterOptions::default();
        assert_eq!(raw.text("  a \n b "), Some("  a \n b ".to_string()));
        assert_eq!(raw.text("   "), Some("   ".to_string()));

        let norm = AdapterOptions::normalized();
        assert_eq!(norm.text("  a \n b "), Some("a b".to_string()));
        assert_eq!(norm.text(" \t "), None);
    }

    #[test]
    fn attribute_sorting() {
        let attrs = vec![("z".to_string(), "1".to_string()), ("a".to_string(), "2".to_string())];
        let kept = AdapterOptions::default().attributes(attrs.clone());
        assert_eq!(kept.keys().collect::<Vec<_>>(), vec!["z", "a"]);
        let sorted = AdapterOptions::normalized().attributes(attrs);
        assert_eq!(sorted.keys().collect::<Vec<_>>(), vec!["a", "z"]);
    }

    #[test]
    fn dispatch_by_source_kind() {
        let data = json!({"a": 1});
        let tree = to_tree(Source::Json(&data), &AdapterOptions::default()).unwrap();
        assert_eq!(tree.label(tree.root()), "object");

        let markup = json!(["p", "hi"]);
        let tree = to_tree(Source::JsonMl(&markup), &AdapterOptions::default()).unwrap();
        assert_eq!(tree.label(tree.root()), "p");

        let bad = json!([1, "x"]);
        assert!(matches!(
            to_tree(Source::JsonMl(&bad), &AdapterOptions::default()),
            Err(AdapterError::MissingTag { .. })
        ));
    }
}
