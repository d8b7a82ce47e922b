//! Node payload and arena handles.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::adapter::SourceRef;

/// Ordered attribute mapping. Equality ignores insertion order.
pub type Attributes = IndexMap<String, String>;

/// Handle of a node inside a [`Tree`](super::Tree) arena.
///
/// Handles are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Arena index of the node.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of a neutral tree node.
///
/// Structure (parent, children) lives in the arena; this is only what an
/// adapter knows about a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Role or name: element name, `"text"`, `"object"`, `"array"`, `"value"`.
    pub label: String,
    /// Scalar payload, absent for structural nodes.
    pub value: Option<String>,
    pub attributes: Attributes,
    /// Externally supplied stable identity. Opaque to the matcher.
    pub xid: Option<String>,
    /// Back-reference into the source document, for serializers.
    pub source: Option<SourceRef>,
}

impl NodeData {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: None,
            attributes: Attributes::new(),
            xid: None,
            source: None,
        }
    }

    /// Value-bearing node, e.g. a text leaf.
    pub fn text(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label).with_value(value)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in attributes {
            self.attributes.insert(k.into(), v.into());
        }
        self
    }

    pub fn with_xid(mut self, xid: impl Into<String>) -> Self {
        self.xid = Some(xid.into());
        self
    }

    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.source = Some(source);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_fill_fields() {
        let data = NodeData::new("a")
            .with_attribute("href", "x")
            .with_attributes([("rel", "nofollow")])
            .with_xid("n1");
        assert_eq!(data.label, "a");
        assert_eq!(data.value, None);
        assert_eq!(data.attributes.get("href").map(String::as_str), Some("x"));
        assert_eq!(data.attributes.len(), 2);
        assert_eq!(data.xid.as_deref(), Some("n1"));
    }

    #[test]
    fn attribute_equality_ignores_order() {
        let a = NodeData::new("p").with_attributes([("x", "1"), ("y", "2")]);
        let b = NodeData::new("p").with_attributes([("y", "2"), ("x", "1")]);
        assert_eq!(a, b);
    }

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId(7).to_string(), "#7");
        assert_eq!(NodeId(7).index(), 7);
    }
}
