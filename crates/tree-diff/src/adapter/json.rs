//! JSON data ⇄ neutral tree.
//!
//! - objects become `"object"` nodes, arrays `"array"` nodes;
//! - scalars become `"value"` leaves holding their textual form, with a
//!   `type` attribute (`null`, `boolean`, `number`, `string`);
//! - object members carry their key in a `key` attribute (first).
//!
//! Every node is tagged with the JSON Pointer of the value it came from.

use serde_json::{Map, Number, Value};
use tree_diff_util::collapse_whitespace;

use super::{type_name, AdapterError, AdapterOptions, SourceRef};
use crate::tree::{NodeData, NodeId, Tree};

pub const OBJECT: &str = "object";
pub const ARRAY: &str = "array";
pub const VALUE: &str = "value";
pub const KEY_ATTRIBUTE: &str = "key";
pub const TYPE_ATTRIBUTE: &str = "type";

/// Build the tree of a JSON document. `collapse_whitespace` applies to
/// string values, `sort_attributes` orders object members by key.
pub fn from_value(value: &Value, options: &AdapterOptions) -> Tree {
    let mut tree = Tree::new(node_data(value, None, String::new(), options));
    let root = tree.root();
    append_members(&mut tree, root, value, "", options);
    tree
}

fn node_data(value: &Value, key: Option<&str>, pointer: String, options: &AdapterOptions) -> NodeData {
    let mut data = match value {
        Value::Object(_) => NodeData::new(OBJECT),
        Value::Array(_) => NodeData::new(ARRAY),
        Value::Null => NodeData::new(VALUE),
        Value::Bool(b) => NodeData::new(VALUE).with_value(b.to_string()),
        Value::Number(n) => NodeData::new(VALUE).with_value(n.to_string()),
        Value::String(s) if options.collapse_whitespace => {
            NodeData::new(VALUE).with_value(collapse_whitespace(s))
        }
        Value::String(s) => NodeData::new(VALUE).with_value(s.as_str()),
    };
    if let Some(key) = key {
        data = data.with_attribute(KEY_ATTRIBUTE, key);
    }
    if !matches!(value, Value::Object(_) | Value::Array(_)) {
        data = data.with_attribute(TYPE_ATTRIBUTE, type_name(value));
    }
    data.with_source(SourceRef::JsonPointer(pointer))
}

fn append_members(tree: &mut Tree, parent: NodeId, value: &Value, pointer: &str, options: &AdapterOptions) {
    match value {
        Value::Object(map) => {
            let mut members: Vec<(&String, &Value)> = map.iter().collect();
            if options.sort_attributes {
                members.sort_by(|a, b| a.0.cmp(b.0));
            }
            for (key, child) in members {
                let path = format!("{pointer}/{}", escape_component(key));
                let id = tree.append(parent, node_data(child, Some(key), path.clone(), options));
                append_members(tree, id, child, &path, options);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let path = format!("{pointer}/{i}");
                let id = tree.append(parent, node_data(child, None, path.clone(), options));
                append_members(tree, id, child, &path, options);
            }
        }
        _ => {}
    }
}

/// Escapes a JSON Pointer path component.
fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Rebuild the JSON document of a tree produced by [`from_value`] (or by
/// hand with the same labels). Object members without a `key` attribute
/// are keyed by their position.
pub fn to_value(tree: &Tree) -> Result<Value, AdapterError> {
    node_value(tree, tree.root())
}

fn node_value(tree: &Tree, id: NodeId) -> Result<Value, AdapterError> {
    match tree.label(id) {
        OBJECT => {
            let mut map = Map::new();
            for (i, &child) in tree.children(id).iter().enumerate() {
                let key = match tree.attributes(child).get(KEY_ATTRIBUTE) {
                    Some(key) => key.clone(),
                    None => i.to_string(),
                };
                map.insert(key, node_value(tree, child)?);
            }
            Ok(Value::Object(map))
        }
        ARRAY => {
            let items = tree
                .children(id)
                .iter()
                .map(|&child| node_value(tree, child))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(items))
        }
        VALUE => scalar(tree, id),
        other => Err(AdapterError::UnexpectedLabel { node: id, label: other.to_owned() }),
    }
}

fn scalar(tree: &Tree, id: NodeId) -> Result<Value, AdapterError> {
    let kind = tree
        .attributes(id)
        .get(TYPE_ATTRIBUTE)
        .map(String::as_str)
        .unwrap_or("string");
    let Some(text) = tree.value(id) else {
        return Ok(Value::Null);
    };
    let invalid = || AdapterError::InvalidScalar {
        node: id,
        kind: kind.to_owned(),
        value: text.to_owned(),
    };
    match kind {
        "null" => Ok(Value::Null),
        "string" => Ok(Value::String(text.to_owned())),
        "boolean" => text.parse::<bool>().map(Value::Bool).map_err(|_| invalid()),
        "number" => serde_json::from_str::<Number>(text)
            .map(Value::Number)
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
