//! Markup (JsonML) ⇄ neutral tree, plus an HTML serializer.
//!
//! JsonML represents HTML/XML trees as nested JSON arrays:
//! `[tag, {attrs}?, ...children]`, where a child is either another array
//! or a string (text). Numbers and booleans in child position are taken as
//! text.
//!
//! In the neutral tree, elements keep their tag as label and text becomes a
//! `"text"` leaf.

use std::collections::HashMap;

use serde_json::Value;

use super::{type_name, AdapterError, AdapterOptions, SourceRef};
use crate::tree::{NodeData, NodeId, Tree};

/// Label of text leaves.
pub const TEXT: &str = "text";

// ── Types ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Text(String),
    Element(MarkupElement),
}

/// Attributes use an ordered `Vec<(key, value)>` to preserve document
/// order; values are pre-stringified.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupElement {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

impl MarkupNode {
    pub fn text(s: impl Into<String>) -> Self {
        MarkupNode::Text(s.into())
    }

    pub fn element(tag: impl Into<String>, attrs: Vec<(String, String)>, children: Vec<MarkupNode>) -> Self {
        MarkupNode::Element(MarkupElement { tag: tag.into(), attrs, children })
    }
}

// ── JsonML parsing ─────────────────────────────────────────────────────────

/// Parse a JsonML value.
pub fn parse(value: &Value) -> Result<MarkupNode, AdapterError> {
    parse_at(value, "")
}

fn parse_at(value: &Value, path: &str) -> Result<MarkupNode, AdapterError> {
    match value {
        Value::String(s) => Ok(MarkupNode::Text(s.clone())),
        Value::Number(n) => Ok(MarkupNode::Text(n.to_string())),
        Value::Bool(b) => Ok(MarkupNode::Text(b.to_string())),
        Value::Array(items) => {
            let Some(Value::String(tag)) = items.first() else {
                return Err(AdapterError::MissingTag { path: path.to_owned() });
            };
            let path = format!("{path}/{tag}");
            let mut attrs = Vec::new();
            let mut first_child = 1;
            if let Some(Value::Object(map)) = items.get(1) {
                for (key, v) in map {
                    let text = match v {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        _ => {
                            return Err(AdapterError::InvalidAttribute {
                                path: path.clone(),
                                key: key.clone(),
                            })
                        }
                    };
                    attrs.push((key.clone(), text));
                }
                first_child = 2;
            }
            let children = items[first_child..]
                .iter()
                .enumerate()
                .map(|(i, child)| parse_at(child, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MarkupNode::Element(MarkupElement { tag: tag.clone(), attrs, children }))
        }
        other => Err(AdapterError::NotANode { path: path.to_owned(), found: type_name(other) }),
    }
}

// ── Tree conversion ────────────────────────────────────────────────────────

/// Build the neutral tree of a markup document. Nodes are tagged with an
/// XPath-like [`SourceRef::MarkupPath`] (1-based per tag, `text()` for
/// text).
pub fn to_tree(node: &MarkupNode, options: &AdapterOptions) -> Tree {
    let (data, path) = match node {
        MarkupNode::Text(s) => {
            let value = options.text(s).unwrap_or_default();
            (NodeData::text(TEXT, value), "/text()".to_owned())
        }
        MarkupNode::Element(el) => (element_data(el, options), format!("/{}", el.tag)),
    };
    let mut tree = Tree::new(data.with_source(SourceRef::MarkupPath(path.clone())));
    if let MarkupNode::Element(el) = node {
        let root = tree.root();
        append_children(&mut tree, root, el, &path, options);
    }
    tree
}

fn element_data(el: &MarkupElement, options: &AdapterOptions) -> NodeData {
    NodeData::new(el.tag.as_str()).with_attributes(options.attributes(el.attrs.iter().cloned()))
}

fn append_children(tree: &mut Tree, parent: NodeId, el: &MarkupElement, path: &str, options: &AdapterOptions) {
    let mut counts: HashMap<String, usize> = HashMap::new();

    for child in &el.children {
        match child {
            MarkupNode::Text(s) => {
                let Some(value) = options.text(s) else { continue };
                let n = bump(&mut counts, "text()");
                let source = SourceRef::MarkupPath(format!("{path}/text()[{n}]"));
                tree.append(parent, NodeData::text(TEXT, value).with_source(source));
            }
            MarkupNode::Element(child_el) => {
                let n = bump(&mut counts, &child_el.tag);
                let child_path = format!("{path}/{}[{n}]", child_el.tag);
                let data = element_data(child_el, options)
                    .with_source(SourceRef::MarkupPath(child_path.clone()));
                let id = tree.append(parent, data);
                append_children(tree, id, child_el, &child_path, options);
            }
        }
    }
}

fn bump(counts: &mut HashMap<String, usize>, name: &str) -> usize {
    let count = counts.entry(name.to_owned()).or_insert(0);
    *count += 1;
    *count
}

/// Rebuild markup from the subtree at `id`. `"text"` leaves become text;
/// any other value-bearing node becomes an element wrapping its value.
pub fn from_tree(tree: &Tree, id: NodeId) -> MarkupNode {
    if tree.label(id) == TEXT && tree.is_leaf(id) {
        return MarkupNode::Text(tree.value(id).unwrap_or_default().to_owned());
    }
    let attrs = tree
        .attributes(id)
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let mut children: Vec<MarkupNode> = Vec::new();
    if let Some(value) = tree.value(id) {
        children.push(MarkupNode::Text(value.to_owned()));
    }
    children.extend(tree.children(id).iter().map(|&c| from_tree(tree, c)));
    MarkupNode::element(tree.label(id), attrs, children)
}

// ── HTML serializer ────────────────────────────────────────────────────────

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Serialize a [`MarkupNode`] to an HTML string.
///
/// - `tab`: indentation string (e.g. `"  "`); use `""` for compact output.
/// - `indent`: current indentation prefix (used in recursion).
pub fn to_html(node: &MarkupNode, tab: &str, indent: &str) -> String {
    match node {
        MarkupNode::Text(s) => format!("{}{}", indent, escape_text(s)),
        MarkupNode::Element(el) => element_to_html(el, tab, indent),
    }
}

fn element_to_html(el: &MarkupElement, tab: &str, indent: &str) -> String {
    let children_indent = format!("{}{}", indent, tab);
    let do_indent = !tab.is_empty();
    let text_only = el.children.iter().all(|c| matches!(c, MarkupNode::Text(_)));

    let mut children = String::new();
    for child in &el.children {
        match child {
            MarkupNode::Text(s) if text_only => children.push_str(&escape_text(s)),
            _ => {
                if do_indent {
                    children.push('\n');
                }
                children.push_str(&to_html(child, tab, &children_indent));
            }
        }
    }

    let mut head = format!("{}<{}", indent, el.tag);
    for (k, v) in &el.attrs {
        head.push_str(&format!(" {}=\"{}\"", k, escape_attr(v)));
    }
    if children.is_empty() {
        return format!("{} />", head);
    }
    let closing_indent = if do_indent && !text_only {
        format!("\n{}", indent)
    } else {
        String::new()
    };
    format!("{}>{}{}</{}>", head, children, closing_indent, el.tag)
}
