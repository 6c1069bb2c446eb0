//! W3C-shaped JSON interchange
//!
//! Wire shape, one object per node, keys in this order:
//!
//! ```json
//! {"nodeType":1,"tagName":"DIV","attributes":[{"name":"id","value":"x"}],"children":[...]}
//! {"nodeType":3,"data":"text"}
//! {"nodeType":8,"data":"comment"}
//! ```
//!
//! Decoding goes through a generic [`serde_json::Value`] first and then
//! validates the shape node by node, so every violation maps to its own
//! [`DomError`] variant.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DomError, Result};
use crate::tree::{Attr, Element, Node, TreeArena};
use crate::types::NodeType;

/// Encoder options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    /// JSON-escape `tagName`, `data`, `name` and `value` strings.
    ///
    /// With `false` strings are copied through byte-for-byte; any quote,
    /// backslash or control character then yields invalid JSON.
    pub escape_strings: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            escape_strings: true,
        }
    }
}

/// Encode one node and its subtree as a JSON object
pub fn encode_node(node: &Node<'_>, options: &JsonOptions) -> Result<String> {
    let mut out = String::with_capacity(256);
    write_node(&mut out, node, options)?;
    Ok(out)
}

/// Encode sibling nodes as a JSON array
pub fn encode_forest(nodes: &[Node<'_>], options: &JsonOptions) -> Result<String> {
    let mut out = String::with_capacity(256 * nodes.len().max(1));
    write_nodes(&mut out, nodes, options)?;
    Ok(out)
}

fn write_nodes(out: &mut String, nodes: &[Node<'_>], options: &JsonOptions) -> Result<()> {
    out.push('[');
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_node(out, node, options)?;
    }
    out.push(']');
    Ok(())
}

fn write_node(out: &mut String, node: &Node<'_>, options: &JsonOptions) -> Result<()> {
    out.push_str("{\"nodeType\":");
    out.push_str(&(node.node_type() as u8).to_string());
    match node {
        Node::Element(element) => {
            out.push_str(",\"tagName\":");
            write_string(out, element.tag, options)?;
            out.push_str(",\"attributes\":[");
            for (i, attr) in element.attributes.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str("{\"name\":");
                write_string(out, attr.name, options)?;
                out.push_str(",\"value\":");
                write_string(out, attr.value, options)?;
                out.push('}');
            }
            out.push_str("],\"children\":");
            write_nodes(out, element.children, options)?;
        }
        Node::Text(data) | Node::Comment { text: data } => {
            out.push_str(",\"data\":");
            write_string(out, data, options)?;
        }
    }
    out.push('}');
    Ok(())
}

fn write_string(out: &mut String, s: &str, options: &JsonOptions) -> Result<()> {
    if options.escape_strings {
        out.push_str(&serde_json::to_string(s)?);
    } else {
        out.push('"');
        out.push_str(s);
        out.push('"');
    }
    Ok(())
}

/// Deepest element nesting the decoder accepts, matching the loader default
pub const MAX_DECODE_DEPTH: usize = 512;

// Each tree level costs two JSON levels (node object + children array),
// plus the outer forest array and an attribute entry at the leaves.
const MAX_JSON_NESTING: usize = 2 * MAX_DECODE_DEPTH + 4;

/// Decode a single JSON node object into the arena
pub fn decode_node<'b>(arena: &'b TreeArena, json: &str) -> Result<Node<'b>> {
    let value = parse_value(json)?;
    node_from_value(arena, &value)
}

/// Decode a JSON array of nodes into the arena
pub fn decode_forest<'b>(arena: &'b TreeArena, json: &str) -> Result<&'b [Node<'b>]> {
    let value = parse_value(json)?;
    let items = value.as_array().ok_or(DomError::ExpectedArray)?;
    nodes_from_values(arena, items)
}

/// Parse without serde_json's fixed recursion limit of 128
///
/// The nesting is bounded up front instead, so trees as deep as the
/// loader accepts decode while hostile input cannot exhaust the stack.
fn parse_value(json: &str) -> Result<Value> {
    check_nesting(json, MAX_JSON_NESTING)?;

    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(value)
}

fn check_nesting(json: &str, max: usize) -> Result<()> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in json.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > max {
                    return Err(DomError::MaxDepthExceeded {
                        current: depth,
                        max,
                    });
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn nodes_from_values<'b>(arena: &'b TreeArena, items: &[Value]) -> Result<&'b [Node<'b>]> {
    let mut nodes = arena.vec();
    for item in items {
        nodes.push(node_from_value(arena, item)?);
    }
    Ok(nodes.into_bump_slice())
}

fn node_from_value<'b>(arena: &'b TreeArena, value: &Value) -> Result<Node<'b>> {
    let object = value.as_object().ok_or(DomError::ExpectedObject)?;
    let code = object
        .get("nodeType")
        .and_then(|v| v.as_i64().or_else(|| v.as_u64().map(|_| i64::MAX)))
        .ok_or(DomError::MissingNodeType)?;

    match u8::try_from(code).ok().and_then(NodeType::from_u8) {
        Some(NodeType::Element) => {
            let tag = str_field(object, "tagName", DomError::MissingTagName)?;
            let attributes = array_field(object, "attributes", DomError::MissingAttributes)?;
            let children = array_field(object, "children", DomError::MissingChildren)?;

            let mut attrs = arena.vec();
            for entry in attributes {
                let entry = entry.as_object().ok_or(DomError::MissingAttributeName)?;
                let name = str_field(entry, "name", DomError::MissingAttributeName)?;
                let value = str_field(entry, "value", DomError::MissingAttributeValue)?;
                attrs.push(arena.attr(name, value));
            }

            Ok(Node::Element(Element {
                tag: arena.alloc_str(tag),
                attributes: attrs.into_bump_slice(),
                children: nodes_from_values(arena, children)?,
            }))
        }
        Some(NodeType::Text) => Ok(arena.text(str_field(object, "data", DomError::MissingData)?)),
        Some(NodeType::Comment) => {
            Ok(arena.comment(str_field(object, "data", DomError::MissingData)?))
        }
        _ => Err(DomError::UnsupportedNodeType(code)),
    }
}

fn str_field<'v>(object: &'v Map<String, Value>, key: &str, missing: DomError) -> Result<&'v str> {
    object.get(key).and_then(Value::as_str).ok_or(missing)
}

fn array_field<'v>(
    object: &'v Map<String, Value>,
    key: &str,
    missing: DomError,
) -> Result<&'v [Value]> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or(missing)
}

impl Serialize for Node<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let code = self.node_type() as u8;
        match self {
            Node::Element(element) => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("nodeType", &code)?;
                map.serialize_entry("tagName", element.tag)?;
                map.serialize_entry("attributes", element.attributes)?;
                map.serialize_entry("children", element.children)?;
                map.end()
            }
            Node::Text(data) | Node::Comment { text: data } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("nodeType", &code)?;
                map.serialize_entry("data", data)?;
                map.end()
            }
        }
    }
}

impl Serialize for Attr<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("name", self.name)?;
        map.serialize_entry("value", self.value)?;
        map.end()
    }
}
