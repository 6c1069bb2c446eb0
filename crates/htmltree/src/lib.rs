//! Portable HTML document trees
//!
//! Snapshot a live DOM into an owned tree, write it back out as HTML or
//! W3C-shaped JSON, read that JSON back, and clean a DOM in place.
//!
//! ## Core Design
//!
//! ```text
//! HTML / CDP JSON → DomService → Document (arena, NodeId handles)
//!                                   │                    │
//!                              build_tree          normalize_dom
//!                                   ↓                    ↓
//!                      Node<'b> in TreeArena       cleaned Document
//!                        │              │                │
//!                 HtmlSerializer      json           HtmlSerializer
//! ```
//!
//! Everything runs synchronously on the caller's thread. A built tree
//! borrows its [`TreeArena`], never the [`Document`], so it can outlive
//! the DOM and cannot outlive its arena.

pub mod access;
pub mod arena;
pub mod error;
pub mod json;
pub mod normalize;
pub mod serializer;
pub mod service;
pub mod tags;
pub mod tree;
pub mod types;
pub mod utils;

pub use access::DomAccess;
pub use arena::Document;
pub use error::{DomError, Result};
pub use json::JsonOptions;
pub use normalize::{clean_html, normalize_children, normalize_dom, NormalizeOptions, NormalizeStats};
pub use serializer::{HtmlSerializer, RawTextPolicy, SerializerConfig};
pub use service::{DomService, DomServiceConfig};
pub use tree::{build_body, build_forest, build_tree, destroy_tree, Attr, Element, Node, TreeArena};
pub use types::*;
pub use utils::normalize_whitespace;

/// Render sibling tree nodes as HTML with the default serializer
pub fn tree_to_html(nodes: &[Node<'_>]) -> Result<String> {
    HtmlSerializer::new().render_forest(nodes)
}

/// Encode sibling tree nodes as a JSON array with escaping on
pub fn tree_to_json(nodes: &[Node<'_>]) -> Result<String> {
    json::encode_forest(nodes, &JsonOptions::default())
}

/// Decode a JSON array of nodes into `arena`
pub fn json_to_tree<'b>(arena: &'b TreeArena, json_text: &str) -> Result<&'b [Node<'b>]> {
    json::decode_forest(arena, json_text)
}
