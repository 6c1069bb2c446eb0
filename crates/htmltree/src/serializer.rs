//! HTML serializer
//!
//! Renders built trees, or a live DOM directly, back into HTML text:
//! - tag names are written exactly as stored, never re-cased
//! - attribute values are written raw, without escaping
//! - void elements with no children render as `<BR />`
//! - comments render verbatim as `<!--text-->`
//!
//! Text escaping under `<script>`/`<style>` is a policy choice, see
//! [`RawTextPolicy`].

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::access::DomAccess;
use crate::error::Result;
use crate::tags;
use crate::tree::Node;
use crate::types::{Attribute, NodeKind};

/// What to do with text whose parent is a raw-text element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawTextPolicy {
    /// Escape every text node, `<script>` bodies included
    #[default]
    Escape,
    /// Emit text under raw-text elements byte-for-byte
    Preserve,
}

/// Serializer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    pub raw_text: RawTextPolicy,
}

/// HTML serializer
#[derive(Debug, Clone, Default)]
pub struct HtmlSerializer {
    config: SerializerConfig,
}

impl HtmlSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Render a single node and its subtree
    pub fn render_node(&self, node: &Node<'_>) -> Result<String> {
        let mut output = String::with_capacity(256);
        self.write_node(node, &mut output)?;
        Ok(output)
    }

    /// Render a sequence of sibling nodes
    pub fn render_forest(&self, nodes: &[Node<'_>]) -> Result<String> {
        let mut output = String::with_capacity(256 * nodes.len().max(1));
        for node in nodes {
            self.write_node(node, &mut output)?;
        }
        Ok(output)
    }

    pub fn write_node<W: Write>(&self, node: &Node<'_>, out: &mut W) -> Result<()> {
        self.write_tree_node(node, None, out)
    }

    fn write_tree_node<W: Write>(
        &self,
        node: &Node<'_>,
        parent_tag: Option<&str>,
        out: &mut W,
    ) -> Result<()> {
        match node {
            Node::Element(element) => {
                out.write_char('<')?;
                out.write_str(element.tag)?;
                for attr in element.attributes {
                    write_attribute(out, attr.name, attr.value)?;
                }

                let void = tags::is_void(element.tag);
                if void && element.children.is_empty() {
                    out.write_str(" />")?;
                    return Ok(());
                }

                out.write_char('>')?;
                for child in element.children {
                    self.write_tree_node(child, Some(element.tag), out)?;
                }
                if !void {
                    write_close_tag(out, element.tag)?;
                }
            }
            Node::Text(data) => self.write_text(data, parent_tag, out)?,
            Node::Comment { text } => write_comment(out, text)?,
        }
        Ok(())
    }

    /// Serialize a live DOM node (outer HTML)
    ///
    /// Document-like nodes render their children; any other non-element,
    /// non-text, non-comment node renders nothing.
    pub fn render_dom<D: DomAccess>(&self, dom: &D, node: D::Handle) -> Result<String> {
        let mut output = String::with_capacity(1024);
        self.write_dom_node(dom, node, None, &mut output)?;
        Ok(output)
    }

    /// Serialize the children of a live DOM node (inner HTML)
    pub fn render_dom_children<D: DomAccess>(&self, dom: &D, node: D::Handle) -> Result<String> {
        let parent_tag = match dom.node_kind(node)? {
            NodeKind::Element => Some(dom.tag_name(node)?),
            _ => None,
        };
        let mut output = String::with_capacity(1024);
        let mut cursor = dom.first_child(node)?;
        while let Some(child) = cursor {
            self.write_dom_node(dom, child, parent_tag, &mut output)?;
            cursor = dom.next_sibling(child)?;
        }
        Ok(output)
    }

    fn write_dom_node<D: DomAccess, W: Write>(
        &self,
        dom: &D,
        node: D::Handle,
        parent_tag: Option<&str>,
        out: &mut W,
    ) -> Result<()> {
        match dom.node_kind(node)? {
            NodeKind::Element => {
                let tag = dom.tag_name(node)?;
                out.write_char('<')?;
                out.write_str(tag)?;
                for Attribute { name, value } in dom.attributes(node)? {
                    write_attribute(out, name, value)?;
                }

                let void = tags::is_void(tag);
                let first = dom.first_child(node)?;
                if void && first.is_none() {
                    out.write_str(" />")?;
                    return Ok(());
                }

                out.write_char('>')?;
                let mut cursor = first;
                while let Some(child) = cursor {
                    self.write_dom_node(dom, child, Some(tag), out)?;
                    cursor = dom.next_sibling(child)?;
                }
                if !void {
                    write_close_tag(out, tag)?;
                }
            }
            NodeKind::Text => self.write_text(&dom.text_content(node)?, parent_tag, out)?,
            NodeKind::Comment => write_comment(out, &dom.text_content(node)?)?,
            NodeKind::Other => {
                let mut cursor = dom.first_child(node)?;
                while let Some(child) = cursor {
                    self.write_dom_node(dom, child, None, out)?;
                    cursor = dom.next_sibling(child)?;
                }
            }
        }
        Ok(())
    }

    fn write_text<W: Write>(&self, data: &str, parent_tag: Option<&str>, out: &mut W) -> Result<()> {
        let raw = self.config.raw_text == RawTextPolicy::Preserve
            && parent_tag.is_some_and(tags::is_raw_text);
        if raw {
            out.write_str(data)?;
        } else {
            write_escaped(out, data)?;
        }
        Ok(())
    }
}

fn write_attribute<W: Write>(out: &mut W, name: &str, value: &str) -> std::fmt::Result {
    write!(out, " {}=\"{}\"", name, value)
}

fn write_close_tag<W: Write>(out: &mut W, tag: &str) -> std::fmt::Result {
    write!(out, "</{}>", tag)
}

fn write_comment<W: Write>(out: &mut W, text: &str) -> std::fmt::Result {
    write!(out, "<!--{}-->", text)
}

/// Escape `< > & " '` for text content
pub fn write_escaped<W: Write>(out: &mut W, text: &str) -> std::fmt::Result {
    let mut last = 0;
    for (i, c) in text.char_indices() {
        let entity = match c {
            '<' => "&lt;",
            '>' => "&gt;",
            '&' => "&amp;",
            '"' => "&quot;",
            '\'' => "&#39;",
            _ => continue,
        };
        out.write_str(&text[last..i])?;
        out.write_str(entity)?;
        last = i + c.len_utf8();
    }
    out.write_str(&text[last..])
}

/// Escape text into a new string
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String cannot fail
    let _ = write_escaped(&mut out, text);
    out
}
