//! The DOM accessor seam
//!
//! The tree builder, DOM serializer and normalizer only ever talk to a DOM
//! through this trait. [`Document`](crate::Document) is the in-crate
//! implementation; anything else that can hand out stable node handles
//! can plug in.
//!
//! Handles are plain copyable values. A handle to a destroyed node must
//! produce an error, never a fault.

use std::borrow::Cow;
use std::fmt::Debug;

use crate::error::Result;
use crate::types::{Attribute, NodeKind};

pub trait DomAccess {
    type Handle: Copy + Eq + Debug;

    fn node_kind(&self, node: Self::Handle) -> Result<NodeKind>;

    /// Tag name exactly as the DOM reports it (no re-casing)
    fn tag_name(&self, element: Self::Handle) -> Result<&str>;

    /// Attributes in insertion order, duplicates included
    fn attributes(&self, element: Self::Handle) -> Result<&[Attribute]>;

    /// Character data for text/comment nodes, concatenated descendant text
    /// for everything else
    fn text_content(&self, node: Self::Handle) -> Result<Cow<'_, str>>;

    fn first_child(&self, node: Self::Handle) -> Result<Option<Self::Handle>>;
    fn next_sibling(&self, node: Self::Handle) -> Result<Option<Self::Handle>>;
    fn parent(&self, node: Self::Handle) -> Result<Option<Self::Handle>>;

    /// True when the node has no element descendants and all of its
    /// descendant text is whitespace
    fn is_empty(&self, node: Self::Handle) -> Result<bool>;

    fn set_text_content(&mut self, node: Self::Handle, text: &str) -> Result<()>;
    fn remove_attribute(&mut self, element: Self::Handle, name: &str) -> Result<()>;
    fn set_attribute(&mut self, element: Self::Handle, name: &str, value: &str) -> Result<()>;

    /// Detach from the parent; the node itself stays valid
    fn remove_node(&mut self, node: Self::Handle) -> Result<()>;

    /// Detach and free the node with its whole subtree; handles go stale
    fn destroy_node(&mut self, node: Self::Handle) -> Result<()>;

    /// Child handles in sibling order
    fn children(&self, node: Self::Handle) -> Result<Vec<Self::Handle>> {
        let mut out = Vec::new();
        let mut cursor = self.first_child(node)?;
        while let Some(child) = cursor {
            out.push(child);
            cursor = self.next_sibling(child)?;
        }
        Ok(out)
    }
}
