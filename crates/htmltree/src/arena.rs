//! Arena-based DOM storage
//!
//! This is the live, mutable DOM the tree builder reads from and the
//! normalizer edits in place.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<Option<DomNode>>
//!        [Node0][Node1][None][Node3]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```
//!
//! Destroyed nodes leave a `None` slot behind. Slots are never reused, so a
//! stale `NodeId` reports `NodeNotFound` instead of aliasing a new node.

use std::borrow::Cow;

use ahash::AHashMap;

use crate::access::DomAccess;
use crate::error::{DomError, Result};
use crate::types::{Attribute, Attributes, DomNode, NodeId, NodeKind, NodeType};
use crate::utils::is_whitespace_only;

/// Arena allocator for DOM nodes
///
/// Design:
/// - Single Vec for sequential allocation
/// - HashMap for backend_node_id → NodeId lookup (CDP uses backend IDs)
/// - No Rc/Arc: use indices everywhere
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<DomNode>>,

    /// Backend node ID → NodeId lookup (for CDP-loaded documents)
    backend_id_map: AHashMap<u32, NodeId>,

    /// The `#document` node (if set)
    root_id: Option<NodeId>,

    live: usize,
}

impl Document {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            backend_id_map: AHashMap::new(),
            root_id: None,
            live: 0,
        }
    }

    /// Add a node to the arena, returns its ID
    ///
    /// The node's `node_id` is overwritten with its slot index.
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        if let Some(backend_id) = node.backend_node_id {
            self.backend_id_map.insert(backend_id, node_id);
        }
        self.nodes.push(Some(node));
        self.live += 1;
        node_id
    }

    pub fn create_document(&mut self) -> NodeId {
        self.add_node(DomNode::new(0, NodeType::Document, "#document".to_string()))
    }

    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.add_node(DomNode::new(0, NodeType::DocumentType, name.to_string()))
    }

    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.add_node(DomNode::new(0, NodeType::Element, tag_name.to_string()))
    }

    pub fn create_text(&mut self, data: &str) -> NodeId {
        let mut node = DomNode::new(0, NodeType::Text, "#text".to_string());
        node.node_value = data.to_string();
        self.add_node(node)
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        let mut node = DomNode::new(0, NodeType::Comment, "#comment".to_string());
        node.node_value = data.to_string();
        self.add_node(node)
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .and_then(Option::as_ref)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .and_then(Option::as_mut)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by backend node ID (from CDP)
    pub fn get_by_backend_id(&self, backend_id: u32) -> Result<&DomNode> {
        let node_id = self
            .backend_id_map
            .get(&backend_id)
            .ok_or(DomError::NodeNotFound(backend_id))?;
        self.get(*node_id)
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Number of live (not destroyed) nodes
    pub fn node_count(&self) -> usize {
        self.live
    }

    /// The `<html>` element: first element child of the root
    pub fn document_element(&self) -> Result<NodeId> {
        let root = self.root_id.ok_or(DomError::NoRoot)?;
        let mut cursor = self.get(root)?.first_child;
        while let Some(id) = cursor {
            let node = self.get(id)?;
            if node.is_element() {
                return Ok(id);
            }
            cursor = node.next_sibling;
        }
        Err(DomError::NoRoot)
    }

    /// The `<body>` element of the document element
    pub fn body(&self) -> Result<NodeId> {
        let html = self.document_element().map_err(|_| DomError::NoBody)?;
        let mut cursor = self.get(html)?.first_child;
        while let Some(id) = cursor {
            let node = self.get(id)?;
            if node
                .tag_name()
                .is_some_and(|tag| tag.eq_ignore_ascii_case("body"))
            {
                return Ok(id);
            }
            cursor = node.next_sibling;
        }
        Err(DomError::NoBody)
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(DomError::HierarchyRequest { parent, child });
            }
            ancestor = self.get(id)?.parent_id;
        }

        self.detach(child)?;

        let prev = self.get(parent)?.last_child;
        {
            let node = self.get_mut(child)?;
            node.parent_id = Some(parent);
            node.prev_sibling = prev;
        }
        match prev {
            Some(prev_id) => self.get_mut(prev_id)?.next_sibling = Some(child),
            None => self.get_mut(parent)?.first_child = Some(child),
        }
        self.get_mut(parent)?.last_child = Some(child);
        Ok(())
    }

    /// Unlink a node from its parent and siblings
    pub fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let (parent, prev, next) = {
            let node = self.get(node_id)?;
            (node.parent_id, node.prev_sibling, node.next_sibling)
        };

        match prev {
            Some(prev_id) => self.get_mut(prev_id)?.next_sibling = next,
            None => {
                if let Some(parent_id) = parent {
                    self.get_mut(parent_id)?.first_child = next;
                }
            }
        }
        match next {
            Some(next_id) => self.get_mut(next_id)?.prev_sibling = prev,
            None => {
                if let Some(parent_id) = parent {
                    self.get_mut(parent_id)?.last_child = prev;
                }
            }
        }

        let node = self.get_mut(node_id)?;
        node.parent_id = None;
        node.prev_sibling = None;
        node.next_sibling = None;
        Ok(())
    }

    /// Detach a node and free it together with its subtree
    pub fn destroy(&mut self, node_id: NodeId) -> Result<()> {
        self.detach(node_id)?;

        let mut doomed = Vec::new();
        self.traverse_df(node_id, |node| {
            doomed.push((node.node_id, node.backend_node_id));
            Ok(())
        })?;

        for (id, backend_id) in doomed {
            if let Some(backend_id) = backend_id {
                self.backend_id_map.remove(&backend_id);
            }
            self.nodes[id as usize] = None;
            self.live -= 1;
        }
        if self.root_id == Some(node_id) {
            self.root_id = None;
        }
        Ok(())
    }

    /// Traverse a subtree depth-first in document order (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children last-to-first so they pop left-to-right
            let mut child = node.last_child;
            while let Some(child_id) = child {
                stack.push(child_id);
                child = self.get(child_id)?.prev_sibling;
            }
        }

        Ok(())
    }

    /// Find attached elements by tag name (case-insensitive), in document order
    pub fn find_by_tag(&self, tag: &str) -> Result<Vec<NodeId>> {
        let mut found = Vec::new();
        if let Some(root) = self.root_id {
            self.traverse_df(root, |node| {
                if node.tag_name().is_some_and(|t| t.eq_ignore_ascii_case(tag)) {
                    found.push(node.node_id);
                }
                Ok(())
            })?;
        }
        Ok(found)
    }

    fn element(&self, node_id: NodeId) -> Result<&DomNode> {
        let node = self.get(node_id)?;
        if node.is_element() {
            Ok(node)
        } else {
            Err(DomError::InvalidNodeType {
                expected: "element".to_string(),
                actual: format!("{:?}", node.node_type),
            })
        }
    }

    fn element_attributes_mut(&mut self, node_id: NodeId) -> Result<&mut Attributes> {
        self.element(node_id)?;
        Ok(&mut self.get_mut(node_id)?.attributes)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl DomAccess for Document {
    type Handle = NodeId;

    fn node_kind(&self, node: NodeId) -> Result<NodeKind> {
        Ok(self.get(node)?.node_type.kind())
    }

    fn tag_name(&self, element: NodeId) -> Result<&str> {
        Ok(self.element(element)?.node_name.as_str())
    }

    fn attributes(&self, element: NodeId) -> Result<&[Attribute]> {
        Ok(self.get(element)?.attributes.as_slice())
    }

    fn text_content(&self, node_id: NodeId) -> Result<Cow<'_, str>> {
        let node = self.get(node_id)?;
        match node.node_type {
            NodeType::Text | NodeType::Comment | NodeType::CdataSection => {
                Ok(Cow::Borrowed(node.node_value.as_str()))
            }
            _ => {
                let mut text = String::new();
                self.traverse_df(node_id, |n| {
                    if n.is_text() {
                        text.push_str(&n.node_value);
                    }
                    Ok(())
                })?;
                Ok(Cow::Owned(text))
            }
        }
    }

    fn first_child(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node)?.first_child)
    }

    fn next_sibling(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node)?.next_sibling)
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node)?.parent_id)
    }

    fn is_empty(&self, node_id: NodeId) -> Result<bool> {
        let mut empty = true;
        self.traverse_df(node_id, |node| {
            if node.node_id == node_id {
                return Ok(());
            }
            match node.node_type {
                NodeType::Element => empty = false,
                NodeType::Text if !is_whitespace_only(&node.node_value) => empty = false,
                _ => {}
            }
            Ok(())
        })?;
        Ok(empty)
    }

    fn set_text_content(&mut self, node_id: NodeId, text: &str) -> Result<()> {
        match self.get(node_id)?.node_type {
            NodeType::Text | NodeType::Comment | NodeType::CdataSection => {
                self.get_mut(node_id)?.node_value = text.to_string();
            }
            _ => {
                while let Some(child) = self.get(node_id)?.first_child {
                    self.destroy(child)?;
                }
                if !text.is_empty() {
                    let text_id = self.create_text(text);
                    self.append_child(node_id, text_id)?;
                }
            }
        }
        Ok(())
    }

    fn remove_attribute(&mut self, element: NodeId, name: &str) -> Result<()> {
        let attributes = self.element_attributes_mut(element)?;
        if let Some(pos) = attributes.iter().position(|a| a.name == name) {
            attributes.remove(pos);
        }
        Ok(())
    }

    fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> Result<()> {
        let attributes = self.element_attributes_mut(element)?;
        match attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value.to_string(),
            None => attributes.push(Attribute::new(name, value)),
        }
        Ok(())
    }

    fn remove_node(&mut self, node: NodeId) -> Result<()> {
        self.detach(node)
    }

    fn destroy_node(&mut self, node: NodeId) -> Result<()> {
        self.destroy(node)
    }
}
