//! Portable document trees
//!
//! A built tree is a snapshot: every tag name, attribute and text run is
//! copied out of the DOM into a [`TreeArena`]. Nodes borrow the arena, not
//! the DOM, so the tree outlives the document it came from and can never be
//! read after the arena is destroyed.
//!
//! ```text
//! Document ──build_tree──▶ Node<'b> ──▶ HtmlSerializer / json
//!                              │
//!                        TreeArena (bump) ──destroy_tree──▶ freed in one go
//! ```

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;

use crate::access::DomAccess;
use crate::arena::Document;
use crate::error::Result;
use crate::types::{NodeKind, NodeType};

/// Region that owns every string and slice of one or more built trees
#[derive(Debug, Default)]
pub struct TreeArena {
    bump: Bump,
}

impl TreeArena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Bump::with_capacity(bytes),
        }
    }

    /// Bytes currently held by the region
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Drop every tree built in this arena and keep the memory for reuse
    pub fn reset(&mut self) {
        self.bump.reset();
    }

    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    pub fn text<'b>(&'b self, data: &str) -> Node<'b> {
        Node::Text(self.alloc_str(data))
    }

    pub fn comment<'b>(&'b self, text: &str) -> Node<'b> {
        Node::Comment {
            text: self.alloc_str(text),
        }
    }

    pub fn attr<'b>(&'b self, name: &str, value: &str) -> Attr<'b> {
        Attr {
            name: self.alloc_str(name),
            value: self.alloc_str(value),
        }
    }

    pub fn element<'b>(
        &'b self,
        tag: &str,
        attributes: impl IntoIterator<Item = Attr<'b>>,
        children: impl IntoIterator<Item = Node<'b>>,
    ) -> Node<'b> {
        Node::Element(Element {
            tag: self.alloc_str(tag),
            attributes: self.slice(attributes),
            children: self.slice(children),
        })
    }

    pub(crate) fn slice<'b, T: Copy>(&'b self, items: impl IntoIterator<Item = T>) -> &'b [T] {
        let mut out = BumpVec::new_in(&self.bump);
        out.extend(items);
        out.into_bump_slice()
    }

    pub(crate) fn vec<T>(&self) -> BumpVec<'_, T> {
        BumpVec::new_in(&self.bump)
    }
}

/// Release a tree arena and everything built in it
///
/// Exists for symmetry with [`build_tree`]; dropping the arena does the same.
pub fn destroy_tree(arena: TreeArena) {
    tracing::trace!(
        "[TreeArena] Releasing {} bytes",
        arena.allocated_bytes()
    );
    drop(arena);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr<'b> {
    pub name: &'b str,
    pub value: &'b str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element<'b> {
    /// Tag name as the DOM reported it; never re-cased
    pub tag: &'b str,
    pub attributes: &'b [Attr<'b>],
    pub children: &'b [Node<'b>],
}

/// One node of a portable tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node<'b> {
    Element(Element<'b>),
    Text(&'b str),
    Comment { text: &'b str },
}

impl<'b> Node<'b> {
    /// W3C `nodeType` code (1, 3 or 8)
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Element(_) => NodeType::Element,
            Node::Text(_) => NodeType::Text,
            Node::Comment { .. } => NodeType::Comment,
        }
    }

    pub fn as_element(&self) -> Option<&Element<'b>> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn children(&self) -> &'b [Node<'b>] {
        match self {
            Node::Element(element) => element.children,
            _ => &[],
        }
    }
}

/// Copy one DOM node and its subtree into the arena
///
/// Node kinds other than element, text and comment become an empty text
/// node. That is lossy on purpose; callers that need doctypes or
/// processing instructions must handle them before building.
pub fn build_tree<'b, D: DomAccess>(
    arena: &'b TreeArena,
    dom: &D,
    node: D::Handle,
) -> Result<Node<'b>> {
    match dom.node_kind(node)? {
        NodeKind::Element => {
            let tag = arena.alloc_str(dom.tag_name(node)?);
            let attributes =
                arena.slice(dom.attributes(node)?.iter().map(|a| arena.attr(&a.name, &a.value)));
            let children = build_forest(arena, dom, node)?;
            Ok(Node::Element(Element {
                tag,
                attributes,
                children,
            }))
        }
        NodeKind::Text => Ok(Node::Text(arena.alloc_str(&dom.text_content(node)?))),
        NodeKind::Comment => Ok(Node::Comment {
            text: arena.alloc_str(&dom.text_content(node)?),
        }),
        NodeKind::Other => {
            tracing::trace!("[TreeBuilder] Replacing {:?} with empty text", node);
            Ok(Node::Text(""))
        }
    }
}

/// Build every child of `parent`, in sibling order
pub fn build_forest<'b, D: DomAccess>(
    arena: &'b TreeArena,
    dom: &D,
    parent: D::Handle,
) -> Result<&'b [Node<'b>]> {
    let mut nodes = arena.vec();
    let mut cursor = dom.first_child(parent)?;
    while let Some(child) = cursor {
        nodes.push(build_tree(arena, dom, child)?);
        cursor = dom.next_sibling(child)?;
    }
    Ok(nodes.into_bump_slice())
}

/// Build the children of the document's `<body>`
pub fn build_body<'b>(arena: &'b TreeArena, document: &Document) -> Result<&'b [Node<'b>]> {
    let body = document.body()?;
    build_forest(arena, document, body)
}
