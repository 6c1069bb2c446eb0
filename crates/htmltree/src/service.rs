//! DOM Service - loads documents into the arena
//!
//! Two sources:
//! - HTML text, parsed by html5ever into an `RcDom` and copied over
//! - CDP `DOM.getDocument` responses (JSON)
//!
//! Both loaders enforce `max_depth`. Nothing downstream limits recursion,
//! so this is where pathological nesting gets rejected.

use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::arena::Document;
use crate::error::{DomError, Result};
use crate::types::*;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Configuration for DOM service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DomServiceConfig {
    /// Leave `<!DOCTYPE>` nodes out of parsed documents
    pub drop_doctype: bool,
    /// Parse `<noscript>` as if scripting were enabled
    pub scripting_enabled: bool,
    /// Deepest allowed nesting, counted from the document node
    pub max_depth: usize,
}

impl Default for DomServiceConfig {
    fn default() -> Self {
        Self {
            drop_doctype: false,
            scripting_enabled: true,
            max_depth: 512,
        }
    }
}

/// Main DOM service
#[derive(Debug, Clone, Default)]
pub struct DomService {
    config: DomServiceConfig,
}

impl DomService {
    /// Create new DOM service with default config
    pub fn new() -> Self {
        Self::with_config(DomServiceConfig::default())
    }

    /// Create DOM service with custom config
    pub fn with_config(config: DomServiceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DomServiceConfig {
        &self.config
    }

    /// Parse an HTML document
    ///
    /// Fragments are fine: the HTML5 tree builder wraps them in the implied
    /// `<html>`, `<head>` and `<body>` elements.
    pub fn parse_html(&self, html: &str) -> Result<Document> {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                drop_doctype: self.config.drop_doctype,
                scripting_enabled: self.config.scripting_enabled,
                ..Default::default()
            },
            ..Default::default()
        };
        let dom = parse_document(RcDom::default(), opts).one(html);

        let mut document = Document::with_capacity(html.len() / 8 + 16);
        let root = self.import_rc_node(&mut document, &dom.document, None, 0)?;
        document.set_root(root)?;

        tracing::debug!(
            "[DomService] Parsed {} bytes of HTML into {} nodes",
            html.len(),
            document.node_count()
        );
        Ok(document)
    }

    fn import_rc_node(
        &self,
        document: &mut Document,
        handle: &Handle,
        parent_id: Option<NodeId>,
        depth: usize,
    ) -> Result<NodeId> {
        self.check_depth(depth)?;

        let node_id = match handle.data {
            NodeData::Document => document.create_document(),
            NodeData::Doctype { ref name, .. } => document.create_doctype(name),
            NodeData::Text { ref contents } => document.create_text(&contents.borrow()),
            NodeData::Comment { ref contents } => document.create_comment(contents),
            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                let tag_name = if &*name.ns == HTML_NAMESPACE {
                    str::to_ascii_uppercase(&name.local)
                } else {
                    name.local.to_string()
                };
                let element_id = document.create_element(&tag_name);
                let attributes = &mut document.get_mut(element_id)?.attributes;
                for attr in attrs.borrow().iter() {
                    let attr_name = match attr.name.prefix {
                        Some(ref prefix) => format!("{}:{}", prefix, attr.name.local),
                        None => attr.name.local.to_string(),
                    };
                    attributes.push(Attribute::new(attr_name, attr.value.to_string()));
                }
                element_id
            }
            NodeData::ProcessingInstruction { ref target, .. } => document.add_node(DomNode::new(
                0,
                NodeType::ProcessingInstruction,
                target.to_string(),
            )),
        };

        if let Some(parent_id) = parent_id {
            document.append_child(parent_id, node_id)?;
        }

        // <template> keeps its parsed content in a separate fragment
        let template_contents = match handle.data {
            NodeData::Element {
                ref template_contents,
                ..
            } => template_contents.borrow().clone(),
            _ => None,
        };
        let children = match template_contents {
            Some(fragment) => fragment.children.borrow().clone(),
            None => handle.children.borrow().clone(),
        };
        for child in &children {
            self.import_rc_node(document, child, Some(node_id), depth + 1)?;
        }

        Ok(node_id)
    }

    /// Parse CDP DOM tree response and build a document
    ///
    /// Input format matches CDP's DOM.getDocument response:
    /// ```json
    /// {
    ///   "root": {
    ///     "nodeId": 1,
    ///     "backendNodeId": 1,
    ///     "nodeType": 9,
    ///     "nodeName": "#document",
    ///     "children": [...]
    ///   }
    /// }
    /// ```
    pub fn parse_cdp_dom_tree(&self, cdp_response: &Value) -> Result<Document> {
        let root = cdp_response
            .get("root")
            .ok_or_else(|| DomError::CdpError("Missing 'root' in CDP response".to_string()))?;

        let mut document = Document::new();
        let root_id = self.parse_cdp_node(&mut document, root, None, 0)?;
        document.set_root(root_id)?;

        tracing::debug!(
            "[DomService] Loaded CDP tree with {} nodes",
            document.node_count()
        );
        Ok(document)
    }

    /// Recursively parse a CDP node
    fn parse_cdp_node(
        &self,
        document: &mut Document,
        cdp_node: &Value,
        parent_id: Option<NodeId>,
        depth: usize,
    ) -> Result<NodeId> {
        self.check_depth(depth)?;

        let backend_node_id = cdp_node["backendNodeId"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing backendNodeId".to_string()))?;
        let backend_node_id = u32::try_from(backend_node_id).map_err(|_| {
            DomError::CdpError(format!("backendNodeId out of range: {}", backend_node_id))
        })?;

        let node_type_val = cdp_node["nodeType"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing nodeType".to_string()))?;

        let node_type = u8::try_from(node_type_val)
            .ok()
            .and_then(NodeType::from_u8)
            .ok_or_else(|| DomError::InvalidNodeType {
                expected: "valid NodeType".to_string(),
                actual: format!("{}", node_type_val),
            })?;

        let node_name = cdp_node["nodeName"].as_str().unwrap_or("").to_string();

        let mut node = DomNode::new(0, node_type, node_name);
        node.backend_node_id = Some(backend_node_id);
        node.node_value = cdp_node["nodeValue"].as_str().unwrap_or("").to_string();

        // CDP flattens attributes: [name0, value0, name1, value1, ...]
        if let Some(attrs) = cdp_node["attributes"].as_array() {
            for pair in attrs.chunks_exact(2) {
                if let (Some(name), Some(value)) = (pair[0].as_str(), pair[1].as_str()) {
                    node.attributes.push(Attribute::new(name, value));
                }
            }
        }

        let node_id = document.add_node(node);
        if let Some(parent_id) = parent_id {
            document.append_child(parent_id, node_id)?;
        }

        if let Some(children) = cdp_node["children"].as_array() {
            for child in children {
                self.parse_cdp_node(document, child, Some(node_id), depth + 1)?;
            }
        }

        Ok(node_id)
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(DomError::MaxDepthExceeded {
                current: depth,
                max: self.config.max_depth,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DomAccess;

    #[test]
    fn test_parse_html_structure() {
        let doc = DomService::new()
            .parse_html("<!DOCTYPE html><title>t</title><p class=a>x</p>")
            .unwrap();

        let root = doc.root_id().unwrap();
        let top = doc.children(root).unwrap();
        assert_eq!(doc.get(top[0]).unwrap().node_type, NodeType::DocumentType);
        assert_eq!(doc.get(top[0]).unwrap().node_name, "html");

        let html = doc.document_element().unwrap();
        assert_eq!(doc.tag_name(html).unwrap(), "HTML");

        let body = doc.body().unwrap();
        let p = doc.first_child(body).unwrap().unwrap();
        assert_eq!(doc.tag_name(p).unwrap(), "P");
        assert_eq!(doc.attributes(p).unwrap(), &[Attribute::new("class", "a")]);
    }

    #[test]
    fn test_drop_doctype() {
        let service = DomService::with_config(DomServiceConfig {
            drop_doctype: true,
            ..Default::default()
        });
        let doc = service.parse_html("<!DOCTYPE html><p>x</p>").unwrap();
        let root = doc.root_id().unwrap();
        for child in doc.children(root).unwrap() {
            assert_ne!(doc.get(child).unwrap().node_type, NodeType::DocumentType);
        }
    }

    #[test]
    fn test_foreign_elements_keep_case() {
        let doc = DomService::new()
            .parse_html(r##"<svg viewBox="0 0 1 1"><foreignObject></foreignObject><use xlink:href="#a"/></svg>"##)
            .unwrap();
        let svg = doc.find_by_tag("svg").unwrap()[0];
        assert_eq!(doc.tag_name(svg).unwrap(), "svg");
        assert_eq!(doc.get(svg).unwrap().attr("viewBox"), Some("0 0 1 1"));

        let children = doc.children(svg).unwrap();
        assert_eq!(doc.tag_name(children[0]).unwrap(), "foreignObject");
        assert_eq!(doc.get(children[1]).unwrap().attr("xlink:href"), Some("#a"));
    }

    #[test]
    fn test_template_contents_are_children() {
        let doc = DomService::new()
            .parse_html("<template><b>in</b></template>")
            .unwrap();
        let template = doc.find_by_tag("template").unwrap()[0];
        let children = doc.children(template).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.tag_name(children[0]).unwrap(), "B");
    }

    #[test]
    fn test_max_depth() {
        let service = DomService::with_config(DomServiceConfig {
            max_depth: 8,
            ..Default::default()
        });
        let deep = "<div>".repeat(20);
        assert!(matches!(
            service.parse_html(&deep),
            Err(DomError::MaxDepthExceeded { max: 8, .. })
        ));
        assert!(service.parse_html("<div><p>ok</p></div>").is_ok());
    }

    #[test]
    fn test_parse_cdp_dom_tree() {
        let cdp_json = serde_json::json!({
            "root": {
                "nodeId": 1,
                "backendNodeId": 1,
                "nodeType": 9,
                "nodeName": "#document",
                "nodeValue": "",
                "children": [{
                    "nodeId": 2,
                    "backendNodeId": 2,
                    "nodeType": 1,
                    "nodeName": "HTML",
                    "nodeValue": "",
                    "attributes": ["lang", "en", "data-x", "1", "dangling"],
                    "children": [{
                        "nodeId": 3,
                        "backendNodeId": 3,
                        "nodeType": 3,
                        "nodeName": "#text",
                        "nodeValue": "Hello"
                    }]
                }]
            }
        });

        let doc = DomService::new().parse_cdp_dom_tree(&cdp_json).unwrap();
        assert_eq!(doc.node_count(), 3);

        let html = doc.get_by_backend_id(2).unwrap();
        assert_eq!(html.node_name, "HTML");
        assert_eq!(
            html.attributes.as_slice(),
            &[Attribute::new("lang", "en"), Attribute::new("data-x", "1")]
        );
        assert_eq!(doc.text_content(html.node_id).unwrap(), "Hello");
    }

    #[test]
    fn test_parse_cdp_missing_root() {
        let result = DomService::new().parse_cdp_dom_tree(&serde_json::json!({}));
        assert!(matches!(result, Err(DomError::CdpError(_))));
    }

    #[test]
    fn test_parse_cdp_bad_node_type() {
        let cdp_json = serde_json::json!({
            "root": {"backendNodeId": 1, "nodeType": 42, "nodeName": "?"}
        });
        assert!(matches!(
            DomService::new().parse_cdp_dom_tree(&cdp_json),
            Err(DomError::InvalidNodeType { .. })
        ));
    }

    #[test]
    fn test_parse_cdp_backend_id_out_of_range() {
        let cdp_json = serde_json::json!({
            "root": {"backendNodeId": 4_294_967_296u64, "nodeType": 9, "nodeName": "#document"}
        });
        assert!(matches!(
            DomService::new().parse_cdp_dom_tree(&cdp_json),
            Err(DomError::CdpError(_))
        ));
    }
}
