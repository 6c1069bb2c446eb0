//! In-place DOM normalization
//!
//! Walks a live subtree depth-first, parent before children:
//! - whitespace-only text is removed, other text is trimmed and collapsed
//! - attribute names and values are trimmed; pairs with an empty name go
//! - comments and empty attribute-less elements are destroyed on request
//!
//! Inside `pre`, `code`, `script`, `style` and `textarea` no text is
//! touched and no element is removed. Attributes are still cleaned there.
//!
//! The next sibling is read before a child is processed: processing may
//! destroy the child, after which its links are gone.

use serde::{Deserialize, Serialize};

use crate::access::DomAccess;
use crate::error::Result;
use crate::serializer::{HtmlSerializer, RawTextPolicy, SerializerConfig};
use crate::service::DomService;
use crate::tags;
use crate::types::{Attribute, NodeKind};
use crate::utils::{collapse_whitespace, is_whitespace_only};

/// Normalizer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub remove_comments: bool,
    pub remove_empty_elements: bool,
}

/// What a normalization pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub text_removed: usize,
    pub text_collapsed: usize,
    pub comments_removed: usize,
    pub elements_removed: usize,
    pub attributes_dropped: usize,
}

/// Normalize `root` and everything below it
///
/// `root` itself may be removed (an empty element or a comment).
pub fn normalize_dom<D: DomAccess>(
    dom: &mut D,
    root: D::Handle,
    options: &NormalizeOptions,
) -> Result<NormalizeStats> {
    let mut stats = NormalizeStats::default();
    let preserve = match dom.parent(root)? {
        Some(parent) => inside_preserving(dom, parent)?,
        None => false,
    };
    normalize_node(dom, root, options, preserve, &mut stats)?;
    log_stats(&stats);
    Ok(stats)
}

/// Normalize every child of `parent`, leaving `parent` itself alone
pub fn normalize_children<D: DomAccess>(
    dom: &mut D,
    parent: D::Handle,
    options: &NormalizeOptions,
) -> Result<NormalizeStats> {
    let mut stats = NormalizeStats::default();
    let preserve = inside_preserving(dom, parent)?;
    let mut child = dom.first_child(parent)?;
    while let Some(current) = child {
        child = dom.next_sibling(current)?;
        normalize_node(dom, current, options, preserve, &mut stats)?;
    }
    log_stats(&stats);
    Ok(stats)
}

/// Parse a document, normalize its body and render the body's children
///
/// Raw-text elements keep their content unescaped in the output.
pub fn clean_html(html: &str, options: &NormalizeOptions) -> Result<String> {
    let mut document = DomService::new().parse_html(html)?;
    let body = document.body()?;
    normalize_children(&mut document, body, options)?;

    HtmlSerializer::with_config(SerializerConfig {
        raw_text: RawTextPolicy::Preserve,
    })
    .render_dom_children(&document, body)
}

fn log_stats(stats: &NormalizeStats) {
    tracing::debug!(
        "[DomNormalizer] Done: {} text removed, {} text collapsed, {} comments removed, {} elements removed, {} attributes dropped",
        stats.text_removed,
        stats.text_collapsed,
        stats.comments_removed,
        stats.elements_removed,
        stats.attributes_dropped,
    );
}

fn inside_preserving<D: DomAccess>(dom: &D, start: D::Handle) -> Result<bool> {
    let mut cursor = Some(start);
    while let Some(node) = cursor {
        if dom.node_kind(node)? == NodeKind::Element
            && tags::is_whitespace_preserving(dom.tag_name(node)?)
        {
            return Ok(true);
        }
        cursor = dom.parent(node)?;
    }
    Ok(false)
}

fn normalize_node<D: DomAccess>(
    dom: &mut D,
    node: D::Handle,
    options: &NormalizeOptions,
    preserve: bool,
    stats: &mut NormalizeStats,
) -> Result<()> {
    let mut preserve_children = preserve;

    match dom.node_kind(node)? {
        NodeKind::Text => {
            if !preserve {
                normalize_text(dom, node, stats)?;
            }
            return Ok(());
        }
        NodeKind::Element => {
            clean_attributes(dom, node, stats)?;
            preserve_children = preserve || tags::is_whitespace_preserving(dom.tag_name(node)?);

            if options.remove_empty_elements
                && !preserve_children
                && dom.attributes(node)?.is_empty()
                && dom.is_empty(node)?
            {
                tracing::trace!("[DomNormalizer] Removing empty element {:?}", node);
                dom.destroy_node(node)?;
                stats.elements_removed += 1;
                return Ok(());
            }
        }
        NodeKind::Comment => {
            if options.remove_comments {
                dom.destroy_node(node)?;
                stats.comments_removed += 1;
                return Ok(());
            }
        }
        NodeKind::Other => {}
    }

    let mut child = dom.first_child(node)?;
    while let Some(current) = child {
        child = dom.next_sibling(current)?;
        normalize_node(dom, current, options, preserve_children, stats)?;
    }
    Ok(())
}

fn normalize_text<D: DomAccess>(
    dom: &mut D,
    node: D::Handle,
    stats: &mut NormalizeStats,
) -> Result<()> {
    let text = dom.text_content(node)?.into_owned();
    if is_whitespace_only(&text) {
        dom.destroy_node(node)?;
        stats.text_removed += 1;
        return Ok(());
    }

    let collapsed = collapse_whitespace(&text);
    if collapsed != text {
        dom.set_text_content(node, &collapsed)?;
        stats.text_collapsed += 1;
    }
    Ok(())
}

fn clean_attributes<D: DomAccess>(
    dom: &mut D,
    element: D::Handle,
    stats: &mut NormalizeStats,
) -> Result<()> {
    let original: Vec<Attribute> = dom.attributes(element)?.to_vec();
    if original.is_empty() {
        return Ok(());
    }

    for attr in &original {
        dom.remove_attribute(element, &attr.name)?;
    }

    for attr in &original {
        let name = attr.name.trim();
        if name.is_empty() {
            stats.attributes_dropped += 1;
            continue;
        }
        dom.set_attribute(element, name, attr.value.trim())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Document;
    use crate::types::NodeId;

    fn parse(html: &str) -> (Document, NodeId) {
        let doc = DomService::new().parse_html(html).unwrap();
        let body = doc.body().unwrap();
        (doc, body)
    }

    fn inner(doc: &Document, node: NodeId) -> String {
        HtmlSerializer::new().render_dom_children(doc, node).unwrap()
    }

    fn all() -> NormalizeOptions {
        NormalizeOptions {
            remove_comments: true,
            remove_empty_elements: true,
        }
    }

    #[test]
    fn test_whitespace_only_element_is_removed() {
        let (mut doc, body) = parse("<p>   </p>");
        let p = doc.find_by_tag("p").unwrap()[0];

        let stats = normalize_dom(&mut doc, body, &all()).unwrap();

        assert!(doc.get(p).is_err());
        assert_eq!(stats.elements_removed, 1);
        assert_eq!(inner(&doc, body), "");
    }

    #[test]
    fn test_empty_element_with_attributes_is_kept() {
        let (mut doc, body) = parse(r#"<div id="x">  </div><span></span>"#);
        normalize_dom(&mut doc, body, &all()).unwrap();
        assert_eq!(inner(&doc, body), r#"<DIV id="x"></DIV>"#);
    }

    #[test]
    fn test_empty_elements_kept_unless_asked() {
        let (mut doc, body) = parse("<p>   </p><!-- c -->");
        let stats = normalize_dom(&mut doc, body, &NormalizeOptions::default()).unwrap();
        assert_eq!(stats.text_removed, 1);
        assert_eq!(inner(&doc, body), "<P></P><!-- c -->");
    }

    #[test]
    fn test_pre_content_is_untouched() {
        let (mut doc, body) = parse("<pre>   preserve    this   </pre>");
        let pre = doc.find_by_tag("pre").unwrap()[0];
        let before = doc.text_content(pre).unwrap().into_owned();

        normalize_dom(&mut doc, body, &all()).unwrap();

        assert_eq!(doc.text_content(pre).unwrap(), before);
        assert_eq!(before, "   preserve    this   ");
    }

    #[test]
    fn test_preserving_context_is_inherited() {
        let (mut doc, body) = parse("<pre><b>  a   b  </b><i> </i></pre><textarea>  x  </textarea>");
        normalize_dom(&mut doc, body, &all()).unwrap();
        assert_eq!(
            inner(&doc, body),
            "<PRE><B>  a   b  </B><I> </I></PRE><TEXTAREA>  x  </TEXTAREA>"
        );
    }

    #[test]
    fn test_script_body_is_untouched() {
        let (mut doc, body) = parse("<p>x</p><script>\n  var a  =  1;\n</script>");
        let script = doc.find_by_tag("script").unwrap()[0];
        normalize_dom(&mut doc, body, &all()).unwrap();
        assert_eq!(doc.text_content(script).unwrap(), "\n  var a  =  1;\n");
    }

    #[test]
    fn test_text_is_collapsed() {
        let (mut doc, body) = parse("<div>\n  <p>  Hello \n\t world  </p>\n</div>");
        let before = doc.node_count();
        let stats = normalize_dom(&mut doc, body, &NormalizeOptions::default()).unwrap();
        assert_eq!(inner(&doc, body), "<DIV><P>Hello world</P></DIV>");
        assert_eq!(stats.text_collapsed, 1);
        assert_eq!(stats.text_removed, 2);
        assert_eq!(doc.node_count(), before - 2);
    }

    #[test]
    fn test_unchanged_text_is_not_rewritten() {
        let (mut doc, body) = parse("<p>tidy text</p>");
        let stats = normalize_dom(&mut doc, body, &all()).unwrap();
        assert_eq!(stats, NormalizeStats::default());
    }

    #[test]
    fn test_attribute_cleanup() {
        let mut doc = Document::new();
        let div = doc.create_element("DIV");
        let text = doc.create_text("x");
        doc.append_child(div, text).unwrap();
        doc.get_mut(div).unwrap().attributes.extend([
            Attribute::new("class", " container test "),
            Attribute::new("   ", "orphan"),
            Attribute::new(" id ", "main"),
        ]);

        let stats = normalize_dom(&mut doc, div, &all()).unwrap();

        assert_eq!(
            doc.attributes(div).unwrap(),
            &[
                Attribute::new("class", "container test"),
                Attribute::new("id", "main"),
            ]
        );
        assert_eq!(stats.attributes_dropped, 1);
        assert_eq!(
            HtmlSerializer::new().render_dom(&doc, div).unwrap(),
            r#"<DIV class="container test" id="main">x</DIV>"#
        );
    }

    #[test]
    fn test_comments_removed_on_request() {
        let (mut doc, body) = parse("<p>a<!-- one --></p><!-- two -->");
        let stats = normalize_dom(
            &mut doc,
            body,
            &NormalizeOptions {
                remove_comments: true,
                remove_empty_elements: false,
            },
        )
        .unwrap();
        assert_eq!(stats.comments_removed, 2);
        assert_eq!(inner(&doc, body), "<P>a</P>");
    }

    #[test]
    fn test_sibling_walk_survives_removals() {
        let (mut doc, body) =
            parse("<span></span><span> </span><b>keep</b><span></span><i>too</i>");
        let stats = normalize_dom(&mut doc, body, &all()).unwrap();
        assert_eq!(stats.elements_removed, 3);
        assert_eq!(inner(&doc, body), "<B>keep</B><I>too</I>");
    }

    #[test]
    fn test_parent_checked_before_children() {
        // The DIV still holds a SPAN when it is checked, so it survives
        let (mut doc, body) = parse("<div><span> </span></div><p>x</p>");
        normalize_dom(&mut doc, body, &all()).unwrap();
        assert_eq!(inner(&doc, body), "<DIV></DIV><P>x</P>");
    }

    #[test]
    fn test_empty_preserving_elements_are_kept() {
        let (mut doc, body) = parse("<pre>  </pre><textarea></textarea><p>x</p>");
        normalize_dom(&mut doc, body, &all()).unwrap();
        assert_eq!(inner(&doc, body), "<PRE>  </PRE><TEXTAREA></TEXTAREA><P>x</P>");
    }

    #[test]
    fn test_normalize_children_keeps_parent() {
        let (mut doc, body) = parse("<span></span>");
        let stats = normalize_children(&mut doc, body, &all()).unwrap();
        assert_eq!(stats.elements_removed, 1);
        assert!(doc.get(body).is_ok());
        assert_eq!(clean_html("<span> </span>", &all()).unwrap(), "");
    }

    #[test]
    fn test_normalizing_inside_pre_from_child_root() {
        let (mut doc, _) = parse("<pre><span>  a  </span></pre>");
        let span = doc.find_by_tag("span").unwrap()[0];
        normalize_dom(&mut doc, span, &all()).unwrap();
        assert_eq!(doc.text_content(span).unwrap(), "  a  ");
    }

    #[test]
    fn test_clean_html() {
        let html = "<html><body>\n  <div class=\" box \">\n    <p>  Hi   there </p>\n    <!-- drop -->\n    <span></span>\n    <script>if (a < b) { go(); }</script>\n  </div>\n</body></html>";
        let cleaned = clean_html(html, &all()).unwrap();
        assert_eq!(
            cleaned,
            r#"<DIV class="box"><P>Hi there</P><SCRIPT>if (a < b) { go(); }</SCRIPT></DIV>"#
        );
    }
}
