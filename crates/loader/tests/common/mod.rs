#![allow(dead_code)]

use fluentree_dom::{Document, NodeId, NodeKind};

/// Compact markup rendering of `node` for assertions. Namespace declarations
/// are left out; attributes use their qualified names.
pub fn outline(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    render(doc, node, &mut out);
    out
}

/// Renders every child of `node` in order.
pub fn outline_children(doc: &Document, node: NodeId) -> String {
    doc.children(node).iter().map(|&child| outline(doc, child)).collect()
}

fn render(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        NodeKind::Element => {
            let name = doc.node_name(node);
            out.push('<');
            out.push_str(&name);
            for &attr in doc.attributes(node) {
                out.push_str(&format!(" {}=\"{}\"", doc.node_name(attr), doc.value(attr)));
            }
            if doc.children(node).is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in doc.children(node) {
                render(doc, child, out);
            }
            out.push_str(&format!("</{name}>"));
        }
        NodeKind::Text => out.push_str(doc.value(node)),
        _ => {
            for &child in doc.children(node) {
                render(doc, child, out);
            }
        }
    }
}
