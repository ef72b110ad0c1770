//! Layer-tree builder - the identified elements as a nested listing.
//!
//! Elements without an id are transparent: their identified descendants
//! are listed in their place.

use crate::document::{Document, NodeId};
use crate::types::LayerNode;

fn collect(doc: &Document, parent: NodeId, depth: usize, out: &mut Vec<LayerNode>) {
    for child in doc.element_children(parent) {
        let Some(el) = doc.element(child) else {
            continue;
        };
        match el.id() {
            Some(id) => {
                let mut children = Vec::new();
                collect(doc, child, depth + 1, &mut children);
                out.push(LayerNode {
                    id: id.to_string(),
                    tag: el.local_name().to_string(),
                    depth,
                    has_children: !children.is_empty(),
                    children,
                });
            }
            None => collect(doc, child, depth, out),
        }
    }
}

/// Identified elements below the root, nested by identified ancestry.
/// Malformed input yields an empty list.
pub fn build_tree(svg: &str) -> Vec<LayerNode> {
    let doc = match Document::parse(svg) {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("build_tree: {err}");
            return Vec::new();
        }
    };
    let mut layers = Vec::new();
    if let Some(root) = doc.root() {
        collect(&doc, root, 0, &mut layers);
    }
    layers
}
