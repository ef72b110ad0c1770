//! Structural editor - removal, duplication, z-order and background.
//!
//! Sibling order is paint order: later siblings paint on top. Reordering
//! only ever happens within one parent.

use std::collections::HashSet;

use crate::config::EditOptions;
use crate::document::{edit_svg, require, Document, Element, NodeId};
use crate::numeric::fmt_num;
use crate::transform::edit_transform;
use crate::types::{attr_number, ViewBox};

/// Look up `id` for an edit that needs a parent. The root element has
/// none worth editing, so it is not addressable here.
fn require_child(doc: &Document, id: &str, operation: &str) -> Option<NodeId> {
    let node = require(doc, id, operation)?;
    if doc.is_root(node) {
        log::debug!("{operation}: {id:?} is the root element");
        return None;
    }
    Some(node)
}

/// Remove the node `id` and its subtree. The root element stays.
pub fn remove_element(svg: &str, id: &str) -> String {
    edit_svg(svg, "remove_element", |doc| {
        let Some(node) = require_child(doc, id, "remove_element") else {
            return false;
        };
        doc.detach(node);
        true
    })
}

/// `base` if unused, otherwise `base_2`, `base_3`, ...
pub(crate) fn unique_id(ids: &HashSet<String>, base: &str) -> String {
    if !ids.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !ids.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Clone the node `id` right after itself, offset by the configured delta.
///
/// The copy gets `new_id` when given, otherwise `<id><copy suffix>` made
/// unique within the document. The root element cannot be duplicated.
pub fn duplicate_element(
    svg: &str,
    id: &str,
    new_id: Option<&str>,
    options: &EditOptions,
) -> String {
    edit_svg(svg, "duplicate_element", |doc| {
        let Some(node) = require_child(doc, id, "duplicate_element") else {
            return false;
        };
        let copy_id = match new_id {
            Some(new_id) => new_id.to_string(),
            None => unique_id(&doc.ids(), &format!("{id}{}", options.copy_id_suffix)),
        };
        let copy = doc.deep_clone(node);
        if let Some(el) = doc.element_mut(copy) {
            el.set_attr("id", &copy_id);
        }
        let [dx, dy] = options.duplicate_offset;
        edit_transform(doc, copy, |t| t.translate_by(dx, dy));
        doc.insert_after(node, copy);
        log::debug!("duplicate_element: {id:?} -> {copy_id:?}");
        true
    })
}

/// Swap the node with its previous element sibling (one step further back).
pub fn move_up(svg: &str, id: &str) -> String {
    edit_svg(svg, "move_up", |doc| {
        let Some(node) = require(doc, id, "move_up") else {
            return false;
        };
        match doc.previous_element_sibling(node) {
            Some(previous) => {
                doc.insert_before(previous, node);
                true
            }
            None => false,
        }
    })
}

/// Swap the node with its next element sibling (one step further forward).
pub fn move_down(svg: &str, id: &str) -> String {
    edit_svg(svg, "move_down", |doc| {
        let Some(node) = require(doc, id, "move_down") else {
            return false;
        };
        match doc.next_element_sibling(node) {
            Some(next) => {
                doc.insert_before(node, next);
                true
            }
            None => false,
        }
    })
}

/// Both nodes, when they exist, differ and share a parent.
fn same_parent_pair(
    doc: &Document,
    id: &str,
    target_id: &str,
    operation: &str,
) -> Option<(NodeId, NodeId)> {
    if id == target_id {
        return None;
    }
    let node = require(doc, id, operation)?;
    let target = require(doc, target_id, operation)?;
    let parent = doc.parent(node)?;
    if doc.parent(target) != Some(parent) {
        log::debug!("{operation}: {id:?} and {target_id:?} have different parents");
        return None;
    }
    Some((node, target))
}

/// Place the node directly before `target_id` within the same parent.
pub fn move_before(svg: &str, id: &str, target_id: &str) -> String {
    edit_svg(svg, "move_before", |doc| {
        let Some((node, target)) = same_parent_pair(doc, id, target_id, "move_before") else {
            return false;
        };
        doc.insert_before(target, node);
        true
    })
}

/// Place the node directly after `target_id` within the same parent.
pub fn move_after(svg: &str, id: &str, target_id: &str) -> String {
    edit_svg(svg, "move_after", |doc| {
        let Some((node, target)) = same_parent_pair(doc, id, target_id, "move_after") else {
            return false;
        };
        match doc.next_element_sibling(target) {
            Some(next) => doc.insert_before(next, node),
            None => {
                if let Some(parent) = doc.parent(target) {
                    doc.append_child(parent, node);
                }
            }
        }
        true
    })
}

pub(crate) fn view_box(doc: &Document, options: &EditOptions) -> ViewBox {
    let raw = doc
        .root()
        .and_then(|root| doc.element(root))
        .and_then(|el| el.attr("viewBox"));
    ViewBox::parse(raw, options.default_canvas)
}

/// First node carrying one of the configured background ids.
fn find_background_by_id(doc: &Document, options: &EditOptions) -> Option<NodeId> {
    options
        .background_ids
        .iter()
        .find_map(|id| doc.find_by_id(id))
}

/// A `rect` spanning the whole viewBox from the origin.
fn find_full_canvas_rect(doc: &Document, options: &EditOptions) -> Option<NodeId> {
    let root = doc.root()?;
    let vb = view_box(doc, options);
    doc.descendants(root).into_iter().find(|&node| {
        doc.element(node).is_some_and(|el| {
            el.is("rect")
                && attr_number(el.attr("x")) == Some(0.0)
                && attr_number(el.attr("y")) == Some(0.0)
                && attr_number(el.attr("width")) == Some(vb.width)
                && attr_number(el.attr("height")) == Some(vb.height)
        })
    })
}

/// The background node: by id first, then a full-canvas rectangle.
pub(crate) fn find_background(doc: &Document, options: &EditOptions) -> Option<NodeId> {
    find_background_by_id(doc, options).or_else(|| find_full_canvas_rect(doc, options))
}

/// Insert a full-canvas background rectangle beneath all content, unless
/// the document already has a background.
pub fn add_background(svg: &str, color: &str, options: &EditOptions) -> String {
    edit_svg(svg, "add_background", |doc| {
        if find_background(doc, options).is_some() {
            log::debug!("add_background: document already has a background");
            return false;
        }
        let Some(root) = doc.root() else {
            return false;
        };
        let vb = view_box(doc, options);
        let name = doc.qualify("rect");
        let rect = doc.create_element(
            Element::new(name)
                .with_attr("id", options.canonical_background_id())
                .with_attr("x", "0")
                .with_attr("y", "0")
                .with_attr("width", &fmt_num(vb.width))
                .with_attr("height", &fmt_num(vb.height))
                .with_attr("fill", color),
        );

        let defs = doc
            .element_children(root)
            .find(|&child| doc.element(child).is_some_and(|el| el.is("defs")));
        match defs {
            Some(defs) => doc.insert_after(defs, rect),
            None => doc.insert_child(root, 0, rect),
        }
        true
    })
}

/// Remove the background node, by id or as a full-canvas rectangle.
pub fn remove_background(svg: &str, options: &EditOptions) -> String {
    edit_svg(svg, "remove_background", |doc| {
        match find_background(doc, options) {
            Some(node) => {
                doc.detach(node);
                true
            }
            None => false,
        }
    })
}
