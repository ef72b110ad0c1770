//! Snippets - standalone copies of selected nodes, and their re-insertion.
//!
//! An extracted snippet carries the gradients, patterns and other resources
//! its nodes point at through `url(#id)` or `href="#id"`, so it renders on
//! its own.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::config::EditOptions;
use crate::document::{require, Document, Element, NodeId};
use crate::numeric::fmt_num;
use crate::structure::view_box;
use crate::transform::edit_transform;

lazy_static! {
    static ref RE_URL_ANYWHERE: Regex = Regex::new(r"url\(\s*#([^)\s]+)\s*\)").unwrap();
}

/// Result of [`inject_snippet`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Injected {
    pub svg: String,
    /// Id of the wrapping group, `None` when nothing was injected
    pub new_id: Option<String>,
}

/// Ids referenced from the attributes of one element.
fn references(el: &Element) -> Vec<String> {
    let mut out = Vec::new();
    for attr in el.attributes() {
        for caps in RE_URL_ANYWHERE.captures_iter(attr.value()) {
            out.push(caps[1].to_string());
        }
        let is_href = attr.name() == "href" || attr.name() == "xlink:href";
        if let Some(target) = attr.value().strip_prefix('#').filter(|_| is_href) {
            out.push(target.to_string());
        }
    }
    out
}

/// Resources the `roots` subtrees need that live outside them, in first-use
/// order and including resources needed by those resources.
fn external_resources(doc: &Document, roots: &[NodeId]) -> Vec<NodeId> {
    let inside: HashSet<NodeId> = roots
        .iter()
        .flat_map(|&root| doc.descendants(root))
        .collect();
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    let mut worklist: Vec<NodeId> = roots.to_vec();
    let mut cursor = 0;

    while cursor < worklist.len() {
        let subtree = worklist[cursor];
        cursor += 1;
        for node in doc.descendants(subtree) {
            let Some(el) = doc.element(node) else {
                continue;
            };
            for id in references(el) {
                if !seen.insert(id.clone()) {
                    continue;
                }
                match doc.find_by_id(&id) {
                    Some(target) if !inside.contains(&target) => {
                        found.push(target);
                        worklist.push(target);
                    }
                    Some(_) => {}
                    None => log::trace!("extract_snippet: dangling reference #{id}"),
                }
            }
        }
    }
    // A resource nested in another collected resource comes along with it.
    let collected: HashSet<NodeId> = found.iter().copied().collect();
    found
        .into_iter()
        .filter(|&node| {
            let mut parent = doc.parent(node);
            while let Some(p) = parent {
                if collected.contains(&p) {
                    return false;
                }
                parent = doc.parent(p);
            }
            true
        })
        .collect()
}

/// Copy the nodes named by `ids`, in the given order, into a new standalone
/// document. Missing ids are skipped; malformed input yields an empty
/// snippet.
pub fn extract_snippet(svg: &str, ids: &[&str], options: &EditOptions) -> String {
    let mut snippet = Document::new_svg(&options.snippet_view_box);
    let Some(snippet_root) = snippet.root() else {
        return snippet.serialize();
    };
    let source = match Document::parse(svg) {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("extract_snippet: {err}");
            return snippet.serialize();
        }
    };

    let nodes: Vec<NodeId> = ids
        .iter()
        .filter_map(|id| require(&source, id, "extract_snippet"))
        .collect();

    let resources = external_resources(&source, &nodes);
    // Copies keep prefixed names such as `xlink:href` or `svg:rect`, so the
    // prefixes they saw in the source are declared on the snippet root.
    for &node in resources.iter().chain(&nodes) {
        for (name, namespace) in source.prefix_declarations(node) {
            if let Some(el) = snippet.element_mut(snippet_root) {
                if el.attr(&name).is_none() {
                    el.set_attr(&name, &namespace);
                }
            }
        }
    }
    if !resources.is_empty() {
        let defs = snippet.create_element(Element::new("defs"));
        snippet.append_child(snippet_root, defs);
        for node in resources {
            let copy = snippet.import(&source, node);
            snippet.append_child(defs, copy);
        }
    }
    for node in nodes {
        let copy = snippet.import(&source, node);
        snippet.append_child(snippet_root, copy);
    }
    snippet.serialize()
}

/// First `<prefix>-<n>` id not used in the document, counting from 1.
fn next_asset_id(doc: &Document, prefix: &str) -> String {
    let ids = doc.ids();
    (1..)
        .map(|n| format!("{prefix}-{n}"))
        .find(|candidate| !ids.contains(candidate))
        .unwrap_or_else(|| prefix.to_string())
}

/// Copy the attributes of a `<g>` fragment root onto the wrapping group.
/// Its own transform is applied inside the placement translate.
fn adopt_group_attributes(
    doc: &mut Document,
    group: NodeId,
    source: &Element,
    tx: f64,
    ty: f64,
) {
    let Some(wrapper) = doc.element_mut(group) else {
        return;
    };
    for attr in source.attributes() {
        match attr.name() {
            "id" | "transform" => {}
            name if name.starts_with("xmlns") => {}
            name => wrapper.set_attr(name, attr.value()),
        }
    }
    let inner = source.attr("transform").map(str::trim).unwrap_or("");
    if !inner.is_empty() {
        let placed = format!("translate({}, {}) {inner}", fmt_num(tx), fmt_num(ty));
        wrapper.set_attr("transform", &placed);
    }
}

/// Insert a snippet on top of the document inside a new positioned group.
///
/// The group is translated to `(x, y)` when both are given, otherwise to
/// the viewBox center. A container root (`<svg>` or `<g>`) contributes its
/// children; any other root is wrapped as a whole. The presentation
/// attributes and transform of a `<g>` root move onto the new group, and
/// the `xmlns:*` prefixes the fragment root declares are declared on it
/// when the document does not already bind them the same way.
pub fn inject_snippet(
    svg: &str,
    fragment: &str,
    x: Option<f64>,
    y: Option<f64>,
    options: &EditOptions,
) -> Injected {
    let unchanged = || Injected {
        svg: svg.to_string(),
        new_id: None,
    };
    let mut doc = match Document::parse(svg) {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("inject_snippet: {err}");
            return unchanged();
        }
    };
    let piece = match Document::parse(fragment) {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("inject_snippet: fragment: {err}");
            return unchanged();
        }
    };
    let (Some(root), Some(piece_root)) = (doc.root(), piece.root()) else {
        return unchanged();
    };

    let (tx, ty) = match (x, y) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (x, y),
        _ => view_box(&doc, options).center(),
    };
    let new_id = next_asset_id(&doc, &options.asset_id_prefix);
    let name = doc.qualify("g");
    let group = doc.create_element(Element::new(name).with_attr("id", &new_id));
    edit_transform(&mut doc, group, |t| t.translate_by(tx, ty));

    let container = piece
        .element(piece_root)
        .filter(|el| el.is("svg") || el.is("g"));
    let unwrap_root = container.is_some();
    if let Some(source) = container.filter(|el| el.is("g")) {
        adopt_group_attributes(&mut doc, group, source, tx, ty);
    }
    if unwrap_root {
        let bound = doc.prefix_declarations(root);
        for (name, namespace) in piece.prefix_declarations(piece_root) {
            if bound.iter().any(|(n, ns)| *n == name && *ns == namespace) {
                continue;
            }
            if let Some(el) = doc.element_mut(group) {
                el.set_attr(&name, &namespace);
            }
        }
    }
    let contents: Vec<NodeId> = if unwrap_root {
        piece.children(piece_root).to_vec()
    } else {
        vec![piece_root]
    };
    for node in contents {
        let copy = doc.import(&piece, node);
        doc.append_child(group, copy);
    }
    doc.append_child(root, group);
    log::debug!("inject_snippet: added {new_id:?} at ({tx}, {ty})");

    Injected {
        svg: doc.serialize(),
        new_id: Some(new_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r##"<svg viewBox="0 0 100 50"><defs><linearGradient id="base"><stop offset="0" stop-color="#fff"/></linearGradient><linearGradient id="shine" href="#base"/><radialGradient id="unused"/></defs><rect id="a" fill="url(#shine)"/><g id="grp"><circle id="b" style="stroke: url( #base )"/></g></svg>"##;

    #[test]
    fn test_extract_keeps_requested_order() {
        let options = EditOptions::default();
        let out = extract_snippet(r#"<svg><rect id="a"/><circle id="b"/></svg>"#, &["b", "zz", "a"], &options);
        assert_eq!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 512 512"><circle id="b"/><rect id="a"/></svg>"#
        );
    }

    #[test]
    fn test_extract_copies_referenced_resources() {
        let options = EditOptions::default();
        let out = extract_snippet(SCENE, &["a"], &options);
        let defs_start = out.find("<defs>").unwrap();
        let rect = out.find(r#"<rect id="a""#).unwrap();
        assert!(defs_start < rect);
        assert!(out.contains(r#"id="shine""#));
        assert!(out.contains(r#"id="base""#));
        assert!(!out.contains("unused"));
    }

    #[test]
    fn test_extract_without_references_has_no_defs() {
        let options = EditOptions::default();
        let out = extract_snippet(SCENE, &["missing"], &options);
        assert_eq!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 512 512"/>"#
        );
    }

    #[test]
    fn test_reference_scan_reads_styles_and_hrefs() {
        let doc = Document::parse(SCENE).unwrap();
        let grp = doc.find_by_id("grp").unwrap();
        let found = external_resources(&doc, &[grp]);
        let ids: Vec<&str> = found
            .iter()
            .filter_map(|&n| doc.element(n).and_then(Element::id))
            .collect();
        assert_eq!(ids, ["base"]);
    }

    #[test]
    fn test_inject_unwraps_svg_root_at_center() {
        let options = EditOptions::default();
        let fragment = r#"<svg viewBox="0 0 512 512"><rect id="r"/><circle/></svg>"#;
        let result = inject_snippet(r#"<svg viewBox="0 0 100 50"><g id="asset-1"/></svg>"#, fragment, None, None, &options);
        assert_eq!(result.new_id.as_deref(), Some("asset-2"));
        assert!(result.svg.ends_with(
            r#"<g id="asset-2" transform="translate(50, 25)"><rect id="r"/><circle/></g></svg>"#
        ));
    }

    #[test]
    fn test_inject_wraps_plain_root_at_position() {
        let options = EditOptions::default();
        let result = inject_snippet("<svg></svg>", r#"<path d="M0 0"/>"#, Some(10.0), Some(-4.0), &options);
        assert_eq!(
            result.svg,
            r#"<svg><g id="asset-1" transform="translate(10, -4)"><path d="M0 0"/></g></svg>"#
        );
    }

    #[test]
    fn test_extract_declares_prefixes_in_scope() {
        let options = EditOptions::default();
        let svg = r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><g xmlns:svg="http://www.w3.org/2000/svg"><svg:rect id="s"/></g><use id="u" xlink:href="#s"/></svg>"##;
        assert_eq!(
            extract_snippet(svg, &["u"], &options),
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 512 512" xmlns:svg="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><defs><svg:rect id="s"/></defs><use id="u" xlink:href="#s"/></svg>"##
        );
    }

    #[test]
    fn test_inject_declares_missing_prefixes_on_group() {
        let options = EditOptions::default();
        let fragment = r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#a"/></svg>"##;
        let result = inject_snippet(r#"<svg><rect id="a"/></svg>"#, fragment, Some(0.0), Some(0.0), &options);
        assert_eq!(
            result.svg,
            r##"<svg><rect id="a"/><g id="asset-1" transform="translate(0, 0)" xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#a"/></g></svg>"##
        );

        let bound = r#"<svg xmlns:xlink="http://www.w3.org/1999/xlink"></svg>"#;
        let result = inject_snippet(bound, fragment, Some(0.0), Some(0.0), &options);
        assert!(result.svg.contains(r#"<g id="asset-1" transform="translate(0, 0)"><use"#));
    }

    #[test]
    fn test_inject_unwraps_group_root_onto_wrapper() {
        let options = EditOptions::default();
        let fragment = r#"<g id="inner" fill="red" transform="scale(2)"><rect/><circle/></g>"#;
        let result = inject_snippet("<svg></svg>", fragment, Some(1.0), Some(2.0), &options);
        assert_eq!(
            result.svg,
            r#"<svg><g id="asset-1" transform="translate(1, 2) scale(2)" fill="red"><rect/><circle/></g></svg>"#
        );

        let plain = r#"<g opacity="0.5"><rect/></g>"#;
        let result = inject_snippet("<svg></svg>", plain, Some(1.0), Some(2.0), &options);
        assert_eq!(
            result.svg,
            r#"<svg><g id="asset-1" transform="translate(1, 2)" opacity="0.5"><rect/></g></svg>"#
        );
    }

    #[test]
    fn test_inject_rejects_broken_fragment() {
        let options = EditOptions::default();
        let svg = r#"<svg><rect id="a"/></svg>"#;
        let result = inject_snippet(svg, "<g><rect></g>", None, None, &options);
        assert_eq!(result.svg, svg);
        assert_eq!(result.new_id, None);
    }
}
