//! Document accessor - an arena-backed XML tree for SVG documents.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. A node
//! detached from the tree stays in the arena but is never reached by
//! traversal or serialization. Each engine call parses its own document,
//! mutates it and serializes it, so nothing outlives a single call.
//!
//! Untouched elements keep the exact text of their start tag, which is what
//! makes `serialize(parse(text)) == text` hold for well-formed input.

mod parse;
mod style;
mod write;

use std::collections::HashSet;

use crate::error::Result;

/// SVG namespace used for documents created from scratch.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Handle to a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The synthetic node that owns the prolog and the root element.
const DOCUMENT: NodeId = NodeId(0);

/// An attribute with its decoded value.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    value: String,
    /// Escaped source text of the value, kept until the value changes
    raw: Option<String>,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// An element: qualified name plus ordered attributes.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    /// Source text between `<` and `>` (or `/>`), dropped on first change
    raw_start: Option<String>,
    self_closing: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            raw_start: None,
            self_closing: true,
        }
    }

    /// Builder-style attribute setter for freshly created elements.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Qualified name as written in the source, e.g. `rect` or `svg:rect`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Case-insensitive comparison against a local tag name.
    pub fn is(&self, local: &str) -> bool {
        self.local_name().eq_ignore_ascii_case(local)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// The element's identifier; an empty `id` counts as none.
    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|v| !v.is_empty())
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// Set an attribute, appending it if absent. Setting the current value
    /// again leaves the element untouched.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) if attr.value == value => return,
            Some(attr) => {
                attr.value = value.to_string();
                attr.raw = None;
            }
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
                raw: None,
            }),
        }
        self.raw_start = None;
    }

    /// Remove an attribute. Returns whether it was present.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|a| a.name != name);
        let removed = self.attributes.len() != before;
        if removed {
            self.raw_start = None;
        }
        removed
    }

    /// Paint-like property value: the attribute wins, the inline style
    /// declaration is the fallback. Blank values count as absent.
    pub fn paint(&self, property: &str) -> Option<&str> {
        self.attr(property)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| self.style(property).filter(|v| !v.is_empty()))
    }

    /// Write a property to both the attribute and the inline style, so a
    /// stale style declaration cannot override the new attribute.
    pub fn set_paint(&mut self, property: &str, value: &str) {
        self.set_attr(property, value);
        self.set_style(property, value);
    }

    /// Gradient/pattern link target, from `href` or `xlink:href`.
    pub fn href(&self) -> Option<&str> {
        self.attr("href").or_else(|| self.attr("xlink:href"))
    }
}

/// What a node in the arena holds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(Element),
    /// Character data, stored escaped exactly as in the source
    Text(String),
    Comment(String),
    CData(String),
    /// Declaration, doctype or processing instruction, stored verbatim
    Markup(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed SVG document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    fn empty() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse document text. Malformed markup is an error; callers at the
    /// string boundary turn it into a no-op.
    pub fn parse(text: &str) -> Result<Self> {
        parse::parse(text)
    }

    /// A fresh `<svg>` document with the given viewBox and no content.
    pub fn new_svg(view_box: &str) -> Self {
        let mut doc = Self::empty();
        let root = doc.create_element(
            Element::new("svg")
                .with_attr("xmlns", SVG_NS)
                .with_attr("viewBox", view_box),
        );
        doc.append_child(DOCUMENT, root);
        doc
    }

    pub fn serialize(&self) -> String {
        write::serialize(self)
    }

    /// The outermost element.
    pub fn root(&self) -> Option<NodeId> {
        self.element_children(DOCUMENT).next()
    }

    /// Whether `node` is the outermost element.
    pub fn is_root(&self, node: NodeId) -> bool {
        self.parent(node) == Some(DOCUMENT)
    }

    /// `xmlns:*` declarations visible at `node`, nearest first, one per
    /// prefix. Values are the declaring attribute name and the namespace.
    pub fn prefix_declarations(&self, node: NodeId) -> Vec<(String, String)> {
        let mut found: Vec<(String, String)> = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(el) = self.element(n) {
                for attr in el.attributes().filter(|a| a.name().starts_with("xmlns:")) {
                    if !found.iter().any(|(name, _)| name == attr.name()) {
                        found.push((attr.name().to_string(), attr.value().to_string()));
                    }
                }
            }
            current = self.parent(n);
        }
        found
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node.0]
            .children
            .iter()
            .copied()
            .filter(|&child| self.element(child).is_some())
    }

    /// Pre-order list of `node` and every node below it.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Pre-order list of the elements in the attached tree.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(DOCUMENT)
            .into_iter()
            .filter(|&node| self.element(node).is_some())
            .collect()
    }

    /// First element in document order whose `id` equals `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.elements()
            .into_iter()
            .find(|&node| self.element(node).and_then(Element::id) == Some(id))
    }

    /// Every identifier currently used in the document.
    pub fn ids(&self) -> HashSet<String> {
        self.elements()
            .into_iter()
            .filter_map(|node| self.element(node).and_then(Element::id))
            .map(str::to_string)
            .collect()
    }

    /// Prefix the local name with the root element's namespace prefix, so
    /// new elements match documents written as `<svg:svg>`.
    pub fn qualify(&self, local: &str) -> String {
        let prefix = self
            .root()
            .and_then(|root| self.element(root))
            .and_then(|el| el.name().split_once(':'))
            .map(|(prefix, _)| prefix);
        match prefix {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        }
    }

    pub fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == node)?;
        siblings[..index]
            .iter()
            .rev()
            .copied()
            .find(|&c| self.element(c).is_some())
    }

    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == node)?;
        siblings[index + 1..]
            .iter()
            .copied()
            .find(|&c| self.element(c).is_some())
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Allocate a detached element.
    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeKind::Element(element))
    }

    /// Allocate a detached text node; `text` is escaped on the way in.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(quick_xml::escape::escape(text).into_owned()))
    }

    /// Unlink `node` from its parent. The subtree stays intact.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` at `index` among the children of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Move `node` so it directly precedes `reference`.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if reference == node {
            return;
        }
        self.detach(node);
        let Some(parent) = self.parent(reference) else {
            return;
        };
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == reference)
            .unwrap_or(0);
        self.insert_child(parent, index, node);
    }

    /// Move `node` so it directly follows `reference`.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if reference == node {
            return;
        }
        self.detach(node);
        let Some(parent) = self.parent(reference) else {
            return;
        };
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == reference)
            .map_or(0, |i| i + 1);
        self.insert_child(parent, index, node);
    }

    /// Copy `node` and its subtree into a new detached subtree.
    pub fn deep_clone(&mut self, node: NodeId) -> NodeId {
        let kind = self.kind(node).clone();
        let copy = self.push(kind);
        for child in self.children(node).to_vec() {
            let child_copy = self.deep_clone(child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    /// Copy a subtree out of `other` into this arena, detached.
    pub fn import(&mut self, other: &Document, node: NodeId) -> NodeId {
        let copy = self.push(other.kind(node).clone());
        for &child in other.children(node) {
            let child_copy = self.import(other, child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }
}

/// Run `edit` against a private parse of `svg`.
///
/// Returns the serialized result when `edit` reports a change and the input
/// itself otherwise, so a no-op is detectable by string equality.
pub(crate) fn edit_svg<F>(svg: &str, operation: &str, edit: F) -> String
where
    F: FnOnce(&mut Document) -> bool,
{
    let mut doc = match Document::parse(svg) {
        Ok(doc) => doc,
        Err(err) => {
            log::warn!("{operation}: {err}");
            return svg.to_string();
        }
    };
    if edit(&mut doc) {
        doc.serialize()
    } else {
        svg.to_string()
    }
}

/// Look up `id`, logging the miss.
pub(crate) fn require(doc: &Document, id: &str, operation: &str) -> Option<NodeId> {
    let found = doc.find_by_id(id);
    if found.is_none() {
        log::debug!("{operation}: no element with id {id:?}");
    }
    found
}
