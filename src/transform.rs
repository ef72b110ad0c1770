//! Transform engine - structured edits of the `transform` attribute.
//!
//! A transform list is decomposed into its function calls, one component is
//! changed and the list is written back. Translate accumulates deltas and is
//! kept as the leading function; scale and rotate are absolute and appear at
//! most once each.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::document::{edit_svg, require, Document, NodeId};
use crate::numeric::{fmt_num, parse_number};

lazy_static! {
    static ref RE_TRANSFORM_FN: Regex = Regex::new(r"([A-Za-z]+)\s*\(([^)]*)\)").unwrap();
    static ref RE_ARG_SEPARATOR: Regex = Regex::new(r"[\s,]+").unwrap();
}

/// One function call in a transform list, e.g. `rotate(45)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformFn {
    pub name: String,
    /// Argument text as written, without the parentheses
    pub args: String,
}

impl TransformFn {
    fn new(name: &str, args: String) -> Self {
        Self {
            name: name.to_string(),
            args,
        }
    }

    fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Numeric arguments; unparseable ones read as 0.
    pub fn numbers(&self) -> Vec<f64> {
        RE_ARG_SEPARATOR
            .split(self.args.trim())
            .filter(|a| !a.is_empty())
            .map(|a| parse_number(a).unwrap_or(0.0))
            .collect()
    }
}

/// An ordered transform list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transform {
    functions: Vec<TransformFn>,
}

impl Transform {
    pub fn parse(raw: &str) -> Self {
        let functions = RE_TRANSFORM_FN
            .captures_iter(raw)
            .map(|caps| TransformFn::new(&caps[1], caps[2].trim().to_string()))
            .collect();
        Self { functions }
    }

    pub fn functions(&self) -> &[TransformFn] {
        &self.functions
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Current translation, `(0, 0)` when there is none.
    pub fn translation(&self) -> (f64, f64) {
        self.functions
            .iter()
            .find(|f| f.is("translate"))
            .map(|f| {
                let n = f.numbers();
                (
                    n.first().copied().unwrap_or(0.0),
                    n.get(1).copied().unwrap_or(0.0),
                )
            })
            .unwrap_or((0.0, 0.0))
    }

    /// Add a delta to the translation and move it to the front. Other
    /// functions keep their order.
    pub fn translate_by(&mut self, dx: f64, dy: f64) {
        let (x, y) = self.translation();
        if let Some(index) = self.functions.iter().position(|f| f.is("translate")) {
            self.functions.remove(index);
        }
        let args = format!("{}, {}", fmt_num(x + dx), fmt_num(y + dy));
        self.functions.insert(0, TransformFn::new("translate", args));
    }

    /// Replace the first `name(...)` in place (dropping any later ones) or
    /// append it.
    fn set_absolute(&mut self, name: &str, value: f64) {
        let args = fmt_num(value);
        match self.functions.iter().position(|f| f.is(name)) {
            Some(index) => {
                self.functions[index] = TransformFn::new(name, args);
                let mut seen = 0;
                self.functions.retain(|f| {
                    if f.is(name) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.functions.push(TransformFn::new(name, args)),
        }
    }

    pub fn set_scale(&mut self, factor: f64) {
        self.set_absolute("scale", factor);
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        self.set_absolute("rotate", degrees);
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .functions
            .iter()
            .map(|func| format!("{}({})", func.name, func.args))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

/// Rewrite a node's transform through `edit`.
pub(crate) fn edit_transform<F>(doc: &mut Document, node: NodeId, edit: F) -> bool
where
    F: FnOnce(&mut Transform),
{
    let Some(el) = doc.element_mut(node) else {
        return false;
    };
    let mut transform = Transform::parse(el.attr("transform").unwrap_or(""));
    edit(&mut transform);
    el.set_attr("transform", &transform.to_string());
    true
}

/// Pivot scale and rotation on the shape's own bounding-box center.
pub(crate) fn set_fill_box_origin(doc: &mut Document, node: NodeId) {
    if let Some(el) = doc.element_mut(node) {
        el.set_style("transform-box", "fill-box");
        el.set_style("transform-origin", "center");
    }
}

/// Move the node `id` by `(dx, dy)`, accumulating onto its translation.
pub fn apply_translate_delta(svg: &str, id: &str, dx: f64, dy: f64) -> String {
    if !dx.is_finite() || !dy.is_finite() {
        return svg.to_string();
    }
    edit_svg(svg, "apply_translate_delta", |doc| {
        match require(doc, id, "apply_translate_delta") {
            Some(node) => edit_transform(doc, node, |t| t.translate_by(dx, dy)),
            None => false,
        }
    })
}

/// Set the node's absolute scale about its own center.
pub fn set_scale(svg: &str, id: &str, factor: f64) -> String {
    if !factor.is_finite() {
        return svg.to_string();
    }
    edit_svg(svg, "set_scale", |doc| {
        let Some(node) = require(doc, id, "set_scale") else {
            return false;
        };
        set_fill_box_origin(doc, node);
        edit_transform(doc, node, |t| t.set_scale(factor))
    })
}

/// Set the node's absolute rotation in degrees about its own center.
pub fn set_rotation(svg: &str, id: &str, degrees: f64) -> String {
    if !degrees.is_finite() {
        return svg.to_string();
    }
    edit_svg(svg, "set_rotation", |doc| {
        let Some(node) = require(doc, id, "set_rotation") else {
            return false;
        };
        set_fill_box_origin(doc, node);
        edit_transform(doc, node, |t| t.set_rotation(degrees))
    })
}
