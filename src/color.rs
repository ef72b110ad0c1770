//! Color engine - color parsing, lighting-aware tinting and recoloring.
//!
//! Recoloring is gradient aware: a shape painted with `url(#id)` has the
//! referenced gradient's stops remapped to a lit-to-shadowed ramp of the new
//! hue, while a bright early stop (an existing glare) is kept. Bright,
//! translucent shapes are treated as gloss overlays and left alone.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::document::{edit_svg, require, Document, Element, NodeId};
use crate::numeric::{fmt_num, parse_number};
use crate::types::Paint;

lazy_static! {
    static ref RE_RGB_FN: Regex = Regex::new(r"^rgba?\(([^)]+)\)$").unwrap();
    static ref RE_URL_REF: Regex = Regex::new(r"(?i)^url\(#([^)]+)\)$").unwrap();
}

/// Tags whose paint is set directly.
pub const DRAWABLE_TAGS: &[&str] = &[
    "path", "rect", "circle", "ellipse", "polygon", "polyline", "line",
];

/// Luminance above which a translucent fill counts as a highlight.
const HIGHLIGHT_LUMINANCE: f64 = 0.9;
/// Combined opacity below which a bright fill counts as a highlight.
const HIGHLIGHT_OPACITY: f64 = 0.9;
/// Gradient stops this bright and this early are kept as glare.
const GLARE_LUMINANCE: f64 = 0.92;
const GLARE_MAX_OFFSET: f64 = 0.25;
/// Strength of the light/dark ramp applied across gradient stops.
const RAMP_STRENGTH: f64 = 0.35;

/// An sRGB color with channels in [0, 255]. Channels stay fractional while
/// blending and are rounded only by [`Rgb::to_hex`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

pub const WHITE: Rgb = Rgb::new(255.0, 255.0, 255.0);
pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

fn clamp_channel(value: f64) -> f64 {
    value.clamp(0.0, 255.0)
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Relative luminance normalized to [0, 1].
    pub fn luminance(&self) -> f64 {
        (0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b) / 255.0
    }

    /// Per-channel linear interpolation toward `to`.
    pub fn blend(&self, to: Rgb, amount: f64) -> Rgb {
        Rgb::new(
            clamp_channel(self.r + (to.r - self.r) * amount),
            clamp_channel(self.g + (to.g - self.g) * amount),
            clamp_channel(self.b + (to.b - self.b) * amount),
        )
    }

    /// Lighten toward white by `light`, then darken the result toward black
    /// by `dark`.
    pub fn tint(&self, light: f64, dark: f64) -> Rgb {
        self.blend(WHITE, light).blend(BLACK, dark)
    }

    pub fn to_hex(&self) -> String {
        let channel = |v: f64| clamp_channel(v.round()) as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

/// Resolve a color literal to RGB.
///
/// Accepts `#rgb`, `#rrggbb` and `rgb()`/`rgba()`. `none`, `transparent`,
/// `url(...)` references and anything else (named colors included) resolve
/// to `None`.
pub fn parse_color(raw: &str) -> Option<Rgb> {
    let color = raw.trim().to_ascii_lowercase();
    if color.is_empty() || color == "none" || color == "transparent" || color.starts_with("url(") {
        return None;
    }

    if let Some(hex) = color.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
        let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return match hex.len() {
            3 => Some(Rgb::new(
                f64::from(digit(0)? * 17),
                f64::from(digit(1)? * 17),
                f64::from(digit(2)? * 17),
            )),
            6 => Some(Rgb::new(
                f64::from(pair(0)?),
                f64::from(pair(2)?),
                f64::from(pair(4)?),
            )),
            _ => None,
        };
    }

    let caps = RE_RGB_FN.captures(&color)?;
    let channels: Vec<f64> = caps[1]
        .split(',')
        .take(3)
        .map(parse_number)
        .collect::<Option<_>>()?;
    match channels.as_slice() {
        &[r, g, b] => Some(Rgb::new(
            clamp_channel(r.round()),
            clamp_channel(g.round()),
            clamp_channel(b.round()),
        )),
        _ => None,
    }
}

/// Target id of a `url(#id)` paint reference.
pub fn url_reference(raw: &str) -> Option<&str> {
    RE_URL_REF
        .captures(raw.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Gradient stop offset normalized to [0, 1]. Percentages are supported;
/// missing or unparseable offsets are 0.
pub fn parse_offset(raw: Option<&str>) -> f64 {
    let Some(offset) = raw.map(str::trim).filter(|o| !o.is_empty()) else {
        return 0.0;
    };
    match offset.strip_suffix('%') {
        Some(percent) => parse_number(percent).map_or(0.0, |v| v.clamp(0.0, 100.0) / 100.0),
        None => parse_number(offset).map_or(0.0, |v| v.clamp(0.0, 1.0)),
    }
}

fn is_transparent(raw: &str) -> bool {
    let value = raw.trim();
    value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("transparent")
}

/// `opacity` times `fill-opacity`, each defaulting to 1 when missing or
/// invalid.
pub fn combined_opacity(el: &Element) -> f64 {
    let read = |name: &str| {
        el.attr(name)
            .filter(|v| !v.is_empty())
            .map_or(Some(1.0), parse_number)
            .unwrap_or(1.0)
    };
    read("opacity") * read("fill-opacity")
}

/// A very light fill on a translucent shape is a deliberate gloss layer and
/// survives recoloring.
pub fn is_highlight(el: &Element, raw_fill: &str) -> bool {
    match parse_color(raw_fill) {
        Some(rgb) => {
            rgb.luminance() > HIGHLIGHT_LUMINANCE && combined_opacity(el) < HIGHLIGHT_OPACITY
        }
        None => false,
    }
}

/// Recolor the gradient referenced by `raw_ref` toward `target`.
///
/// Returns `true` when the gradient was recolored now or earlier in the same
/// operation (`visited`), `false` when the reference is not a `url(#id)` or
/// the gradient does not exist.
pub fn recolor_gradient(
    doc: &mut Document,
    raw_ref: &str,
    target: Rgb,
    visited: &mut HashSet<String>,
) -> bool {
    let Some(gradient_id) = url_reference(raw_ref) else {
        return false;
    };
    if visited.contains(gradient_id) {
        return true;
    }
    let Some(gradient) = doc.find_by_id(gradient_id) else {
        log::debug!("recolor_gradient: gradient {gradient_id:?} not found");
        return false;
    };
    visited.insert(gradient_id.to_string());

    let stops: Vec<NodeId> = doc
        .descendants(gradient)
        .into_iter()
        .filter(|&node| doc.element(node).is_some_and(|el| el.is("stop")))
        .collect();

    if stops.is_empty() {
        // Template gradient: the stops live on the gradient it links to.
        let linked = doc
            .element(gradient)
            .and_then(Element::href)
            .and_then(|href| href.strip_prefix('#'))
            .map(|id| format!("url(#{id})"));
        if let Some(linked) = linked {
            recolor_gradient(doc, &linked, target, visited);
        }
        return true;
    }

    for stop in stops {
        let Some(el) = doc.element_mut(stop) else {
            continue;
        };
        let current = el.paint("stop-color").and_then(parse_color);
        let offset = parse_offset(el.attr("offset"));

        if current.is_some_and(|rgb| rgb.luminance() > GLARE_LUMINANCE) && offset <= GLARE_MAX_OFFSET {
            continue;
        }

        let next = target
            .tint(RAMP_STRENGTH * (1.0 - offset), RAMP_STRENGTH * offset)
            .to_hex();
        el.set_paint("stop-color", &next);
    }
    true
}

/// `node` and its drawable descendants, skipping `defs` and `stop` subtrees.
pub(crate) fn drawables(doc: &Document, node: NodeId) -> Vec<NodeId> {
    fn walk(doc: &Document, node: NodeId, out: &mut Vec<NodeId>) {
        let Some(el) = doc.element(node) else {
            return;
        };
        if el.is("defs") || el.is("stop") {
            return;
        }
        if DRAWABLE_TAGS.iter().any(|tag| el.is(tag)) {
            out.push(node);
        }
        for child in doc.element_children(node) {
            walk(doc, child, out);
        }
    }
    let mut out = Vec::new();
    walk(doc, node, &mut out);
    out
}

/// Recolor the node `id` and every drawable below it.
///
/// Fill recoloring follows gradient references, leaves `none`/`transparent`
/// fills and highlight overlays untouched. Stroke is always overwritten.
/// Attribute and inline style are written together.
pub fn update_element_color(svg: &str, id: &str, color: &str, channel: Paint) -> String {
    edit_svg(svg, "update_element_color", |doc| {
        let Some(target) = require(doc, id, "update_element_color") else {
            return false;
        };
        let base = parse_color(color);
        let mut visited = HashSet::new();

        for node in drawables(doc, target) {
            let Some(el) = doc.element(node) else {
                continue;
            };
            let raw = el.paint(channel.as_str()).unwrap_or("").to_string();

            match (channel, base) {
                (Paint::Fill, Some(rgb)) if raw.starts_with("url(#") => {
                    recolor_gradient(doc, &raw, rgb, &mut visited);
                }
                (Paint::Fill, _) => {
                    let recolor =
                        raw.is_empty() || (!is_transparent(&raw) && !is_highlight(el, &raw));
                    log::trace!("update_element_color: {:?} fill {raw:?} recolor={recolor}", el.id());
                    if recolor {
                        if let Some(el) = doc.element_mut(node) {
                            el.set_paint("fill", color);
                        }
                    }
                }
                (Paint::Stroke, _) => {
                    if let Some(el) = doc.element_mut(node) {
                        el.set_paint("stroke", color);
                    }
                }
            }
        }
        true
    })
}

/// Set stroke color and/or width on the node `id` and its drawables.
pub fn update_element_stroke(
    svg: &str,
    id: &str,
    color: Option<&str>,
    width: Option<f64>,
) -> String {
    let width = width.filter(|w| w.is_finite() && *w >= 0.0);
    if color.is_none() && width.is_none() {
        return svg.to_string();
    }
    edit_svg(svg, "update_element_stroke", |doc| {
        let Some(target) = require(doc, id, "update_element_stroke") else {
            return false;
        };
        for node in drawables(doc, target) {
            let Some(el) = doc.element_mut(node) else {
                continue;
            };
            if let Some(color) = color {
                el.set_paint("stroke", color);
            }
            if let Some(width) = width {
                el.set_paint("stroke-width", &fmt_num(width));
            }
        }
        true
    })
}

/// Set the node's `opacity`, clamped to [0, 1].
pub fn update_element_opacity(svg: &str, id: &str, opacity: f64) -> String {
    if !opacity.is_finite() {
        return svg.to_string();
    }
    edit_svg(svg, "update_element_opacity", |doc| {
        let Some(target) = require(doc, id, "update_element_opacity") else {
            return false;
        };
        match doc.element_mut(target) {
            Some(el) => {
                el.set_attr("opacity", &fmt_num(opacity.clamp(0.0, 1.0)));
                true
            }
            None => false,
        }
    })
}
