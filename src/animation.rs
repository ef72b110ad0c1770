//! Animation engine - attaches one SMIL animation to a node.

use crate::document::{edit_svg, require, Document, Element, NodeId};
use crate::numeric::fmt_num;
use crate::transform::set_fill_box_origin;
use crate::types::{Animation, AnimationKind};

/// Element names that describe an animation of their parent.
const ANIMATION_TAGS: &[&str] = &[
    "animate",
    "animateTransform",
    "animateMotion",
    "animateColor",
    "set",
];

const EASE_IN_OUT: &str = "0.4 0 0.6 1;0.4 0 0.6 1";

fn animation_children(doc: &Document, node: NodeId) -> Vec<NodeId> {
    doc.element_children(node)
        .filter(|&child| {
            doc.element(child)
                .is_some_and(|el| ANIMATION_TAGS.iter().any(|tag| el.is(tag)))
        })
        .collect()
}

/// Detach every animation child. Returns whether there was any.
fn strip_animations(doc: &mut Document, node: NodeId) -> bool {
    let existing = animation_children(doc, node);
    for &child in &existing {
        doc.detach(child);
    }
    !existing.is_empty()
}

/// The animation element for `kind`, without timing attributes.
fn describe(doc: &Document, kind: AnimationKind) -> Element {
    let transform = |kind: &str| {
        Element::new(doc.qualify("animateTransform"))
            .with_attr("attributeName", "transform")
            .with_attr("attributeType", "XML")
            .with_attr("type", kind)
    };
    match kind {
        AnimationKind::Spin => transform("rotate")
            .with_attr("from", "0")
            .with_attr("to", "360")
            .with_attr("additive", "sum"),
        AnimationKind::Pulse => transform("scale")
            .with_attr("values", "1;1.1;1")
            .with_attr("keyTimes", "0;0.5;1")
            .with_attr("calcMode", "spline")
            .with_attr("keySplines", EASE_IN_OUT),
        AnimationKind::Blink => Element::new(doc.qualify("animate"))
            .with_attr("attributeName", "opacity")
            .with_attr("values", "1;0.3;1")
            .with_attr("keyTimes", "0;0.5;1")
            .with_attr("calcMode", "linear"),
        AnimationKind::Float => transform("translate")
            .with_attr("values", "0,0;0,-10;0,0")
            .with_attr("keyTimes", "0;0.5;1")
            .with_attr("calcMode", "spline")
            .with_attr("keySplines", EASE_IN_OUT)
            .with_attr("additive", "sum"),
    }
}

/// Replace the node's animations with a single `animation`.
///
/// Spin and pulse pivot on the node's own center. A non-positive duration
/// leaves the document untouched.
pub fn apply_animation(svg: &str, id: &str, animation: &Animation) -> String {
    if !(animation.duration.is_finite() && animation.duration > 0.0) {
        log::warn!(
            "apply_animation: ignoring duration {} for {id:?}",
            animation.duration
        );
        return svg.to_string();
    }
    edit_svg(svg, "apply_animation", |doc| {
        let Some(node) = require(doc, id, "apply_animation") else {
            return false;
        };
        strip_animations(doc, node);
        let element = describe(doc, animation.kind)
            .with_attr("dur", &format!("{}s", fmt_num(animation.duration)))
            .with_attr("repeatCount", &animation.repeat.to_string());
        let child = doc.create_element(element);
        doc.append_child(node, child);
        if matches!(animation.kind, AnimationKind::Spin | AnimationKind::Pulse) {
            set_fill_box_origin(doc, node);
        }
        true
    })
}

/// Strip the node's animations and the pivot styling they relied on.
pub fn remove_animation(svg: &str, id: &str) -> String {
    edit_svg(svg, "remove_animation", |doc| {
        let Some(node) = require(doc, id, "remove_animation") else {
            return false;
        };
        let mut changed = strip_animations(doc, node);
        if let Some(el) = doc.element_mut(node) {
            changed |= el.remove_style("transform-box");
            changed |= el.remove_style("transform-origin");
        }
        changed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Repeat;

    fn anim(kind: AnimationKind, duration: f64, repeat: Repeat) -> Animation {
        Animation {
            kind,
            duration,
            repeat,
        }
    }

    #[test]
    fn test_spin_is_added_with_pivot() {
        let svg = r#"<svg><circle id="c" r="4"/></svg>"#;
        let out = apply_animation(svg, "c", &anim(AnimationKind::Spin, 2.0, Repeat::Indefinite));
        assert_eq!(
            out,
            r#"<svg><circle id="c" r="4" style="transform-box: fill-box; transform-origin: center;"><animateTransform attributeName="transform" attributeType="XML" type="rotate" from="0" to="360" additive="sum" dur="2s" repeatCount="indefinite"/></circle></svg>"#
        );
    }

    #[test]
    fn test_reapplying_replaces_previous_animation() {
        let svg = r#"<svg><rect id="r"><animate attributeName="x"/><set attributeName="y"/><title>t</title></rect></svg>"#;
        let out = apply_animation(svg, "r", &anim(AnimationKind::Blink, 1.5, Repeat::Count(3)));
        assert!(out.contains("<title>t</title>"));
        assert!(!out.contains(r#"attributeName="x""#));
        assert!(!out.contains("<set"));
        assert!(out.contains(r#"values="1;0.3;1""#));
        assert!(out.contains(r#"dur="1.5s" repeatCount="3""#));
        assert!(!out.contains("transform-box"));
    }

    #[test]
    fn test_float_is_additive() {
        let svg = r#"<svg><g id="g" transform="translate(4, 4)"/></svg>"#;
        let out = apply_animation(svg, "g", &anim(AnimationKind::Float, 3.0, Repeat::Indefinite));
        assert!(out.contains(r#"transform="translate(4, 4)""#));
        assert!(out.contains(r#"type="translate" values="0,0;0,-10;0,0""#));
        assert!(out.contains(r#"additive="sum""#));
    }

    #[test]
    fn test_invalid_duration_is_ignored() {
        let svg = r#"<svg><rect id="r"/></svg>"#;
        assert_eq!(apply_animation(svg, "r", &anim(AnimationKind::Pulse, 0.0, Repeat::Indefinite)), svg);
        assert_eq!(apply_animation(svg, "r", &anim(AnimationKind::Pulse, f64::NAN, Repeat::Indefinite)), svg);
    }

    #[test]
    fn test_remove_reverts_apply() {
        let svg = r#"<svg><rect id="r" style="fill: red;"/></svg>"#;
        let animated = apply_animation(svg, "r", &anim(AnimationKind::Pulse, 1.0, Repeat::Indefinite));
        assert!(animated.contains(r#"calcMode="spline""#));
        let removed = remove_animation(&animated, "r");
        assert_eq!(removed, r#"<svg><rect id="r" style="fill: red;"></rect></svg>"#);
        assert_eq!(remove_animation(&removed, "r"), removed);
    }
}
