//! Theme engine - palette swaps that keep light-to-dark ordering.
//!
//! Every distinct color painted in the document is ranked by luminance and
//! mapped onto the theme palette at the same relative rank.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::color::{parse_color, Rgb};
use crate::config::EditOptions;
use crate::document::{edit_svg, Document, Element, NodeId};
use crate::structure::find_background;

/// Properties a theme rewrites.
const THEMED_PROPERTIES: &[&str] = &["fill", "stroke", "stop-color"];

/// A named palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    /// Palette colors, in any order
    pub colors: Vec<String>,
    /// Suggested background color for the palette
    pub background: String,
}

impl Theme {
    fn preset(id: &str, name: &str, colors: [&str; 5], background: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            colors: colors.iter().map(|c| c.to_string()).collect(),
            background: background.to_string(),
        }
    }
}

lazy_static! {
    static ref PRESETS: Vec<Theme> = vec![
        Theme::preset(
            "modern-dark",
            "Modern Dark",
            ["#1e293b", "#334155", "#475569", "#94a3b8", "#e2e8f0"],
            "#0f172a",
        ),
        Theme::preset(
            "sunset-vibes",
            "Sunset Vibes",
            ["#7c2d12", "#c2410c", "#ea580c", "#f97316", "#fbbf24"],
            "#fff7ed",
        ),
        Theme::preset(
            "forest-mint",
            "Forest Mint",
            ["#064e3b", "#065f46", "#059669", "#34d399", "#a7f3d0"],
            "#ecfdf5",
        ),
        Theme::preset(
            "neo-pop",
            "Neo Pop",
            ["#be185d", "#db2777", "#f472b6", "#fbcfe8", "#831843"],
            "#fdf2f8",
        ),
        Theme::preset(
            "ocean-breeze",
            "Ocean Breeze",
            ["#1e3a8a", "#1d4ed8", "#3b82f6", "#93c5fd", "#dbeafe"],
            "#eff6ff",
        ),
        Theme::preset(
            "monochrome",
            "Monochrome",
            ["#000000", "#404040", "#737373", "#a3a3a3", "#d4d4d4"],
            "#ffffff",
        ),
        Theme::preset(
            "retro-synth",
            "Retro Synth",
            ["#4c1d95", "#7c3aed", "#a78bfa", "#e879f9", "#f0abfc"],
            "#2e1065",
        ),
    ];
}

/// The built-in themes.
pub fn presets() -> &'static [Theme] {
    &PRESETS
}

/// Look up a built-in theme by id.
pub fn preset(id: &str) -> Option<&'static Theme> {
    PRESETS.iter().find(|theme| theme.id == id)
}

fn normalize(literal: &str) -> String {
    literal.trim().to_ascii_lowercase()
}

/// Distinct resolvable colors, sorted by ascending luminance. Ties keep
/// their first-seen order.
fn ranked<'a>(literals: impl IntoIterator<Item = &'a str>) -> Vec<(String, Rgb)> {
    let mut seen = HashSet::new();
    let mut colors: Vec<(String, Rgb)> = literals
        .into_iter()
        .filter_map(|literal| {
            let key = normalize(literal);
            let rgb = parse_color(&key)?;
            seen.insert(key.clone()).then_some((key, rgb))
        })
        .collect();
    colors.sort_by(|a, b| a.1.luminance().total_cmp(&b.1.luminance()));
    colors
}

/// Rank-preserving map from source literals to palette literals.
///
/// Source color `i` of `n` lands on palette color `round(i / (n - 1) * (m - 1))`.
pub(crate) fn quantile_map(sources: &[&str], palette: &[String]) -> HashMap<String, String> {
    let sources = ranked(sources.iter().copied());
    let targets: Vec<&String> = {
        let mut targets: Vec<(&String, Rgb)> = palette
            .iter()
            .filter_map(|literal| parse_color(literal).map(|rgb| (literal, rgb)))
            .collect();
        targets.sort_by(|a, b| a.1.luminance().total_cmp(&b.1.luminance()));
        targets.into_iter().map(|(literal, _)| literal).collect()
    };
    if sources.is_empty() || targets.is_empty() {
        return HashMap::new();
    }

    let n = sources.len();
    let m = targets.len();
    sources
        .into_iter()
        .enumerate()
        .map(|(i, (key, _))| {
            let pct = if n == 1 { 0.0 } else { i as f64 / (n - 1) as f64 };
            let index = (pct * (m - 1) as f64).round() as usize;
            (key, targets[index.min(m - 1)].trim().to_string())
        })
        .collect()
}

/// Elements outside the background subtree.
fn themed_elements(doc: &Document, options: &EditOptions) -> Vec<NodeId> {
    let excluded: HashSet<NodeId> = find_background(doc, options)
        .map(|bg| doc.descendants(bg).into_iter().collect())
        .unwrap_or_default();
    doc.elements()
        .into_iter()
        .filter(|node| !excluded.contains(node))
        .collect()
}

fn painted_values(el: &Element) -> Vec<&str> {
    THEMED_PROPERTIES
        .iter()
        .flat_map(|&property| [el.attr(property), el.style(property)])
        .flatten()
        .collect()
}

/// Remap every fill, stroke and stop color outside the background onto the
/// theme palette.
pub fn apply_theme(svg: &str, theme: &Theme, options: &EditOptions) -> String {
    edit_svg(svg, "apply_theme", |doc| {
        let nodes = themed_elements(doc, options);
        let sources: Vec<String> = nodes
            .iter()
            .filter_map(|&node| doc.element(node))
            .flat_map(painted_values)
            .map(str::to_string)
            .collect();
        let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
        let mapping = quantile_map(&sources, &theme.colors);
        if mapping.is_empty() {
            log::debug!("apply_theme: nothing to map for theme {:?}", theme.id);
            return false;
        }

        let mut changed = false;
        for node in nodes {
            let Some(el) = doc.element_mut(node) else {
                continue;
            };
            for &property in THEMED_PROPERTIES {
                if let Some(target) = el.attr(property).and_then(|v| mapping.get(&normalize(v))) {
                    let target = target.clone();
                    changed |= el.attr(property) != Some(target.as_str());
                    el.set_attr(property, &target);
                }
                if let Some(target) = el.style(property).and_then(|v| mapping.get(&normalize(v))) {
                    let target = target.clone();
                    changed |= el.style(property) != Some(target.as_str());
                    el.set_style(property, &target);
                }
            }
        }
        changed
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette(colors: &[&str]) -> Vec<String> {
        colors.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_presets_are_complete() {
        assert_eq!(presets().len(), 7);
        for theme in presets() {
            assert_eq!(theme.colors.len(), 5);
            assert!(theme.colors.iter().all(|c| parse_color(c).is_some()));
            assert!(parse_color(&theme.background).is_some());
        }
        assert_eq!(preset("neo-pop").unwrap().name, "Neo Pop");
        assert!(preset("nope").is_none());
    }

    #[test]
    fn test_quantile_map_spreads_over_palette() {
        let map = quantile_map(
            &["#ffffff", "#000000", "#808080"],
            &palette(&["#eeeeee", "#111111", "#555555", "#999999", "#cccccc"]),
        );
        assert_eq!(map["#000000"], "#111111");
        assert_eq!(map["#808080"], "#999999");
        assert_eq!(map["#ffffff"], "#eeeeee");
    }

    #[test]
    fn test_quantile_map_single_source_and_empty_palette() {
        let map = quantile_map(&["#FFF", " #fff "], &palette(&["#222222", "#dddddd"]));
        assert_eq!(map.len(), 1);
        assert_eq!(map["#fff"], "#222222");
        assert!(quantile_map(&["#fff"], &palette(&["nope"])).is_empty());
        assert!(quantile_map(&["none", "url(#g)"], &palette(&["#000"])).is_empty());
    }

    #[test]
    fn test_quantile_map_is_monotonic() {
        let sources = ["#102030", "#ff0000", "#00ff00", "#0000ff", "#fafafa", "#777", "#333333"];
        let theme = preset("sunset-vibes").unwrap();
        let map = quantile_map(&sources, &theme.colors);
        let lum = |c: &str| parse_color(c).unwrap().luminance();
        for a in sources {
            for b in sources {
                if lum(a) < lum(b) {
                    let (ma, mb) = (map[a].as_str(), map[b].as_str());
                    assert!(lum(ma) <= lum(mb), "{a} -> {ma}, {b} -> {mb}");
                }
            }
        }
    }

    #[test]
    fn test_apply_theme_skips_background_and_unresolvable() {
        let options = EditOptions::default();
        let svg = r##"<svg viewBox="0 0 10 10"><rect id="bg" fill="#ffffff"/><circle fill="#000" stroke="none"/><path style="fill: #FFFFFF" fill="url(#g)"/></svg>"##;
        let theme = preset("monochrome").unwrap();
        let out = apply_theme(svg, theme, &options);
        assert_eq!(
            out,
            r##"<svg viewBox="0 0 10 10"><rect id="bg" fill="#ffffff"/><circle fill="#000000" stroke="none"/><path style="fill: #d4d4d4;" fill="url(#g)"/></svg>"##
        );
    }

    #[test]
    fn test_apply_theme_without_colors_is_no_op() {
        let options = EditOptions::default();
        let svg = r#"<svg><rect fill="none"/></svg>"#;
        assert_eq!(apply_theme(svg, preset("forest-mint").unwrap(), &options), svg);
    }
}
