//! svgedit - pure, idempotent edits of SVG documents
//!
//! Every operation takes document text and returns document text. Each call
//! parses a private copy, changes it and serializes it again; parts of the
//! document an edit does not touch come back byte for byte. When the input
//! does not parse, or the target id does not exist, the input is returned
//! unchanged, so a no-op can be detected with `==`.
//!
//! # Example
//!
//! ```rust
//! use svgedit::{Editor, Paint};
//!
//! let editor = Editor::default();
//! let svg = r#"<svg viewBox="0 0 100 100"><circle id="c1" fill="white"/></svg>"#;
//!
//! let svg = editor.add_background(svg);
//! let svg = editor.update_element_color(&svg, "c1", "#ff0000", Paint::Fill);
//! let svg = editor.apply_translate_delta(&svg, "c1", 5.0, 0.0);
//! assert!(svg.contains(r#"transform="translate(5, 0)""#));
//!
//! // Unknown ids are no-ops.
//! assert_eq!(editor.remove_element(&svg, "nope"), svg);
//! ```
//!
//! # Engines
//!
//! - Color: recolor fills, strokes and gradients ([`update_element_color`])
//! - Transform: cumulative translate, absolute scale and rotation
//! - Structure: remove, duplicate, z-order, background
//! - Snippets: extract nodes as standalone assets, inject them back
//! - Themes: rank-preserving palette swaps ([`apply_theme`])
//! - Animation: spin, pulse, blink and float
//! - Layers: the identified elements as a tree ([`build_tree`])
//!
//! [`Session`] keeps undo history, locked and hidden ids and saved assets
//! around these calls.

pub mod animation;
pub mod color;
pub mod config;
pub mod document;
pub mod error;
pub mod layers;
pub mod numeric;
pub mod session;
pub mod snippet;
pub mod structure;
pub mod theme;
pub mod transform;
pub mod types;

pub use animation::{apply_animation, remove_animation};
pub use color::{update_element_color, update_element_opacity, update_element_stroke};
pub use config::EditOptions;
pub use document::Document;
pub use error::{EditError, Result};
pub use layers::build_tree;
pub use session::{Asset, Session};
pub use snippet::{extract_snippet, inject_snippet, Injected};
pub use structure::{
    add_background, duplicate_element, move_after, move_before, move_down, move_up,
    remove_background, remove_element,
};
pub use theme::{apply_theme, preset, presets, Theme};
pub use transform::{apply_translate_delta, set_rotation, set_scale};
pub use types::*;

/// The engines bound to one set of [`EditOptions`].
#[derive(Debug, Clone, Default)]
pub struct Editor {
    pub options: EditOptions,
}

impl Editor {
    pub fn new(options: EditOptions) -> Self {
        Self { options }
    }

    pub fn update_element_color(&self, svg: &str, id: &str, color: &str, channel: Paint) -> String {
        update_element_color(svg, id, color, channel)
    }

    pub fn update_element_stroke(
        &self,
        svg: &str,
        id: &str,
        color: Option<&str>,
        width: Option<f64>,
    ) -> String {
        update_element_stroke(svg, id, color, width)
    }

    pub fn update_element_opacity(&self, svg: &str, id: &str, opacity: f64) -> String {
        update_element_opacity(svg, id, opacity)
    }

    pub fn apply_translate_delta(&self, svg: &str, id: &str, dx: f64, dy: f64) -> String {
        apply_translate_delta(svg, id, dx, dy)
    }

    pub fn set_scale(&self, svg: &str, id: &str, factor: f64) -> String {
        set_scale(svg, id, factor)
    }

    pub fn set_rotation(&self, svg: &str, id: &str, degrees: f64) -> String {
        set_rotation(svg, id, degrees)
    }

    pub fn remove_element(&self, svg: &str, id: &str) -> String {
        remove_element(svg, id)
    }

    /// Duplicate with the configured offset and id suffix.
    pub fn duplicate_element(&self, svg: &str, id: &str, new_id: Option<&str>) -> String {
        duplicate_element(svg, id, new_id, &self.options)
    }

    pub fn move_up(&self, svg: &str, id: &str) -> String {
        move_up(svg, id)
    }

    pub fn move_down(&self, svg: &str, id: &str) -> String {
        move_down(svg, id)
    }

    pub fn move_before(&self, svg: &str, id: &str, target_id: &str) -> String {
        move_before(svg, id, target_id)
    }

    pub fn move_after(&self, svg: &str, id: &str, target_id: &str) -> String {
        move_after(svg, id, target_id)
    }

    /// Add a background in the configured color.
    pub fn add_background(&self, svg: &str) -> String {
        add_background(svg, &self.options.background_color, &self.options)
    }

    pub fn add_background_with(&self, svg: &str, color: &str) -> String {
        add_background(svg, color, &self.options)
    }

    pub fn remove_background(&self, svg: &str) -> String {
        remove_background(svg, &self.options)
    }

    pub fn extract_snippet(&self, svg: &str, ids: &[&str]) -> String {
        extract_snippet(svg, ids, &self.options)
    }

    pub fn inject_snippet(
        &self,
        svg: &str,
        fragment: &str,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Injected {
        inject_snippet(svg, fragment, x, y, &self.options)
    }

    pub fn apply_theme(&self, svg: &str, theme: &Theme) -> String {
        apply_theme(svg, theme, &self.options)
    }

    pub fn apply_animation(&self, svg: &str, id: &str, animation: &Animation) -> String {
        apply_animation(svg, id, animation)
    }

    pub fn remove_animation(&self, svg: &str, id: &str) -> String {
        remove_animation(svg, id)
    }

    pub fn build_tree(&self, svg: &str) -> Vec<LayerNode> {
        build_tree(svg)
    }

    /// Start a session on `svg` with these options.
    pub fn session(&self, svg: impl Into<String>) -> Session {
        Session::new(svg, self.options.clone())
    }
}
