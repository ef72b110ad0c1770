//! Editing session - the host-side state around the pure string engines.
//!
//! A session owns the current document, the stack of earlier versions, the
//! locked and hidden id sets and the saved assets. Every edit goes through
//! [`Session::apply`], which records history only when the text changed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::EditOptions;
use crate::document::{Document, Element};
use crate::snippet::{extract_snippet, inject_snippet};
use crate::structure::{
    add_background, duplicate_element, move_down, move_up, remove_element, unique_id,
};

/// A saved snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    /// Standalone document produced by [`extract_snippet`]
    pub snippet: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    svg: String,
    history: Vec<String>,
    locked: BTreeSet<String>,
    hidden: BTreeSet<String>,
    assets: Vec<Asset>,
    asset_counter: usize,
    options: EditOptions,
}

impl Session {
    pub fn new(svg: impl Into<String>, options: EditOptions) -> Self {
        Self {
            svg: svg.into(),
            options,
            ..Default::default()
        }
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn options(&self) -> &EditOptions {
        &self.options
    }

    /// Number of versions [`Session::undo`] can go back.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Run an edit against the current document. The previous version is
    /// kept only when the edit changed something.
    pub fn apply<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&str, &EditOptions) -> String,
    {
        let next = edit(&self.svg, &self.options);
        if next == self.svg {
            return false;
        }
        let previous = std::mem::replace(&mut self.svg, next);
        self.history.push(previous);
        true
    }

    /// Run an edit aimed at one node. Locked nodes refuse edits.
    pub fn edit<F>(&mut self, id: &str, edit: F) -> bool
    where
        F: FnOnce(&str, &str, &EditOptions) -> String,
    {
        if self.locked.contains(id) {
            log::debug!("session: {id:?} is locked");
            return false;
        }
        self.apply(|svg, options| edit(svg, id, options))
    }

    /// Restore the previous version.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.svg = previous;
                true
            }
            None => false,
        }
    }

    /// Replace the document with a freshly generated one. The result gets a
    /// background and starts with no locked or hidden nodes.
    pub fn load_generated(&mut self, svg: &str) {
        let svg = add_background(svg, &self.options.background_color, &self.options);
        let previous = std::mem::replace(&mut self.svg, svg);
        if !previous.is_empty() {
            self.history.push(previous);
        }
        self.locked.clear();
        self.hidden.clear();
    }

    /// Flip the lock on `id`. Returns whether it is now locked.
    pub fn toggle_lock(&mut self, id: &str) -> bool {
        toggle(&mut self.locked, id)
    }

    /// Flip the visibility of `id`. Returns whether it is now hidden.
    pub fn toggle_hidden(&mut self, id: &str) -> bool {
        toggle(&mut self.hidden, id)
    }

    pub fn is_locked(&self, id: &str) -> bool {
        self.locked.contains(id)
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden.contains(id)
    }

    fn unlocked<'a>(&self, ids: &[&'a str]) -> Vec<&'a str> {
        ids.iter().copied().filter(|id| !self.is_locked(id)).collect()
    }

    /// Move every selected node one step back, in selection order.
    pub fn move_selection_up(&mut self, ids: &[&str]) -> bool {
        let ids = self.unlocked(ids);
        self.apply(|svg, _| ids.iter().fold(svg.to_string(), |svg, id| move_up(&svg, id)))
    }

    /// Move every selected node one step forward, last selected first.
    pub fn move_selection_down(&mut self, ids: &[&str]) -> bool {
        let ids = self.unlocked(ids);
        self.apply(|svg, _| {
            ids.iter()
                .rev()
                .fold(svg.to_string(), |svg, id| move_down(&svg, id))
        })
    }

    /// Remove every selected node.
    pub fn remove_selection(&mut self, ids: &[&str]) -> bool {
        let ids = self.unlocked(ids);
        self.apply(|svg, _| ids.iter().fold(svg.to_string(), |svg, id| remove_element(&svg, id)))
    }

    /// Duplicate every selected node and return the ids of the copies, in
    /// selection order.
    pub fn duplicate_selection(&mut self, ids: &[&str]) -> Vec<String> {
        let ids = self.unlocked(ids);
        let mut copies = Vec::new();
        self.apply(|svg, options| {
            let mut svg = svg.to_string();
            for id in ids {
                let Ok(doc) = Document::parse(&svg) else {
                    break;
                };
                let existing = doc.ids();
                if !existing.contains(id) {
                    continue;
                }
                let copy_id = unique_id(&existing, &format!("{id}{}", options.copy_id_suffix));
                let next = duplicate_element(&svg, id, Some(copy_id.as_str()), options);
                if next != svg {
                    svg = next;
                    copies.push(copy_id);
                }
            }
            svg
        });
        copies
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Save the selected nodes as an asset. Nothing is saved for an empty
    /// selection.
    pub fn save_asset(&mut self, ids: &[&str]) -> Option<&Asset> {
        if ids.is_empty() {
            return None;
        }
        self.asset_counter += 1;
        let asset = Asset {
            id: format!("{}-{}", self.options.asset_id_prefix, self.asset_counter),
            name: format!("Asset {}", self.assets.len() + 1),
            snippet: extract_snippet(&self.svg, ids, &self.options),
        };
        self.assets.push(asset);
        self.assets.last()
    }

    /// Insert a saved asset at the canvas center. Returns the id of the new
    /// group.
    pub fn use_asset(&mut self, asset_id: &str) -> Option<String> {
        let snippet = self
            .assets
            .iter()
            .find(|asset| asset.id == asset_id)?
            .snippet
            .clone();
        let mut new_id = None;
        self.apply(|svg, options| {
            let injected = inject_snippet(svg, &snippet, None, None, options);
            new_id = injected.new_id;
            injected.svg
        });
        new_id
    }

    pub fn delete_asset(&mut self, asset_id: &str) -> bool {
        let before = self.assets.len();
        self.assets.retain(|asset| asset.id != asset_id);
        self.assets.len() != before
    }

    /// The current document with a stylesheet that hides hidden nodes and
    /// makes locked ones ignore the pointer. The history is not touched.
    pub fn preview(&self) -> String {
        let rules: Vec<String> = self
            .hidden
            .iter()
            .map(|id| format!("#{id} {{ display: none; }}"))
            .chain(
                self.locked
                    .iter()
                    .map(|id| format!("#{id} {{ pointer-events: none; }}")),
            )
            .collect();
        if rules.is_empty() {
            return self.svg.clone();
        }
        let Ok(mut doc) = Document::parse(&self.svg) else {
            return self.svg.clone();
        };
        let Some(root) = doc.root() else {
            return self.svg.clone();
        };
        let name = doc.qualify("style");
        let style = doc.create_element(Element::new(name));
        let css = doc.create_text(&rules.join("\n"));
        doc.append_child(style, css);
        doc.append_child(root, style);
        doc.serialize()
    }
}

fn toggle(set: &mut BTreeSet<String>, id: &str) -> bool {
    if set.remove(id) {
        false
    } else {
        set.insert(id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::update_element_color;
    use crate::types::Paint;

    const DOC: &str = r##"<svg viewBox="0 0 100 100"><rect id="a" fill="#000000"/><rect id="b"/><rect id="c"/></svg>"##;

    fn order(svg: &str) -> Vec<String> {
        crate::layers::build_tree(svg).into_iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_history_records_only_changes() {
        let mut session = Session::new(DOC, EditOptions::default());
        assert!(!session.edit("missing", |svg, id, _| remove_element(svg, id)));
        assert_eq!(session.history_len(), 0);
        assert!(session.edit("a", |svg, id, _| update_element_color(svg, id, "#ff0000", Paint::Fill)));
        assert_eq!(session.history_len(), 1);
        assert!(session.undo());
        assert_eq!(session.svg(), DOC);
        assert!(!session.undo());
    }

    #[test]
    fn test_locked_nodes_refuse_edits() {
        let mut session = Session::new(DOC, EditOptions::default());
        assert!(session.toggle_lock("a"));
        assert!(!session.edit("a", |svg, id, _| remove_element(svg, id)));
        assert!(!session.remove_selection(&["a"]));
        assert!(!session.toggle_lock("a"));
        assert!(session.remove_selection(&["a"]));
        assert_eq!(order(session.svg()), ["b", "c"]);
    }

    #[test]
    fn test_selection_moves_keep_relative_order() {
        let mut session = Session::new(DOC, EditOptions::default());
        assert!(session.move_selection_down(&["a", "b"]));
        assert_eq!(order(session.svg()), ["c", "a", "b"]);
        assert!(session.move_selection_up(&["a", "b"]));
        assert_eq!(order(session.svg()), ["a", "b", "c"]);
        assert_eq!(session.history_len(), 2);
    }

    #[test]
    fn test_duplicate_selection_reports_new_ids() {
        let mut session = Session::new(DOC, EditOptions::default());
        let copies = session.duplicate_selection(&["a", "zz", "a"]);
        assert_eq!(copies, ["a_copy", "a_copy_2"]);
        assert_eq!(session.history_len(), 1);

        let mut rooted = Session::new(r#"<svg id="root"><rect id="a"/></svg>"#, EditOptions::default());
        assert!(rooted.duplicate_selection(&["root"]).is_empty());
        assert_eq!(rooted.history_len(), 0);
    }

    #[test]
    fn test_assets_round_trip() {
        let mut session = Session::new(DOC, EditOptions::default());
        assert!(session.save_asset(&[]).is_none());
        let asset = session.save_asset(&["a"]).unwrap().clone();
        assert_eq!(asset.name, "Asset 1");
        assert!(asset.snippet.contains(r#"id="a""#));
        let group = session.use_asset(&asset.id).unwrap();
        assert!(session.svg().contains(&format!(r#"<g id="{group}" transform="translate(50, 50)">"#)));
        assert!(session.delete_asset(&asset.id));
        assert!(session.use_asset(&asset.id).is_none());
        assert_eq!(session.save_asset(&["b"]).unwrap().id, "asset-2");
    }

    #[test]
    fn test_load_generated_resets_visibility() {
        let mut session = Session::new("", EditOptions::default());
        session.toggle_hidden("b");
        session.load_generated(r#"<svg viewBox="0 0 10 10"><rect id="b"/></svg>"#);
        assert_eq!(session.history_len(), 0);
        assert!(!session.is_hidden("b"));
        assert!(session.svg().contains(r##"<rect id="background" x="0" y="0" width="10" height="10" fill="#f8fafc"/>"##));
    }

    #[test]
    fn test_preview_adds_rules_without_history() {
        let mut session = Session::new(DOC, EditOptions::default());
        assert_eq!(session.preview(), DOC);
        session.toggle_hidden("b");
        session.toggle_lock("c");
        let preview = session.preview();
        assert!(preview.ends_with("<style>#b { display: none; }\n#c { pointer-events: none; }</style></svg>"));
        assert_eq!(session.svg(), DOC);
        assert_eq!(session.history_len(), 0);
    }
}
