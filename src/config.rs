//! Editing options - the constants the engines rely on, overridable from a
//! TOML file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EditError, Result};

/// Options shared by the structural, snippet and theme engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditOptions {
    /// Ids that mark a background node. The first one names synthesized
    /// backgrounds.
    pub background_ids: Vec<String>,
    /// Fill of a synthesized background rectangle
    pub background_color: String,
    /// Canvas width and height assumed when the viewBox is missing or broken
    pub default_canvas: f64,
    /// Offset applied to a duplicated node, in user units
    pub duplicate_offset: [f64; 2],
    /// viewBox given to extracted snippets
    pub snippet_view_box: String,
    /// Prefix of generated ids for injected snippets (`asset-1`, `asset-2`, ...)
    pub asset_id_prefix: String,
    /// Suffix appended to the source id of a duplicate
    pub copy_id_suffix: String,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            background_ids: ["background", "bg", "backdrop", "scene-bg"]
                .into_iter()
                .map(String::from)
                .collect(),
            background_color: "#f8fafc".to_string(),
            default_canvas: 512.0,
            duplicate_offset: [20.0, 20.0],
            snippet_view_box: "0 0 512 512".to_string(),
            asset_id_prefix: "asset".to_string(),
            copy_id_suffix: "_copy".to_string(),
        }
    }
}

impl EditOptions {
    /// Load options from a TOML file. Missing keys take their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| EditError::OptionsIo {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| EditError::OptionsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Id given to a synthesized background rectangle.
    pub fn canonical_background_id(&self) -> &str {
        self.background_ids
            .first()
            .map(String::as_str)
            .unwrap_or("background")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let options: EditOptions = toml::from_str(
            r##"
background_color = "#000000"
duplicate_offset = [5, 10]
"##,
        )
        .unwrap();
        assert_eq!(options.background_color, "#000000");
        assert_eq!(options.duplicate_offset, [5.0, 10.0]);
        assert_eq!(options.canonical_background_id(), "background");
        assert_eq!(options.default_canvas, 512.0);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(toml::from_str::<EditOptions>("colour = \"red\"").is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = EditOptions::from_path(Path::new("/nonexistent/svgedit.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/svgedit.toml"));
    }

    #[test]
    fn test_empty_background_ids_fall_back() {
        let options = EditOptions {
            background_ids: vec![],
            ..Default::default()
        };
        assert_eq!(options.canonical_background_id(), "background");
    }
}
