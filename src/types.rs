//! Value types shared across the engines.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::numeric::parse_number;

/// The document's logical coordinate rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Parse a `viewBox` attribute. A missing or malformed value yields a
    /// `fallback`-sized square at the origin.
    pub fn parse(raw: Option<&str>, fallback: f64) -> Self {
        let default = Self {
            x: 0.0,
            y: 0.0,
            width: fallback,
            height: fallback,
        };
        let Some(raw) = raw else {
            return default;
        };
        let parts: Vec<f64> = raw
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .map_while(|p| p.parse::<f64>().ok().filter(|n| n.is_finite()))
            .collect();
        match parts.as_slice() {
            &[x, y, width, height] if width > 0.0 && height > 0.0 => Self {
                x,
                y,
                width,
                height,
            },
            _ => default,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Which paint property a recolor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Paint {
    #[default]
    Fill,
    Stroke,
}

impl Paint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Paint::Fill => "fill",
            Paint::Stroke => "stroke",
        }
    }
}

/// Looping animation presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    /// Rotate 0 -> 360 about the node's own center
    Spin,
    /// Scale 1 -> 1.1 -> 1 about the center, eased
    Pulse,
    /// Opacity 1 -> 0.3 -> 1, linear
    Blink,
    /// Additive translate 0,0 -> 0,-10 -> 0,0, eased
    Float,
}

impl FromStr for AnimationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spin" => Ok(AnimationKind::Spin),
            "pulse" => Ok(AnimationKind::Pulse),
            "blink" => Ok(AnimationKind::Blink),
            "float" => Ok(AnimationKind::Float),
            other => Err(format!("unknown animation type: {other}")),
        }
    }
}

/// How often an animation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Repeat {
    #[default]
    Indefinite,
    Count(u32),
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repeat::Indefinite => f.write_str("indefinite"),
            Repeat::Count(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for Repeat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("indefinite") {
            return Ok(Repeat::Indefinite);
        }
        s.parse::<u32>()
            .map(Repeat::Count)
            .map_err(|_| format!("repeat must be \"indefinite\" or a count, got {s:?}"))
    }
}

impl TryFrom<String> for Repeat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Repeat> for String {
    fn from(value: Repeat) -> Self {
        value.to_string()
    }
}

/// A time-based animation to attach to a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    #[serde(rename = "type")]
    pub kind: AnimationKind,
    /// Seconds per cycle, must be positive
    pub duration: f64,
    #[serde(default)]
    pub repeat: Repeat,
}

/// One identified node in the layer listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerNode {
    pub id: String,
    pub tag: String,
    pub depth: usize,
    pub has_children: bool,
    pub children: Vec<LayerNode>,
}

/// Read a numeric attribute the lenient way: missing or blank means 0,
/// an unparseable value means `None`.
pub(crate) fn attr_number(raw: Option<&str>) -> Option<f64> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => parse_number(value),
        None => Some(0.0),
    }
}
