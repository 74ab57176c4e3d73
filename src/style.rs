//! Named style resolution.
//!
//! Styles form inheritance chains through their `base` id. Resolution walks
//! the chain explicitly with a visited set and produces a flattened
//! [`ResolvedStyle`]; a cycle or an unknown id falls back to the default
//! style.

use crate::error::{Error, Result};
use crate::model::{Alignment, Color};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Default font family of the resolved default style.
pub const DEFAULT_FONT_FAMILY: &str = "Segoe UI";

/// Default font size in points.
pub const DEFAULT_FONT_SIZE: f64 = 11.0;

/// Resolves a style id into a fully merged style.
pub trait StyleResolver: Send + Sync {
    /// Resolve a character style by id.
    fn resolve_character_style(&self, id: &str) -> ResolvedStyle;
}

/// A style definition. Unset properties are inherited from `base`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleDef {
    /// Style id
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Id of the style this one inherits from
    pub base: Option<String>,
    /// Font family
    pub font_family: Option<String>,
    /// Font size in points
    pub font_size: Option<f64>,
    /// Bold
    pub bold: Option<bool>,
    /// Italic
    pub italic: Option<bool>,
    /// Underline
    pub underline: Option<bool>,
    /// Strikethrough
    pub strikethrough: Option<bool>,
    /// Text color
    pub color: Option<Color>,
    /// Paragraph alignment
    pub alignment: Option<Alignment>,
    /// Space before the paragraph
    pub space_before: Option<f64>,
    /// Space after the paragraph
    pub space_after: Option<f64>,
    /// Line height multiplier
    pub line_height: Option<f64>,
}

impl StyleDef {
    /// Create an empty definition with an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the base style.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }
}

/// A fully merged style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStyle {
    /// Id of the style that was resolved ("default" for the fallback)
    pub id: String,
    /// Display name
    pub name: String,
    /// Font family
    pub font_family: String,
    /// Font size in points
    pub font_size: f64,
    /// Bold
    pub bold: bool,
    /// Italic
    pub italic: bool,
    /// Underline
    pub underline: bool,
    /// Strikethrough
    pub strikethrough: bool,
    /// Text color, if the style chain sets one
    pub color: Option<Color>,
    /// Paragraph alignment
    pub alignment: Alignment,
    /// Space before the paragraph
    pub space_before: f64,
    /// Space after the paragraph
    pub space_after: f64,
    /// Line height multiplier
    pub line_height: f64,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: "Default".to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            color: None,
            alignment: Alignment::Left,
            space_before: 0.0,
            space_after: 0.0,
            line_height: 1.0,
        }
    }
}

impl ResolvedStyle {
    fn merge(&mut self, def: &StyleDef) {
        self.id = def.id.clone();
        self.name = def.name.clone().unwrap_or_else(|| def.id.clone());
        if let Some(ref family) = def.font_family {
            self.font_family = family.clone();
        }
        if let Some(size) = def.font_size {
            self.font_size = size;
        }
        if let Some(bold) = def.bold {
            self.bold = bold;
        }
        if let Some(italic) = def.italic {
            self.italic = italic;
        }
        if let Some(underline) = def.underline {
            self.underline = underline;
        }
        if let Some(strikethrough) = def.strikethrough {
            self.strikethrough = strikethrough;
        }
        if def.color.is_some() {
            self.color = def.color;
        }
        if let Some(alignment) = def.alignment {
            self.alignment = alignment;
        }
        if let Some(space) = def.space_before {
            self.space_before = space;
        }
        if let Some(space) = def.space_after {
            self.space_after = space;
        }
        if let Some(height) = def.line_height {
            self.line_height = height;
        }
    }
}

/// A set of style definitions keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSheet {
    styles: HashMap<String, StyleDef>,
}

impl StyleSheet {
    /// Create an empty style sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a style sheet from a JSON array of style definitions.
    pub fn from_json(json: &str) -> Result<Self> {
        let defs: Vec<StyleDef> = serde_json::from_str(json)
            .map_err(|e| Error::Other(format!("invalid style sheet: {}", e)))?;
        Ok(defs.into_iter().collect())
    }

    /// Load a style sheet from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Add or replace a style definition.
    pub fn insert(&mut self, def: StyleDef) {
        self.styles.insert(def.id.clone(), def);
    }

    /// Get a style definition.
    pub fn get(&self, id: &str) -> Option<&StyleDef> {
        self.styles.get(id)
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Check if the sheet has no definitions.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Resolve a style id through its inheritance chain.
    pub fn resolve(&self, id: &str) -> ResolvedStyle {
        if id.is_empty() {
            return ResolvedStyle::default();
        }
        let mut visited = HashSet::new();
        self.resolve_with(id, &mut visited)
    }

    fn resolve_with(&self, id: &str, visited: &mut HashSet<String>) -> ResolvedStyle {
        if !visited.insert(id.to_string()) {
            warn!("Circular style inheritance detected for: {}", id);
            return ResolvedStyle::default();
        }

        let Some(def) = self.styles.get(id) else {
            debug!("Style not found: {}, using default", id);
            return ResolvedStyle::default();
        };

        let mut resolved = match def.base.as_deref() {
            Some(base) if !base.is_empty() => self.resolve_with(base, visited),
            _ => ResolvedStyle::default(),
        };
        resolved.merge(def);
        resolved
    }
}

impl FromIterator<StyleDef> for StyleSheet {
    fn from_iter<I: IntoIterator<Item = StyleDef>>(iter: I) -> Self {
        let mut sheet = StyleSheet::new();
        for def in iter {
            sheet.insert(def);
        }
        sheet
    }
}

impl StyleResolver for StyleSheet {
    fn resolve_character_style(&self, id: &str) -> ResolvedStyle {
        self.resolve(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_style_is_default() {
        let sheet = StyleSheet::new();
        assert_eq!(sheet.resolve("missing"), ResolvedStyle::default());
        assert_eq!(sheet.resolve(""), ResolvedStyle::default());
    }

    #[test]
    fn test_inheritance_child_overrides_parent() {
        let sheet: StyleSheet = vec![
            StyleDef {
                bold: Some(true),
                font_size: Some(14.0),
                color: Some(Color::rgb(10, 10, 10)),
                ..StyleDef::new("heading")
            },
            StyleDef {
                font_size: Some(18.0),
                italic: Some(true),
                ..StyleDef::new("title").with_base("heading")
            },
        ]
        .into_iter()
        .collect();

        let title = sheet.resolve("title");
        assert_eq!(title.id, "title");
        assert!(title.bold);
        assert!(title.italic);
        assert_eq!(title.font_size, 18.0);
        assert_eq!(title.color, Some(Color::rgb(10, 10, 10)));
    }

    #[test]
    fn test_cycle_falls_back_to_default() {
        let sheet: StyleSheet = vec![
            StyleDef {
                bold: Some(true),
                ..StyleDef::new("a").with_base("b")
            },
            StyleDef::new("b").with_base("a"),
        ]
        .into_iter()
        .collect();

        // a -> b -> a: the repeated visit yields the default, then b and a merge on top.
        let resolved = sheet.resolve("a");
        assert_eq!(resolved.id, "a");
        assert!(resolved.bold);
    }

    #[test]
    fn test_self_cycle_terminates() {
        let sheet: StyleSheet = vec![StyleDef::new("loop").with_base("loop")]
            .into_iter()
            .collect();
        assert_eq!(sheet.resolve("loop").id, "loop");
    }

    #[test]
    fn test_from_json() {
        let json = r##"[
            {"id": "emphasis", "italic": true, "color": {"r": 200, "g": 0, "b": 0}},
            {"id": "strong-emphasis", "base": "emphasis", "bold": true}
        ]"##;
        let sheet = StyleSheet::from_json(json).unwrap();
        assert_eq!(sheet.len(), 2);
        let resolved = sheet.resolve("strong-emphasis");
        assert!(resolved.bold && resolved.italic);
        assert_eq!(resolved.color, Some(Color::rgb(200, 0, 0)));

        assert!(StyleSheet::from_json("{not json").is_err());
    }
}
