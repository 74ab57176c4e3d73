//! Layout configuration.

use crate::model::Color;
use crate::style::{DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE};
use serde::{Deserialize, Serialize};

/// Font used for layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSpec {
    /// Font family name
    pub family: String,

    /// Font size in points
    pub size: f64,
}

impl FontSpec {
    /// Create a font spec.
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE)
    }
}

/// Options controlling layout and height estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Base font
    pub font: FontSpec,

    /// Available line width in pixels
    pub line_width: f64,

    /// Default text color
    pub text_color: Color,

    /// Line height used for estimates and empty paragraphs
    pub estimated_line_height: f64,

    /// Characters per line used for estimates
    pub chars_per_line: f64,

    /// Paragraphs kept materialized on each side of the viewport
    pub viewport_buffer: usize,

    /// Upper bound on live layouts after a viewport pass
    pub max_cached_layouts: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            line_width: 800.0,
            text_color: Color::rgb(0x1e, 0x1e, 0x1e),
            estimated_line_height: 20.0,
            chars_per_line: 80.0,
            viewport_buffer: 50,
            max_cached_layouts: 150,
        }
    }
}

impl LayoutOptions {
    /// Create new layout options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load layout options from a JSON object; missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let invalid = |e: serde_json::Error| {
            crate::Error::Other(format!("invalid layout options: {}", e))
        };
        let value: serde_json::Value = serde_json::from_str(json).map_err(invalid)?;
        if !value.is_object() {
            return Err(crate::Error::Other(
                "invalid layout options: expected a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(invalid)
    }

    /// Set the font.
    pub fn with_font(mut self, font: FontSpec) -> Self {
        self.font = font;
        self
    }

    /// Set the line width.
    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }

    /// Set the default text color.
    pub fn with_text_color(mut self, color: Color) -> Self {
        self.text_color = color;
        self
    }

    /// Set the estimated line height.
    pub fn with_estimated_line_height(mut self, height: f64) -> Self {
        self.estimated_line_height = height;
        self
    }

    /// Set the estimated characters per line.
    pub fn with_chars_per_line(mut self, chars: f64) -> Self {
        self.chars_per_line = chars;
        self
    }

    /// Set the viewport buffer.
    pub fn with_viewport_buffer(mut self, paragraphs: usize) -> Self {
        self.viewport_buffer = paragraphs;
        self
    }

    /// Set the live layout limit.
    pub fn with_max_cached_layouts(mut self, layouts: usize) -> Self {
        self.max_cached_layouts = layouts;
        self
    }

    /// Line height for estimates, falling back to the default when the
    /// configured value is unusable.
    pub fn line_height(&self) -> f64 {
        if self.estimated_line_height.is_finite() && self.estimated_line_height > 0.0 {
            self.estimated_line_height
        } else {
            LayoutOptions::default().estimated_line_height
        }
    }

    /// Estimated height of a paragraph of `char_len` characters:
    /// `ceil(len / chars_per_line)` lines, at least one.
    pub fn estimate_height(&self, char_len: usize) -> f64 {
        let lines = if self.chars_per_line.is_finite() && self.chars_per_line > 0.0 {
            (char_len as f64 / self.chars_per_line).ceil().max(1.0)
        } else {
            1.0
        };
        lines * self.line_height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_height() {
        let options = LayoutOptions::new();
        assert_eq!(options.estimate_height(0), 20.0);
        assert_eq!(options.estimate_height(80), 20.0);
        assert_eq!(options.estimate_height(81), 40.0);
        assert_eq!(options.estimate_height(800), 200.0);
    }

    #[test]
    fn test_degenerate_config_falls_back_to_one_line() {
        let options = LayoutOptions::new()
            .with_chars_per_line(0.0)
            .with_estimated_line_height(f64::NAN);
        assert_eq!(options.estimate_height(10_000), 20.0);
    }

    #[test]
    fn test_from_json_partial() {
        let options = LayoutOptions::from_json(r#"{"line_width": 400, "font": {"size": 14}}"#).unwrap();
        assert_eq!(options.line_width, 400.0);
        assert_eq!(options.font.size, 14.0);
        assert_eq!(options.font.family, DEFAULT_FONT_FAMILY);
        assert_eq!(options.viewport_buffer, 50);
        assert_eq!(options.max_cached_layouts, 150);
    }

    #[test]
    fn test_from_json_requires_an_object() {
        for json in ["[]", "[400]", "null", "12", r#""wide""#, "{", r#"{"line_width": "wide"}"#] {
            let err = LayoutOptions::from_json(json).unwrap_err();
            assert!(err.to_string().contains("invalid layout options"), "{}", json);
        }
        assert_eq!(LayoutOptions::from_json("{}").unwrap(), LayoutOptions::default());
    }
}
