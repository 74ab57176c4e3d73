//! Paragraph-level types.

use super::{elements_text, Annotation, CharFormat, FormatRun, InlineElement};
use crate::error::{Error, Result};
use crate::parser::build_format_runs;
use crate::style::StyleResolver;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One block-level unit of document text.
///
/// Runs are sorted by start offset and never overlap; text not covered by a
/// run is unformatted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Plain text content
    pub text: String,

    /// Format runs over the text
    pub runs: Vec<FormatRun>,

    /// Annotations attached at positions without covering text
    pub anchors: Vec<Anchor>,

    /// Paragraph alignment
    pub alignment: Alignment,

    /// Paragraph style id
    pub style_id: Option<String>,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Append text with a format. Plain formats add no run.
    pub fn push_text(&mut self, text: &str, format: &CharFormat) {
        let start = self.char_len();
        let length = text.chars().count();
        self.text.push_str(text);
        super::format::push_run(&mut self.runs, start, length, format);
    }

    /// Build a paragraph from an inline element tree.
    ///
    /// Fails with [`Error::InternalConsistency`] if the flattened runs do not
    /// cover exactly the tree's text.
    pub fn from_elements(
        elements: &[InlineElement],
        resolver: &dyn StyleResolver,
    ) -> Result<Self> {
        let text = elements_text(elements);
        let (runs, anchors) = build_format_runs(elements, resolver, text.chars().count())?;
        Ok(Self {
            text,
            runs,
            anchors,
            ..Default::default()
        })
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Check if the paragraph has no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Format at a character offset (plain if no run covers it).
    pub fn format_at(&self, offset: usize) -> CharFormat {
        self.runs
            .iter()
            .find(|run| run.contains(offset))
            .map(|run| run.format.clone())
            .unwrap_or_default()
    }

    /// Verify run ordering, bounds and anchor offsets.
    pub fn validate(&self) -> Result<()> {
        let len = self.char_len();
        let mut cursor = 0;
        for run in &self.runs {
            if run.length == 0 || run.start < cursor || run.end() > len {
                return Err(Error::InternalConsistency(format!(
                    "run {}+{} out of order or outside text of length {}",
                    run.start, run.length, len
                )));
            }
            cursor = run.end();
        }
        if let Some(anchor) = self.anchors.iter().find(|a| a.offset > len) {
            return Err(Error::InternalConsistency(format!(
                "anchor at {} outside text of length {}",
                anchor.offset, len
            )));
        }
        Ok(())
    }
}

/// An annotation attached at a character offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// Character offset (may equal the text length)
    pub offset: usize,

    /// The attached annotation
    pub annotation: Annotation,
}

/// Text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

impl Alignment {
    /// Markup attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

impl FromStr for Alignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            "justify" => Ok(Alignment::Justify),
            _ => Err(Error::Parse(format!("invalid alignment '{}'", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InlineStyle;
    use crate::style::StyleSheet;

    #[test]
    fn test_push_text_builds_runs() {
        let mut p = Paragraph::new();
        p.push_text("Hello ", &CharFormat::default());
        p.push_text("world", &CharFormat::bold());
        p.push_text("!", &CharFormat::default());

        assert_eq!(p.text, "Hello world!");
        assert_eq!(p.runs, vec![FormatRun::new(6, 5, CharFormat::bold())]);
        assert!(p.format_at(6).bold);
        assert!(!p.format_at(11).bold);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_from_elements() {
        let styles = StyleSheet::new();
        let elements = vec![
            InlineElement::text("a"),
            InlineElement::styled(InlineStyle::Italic, vec![InlineElement::text("bc")]),
        ];
        let p = Paragraph::from_elements(&elements, &styles).unwrap();
        assert_eq!(p.text, "abc");
        assert_eq!(p.runs, vec![FormatRun::new(1, 2, CharFormat::italic())]);
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let p = Paragraph {
            text: "abcdef".to_string(),
            runs: vec![
                FormatRun::new(0, 3, CharFormat::bold()),
                FormatRun::new(2, 2, CharFormat::italic()),
            ],
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(Error::InternalConsistency(_))));
    }

    #[test]
    fn test_alignment_parse() {
        assert_eq!("Center".parse::<Alignment>().unwrap(), Alignment::Center);
        assert_eq!(Alignment::Justify.as_str(), "justify");
        assert!("middle".parse::<Alignment>().is_err());
    }
}
