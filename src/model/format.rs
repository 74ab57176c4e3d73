//! Character formats and format runs.

use super::InlineStyle;
use crate::error::{Error, Result};
use crate::style::StyleResolver;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A contiguous, half-open character range `[start, start + length)` within
/// one paragraph and the resolved format active over it.
///
/// Offsets count decoded characters (Unicode scalar values), not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRun {
    /// First character covered by the run
    pub start: usize,

    /// Number of characters covered
    pub length: usize,

    /// Resolved format over the range
    pub format: CharFormat,
}

impl FormatRun {
    /// Create a new format run.
    pub fn new(start: usize, length: usize, format: CharFormat) -> Self {
        Self {
            start,
            length,
            format,
        }
    }

    /// One past the last character covered by the run.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Check whether the run covers a character offset.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }
}

/// Append a run, merging it into the previous one when the two are adjacent
/// and carry the same format. Keeps run lists canonical.
pub(crate) fn push_run(runs: &mut Vec<FormatRun>, start: usize, length: usize, format: &CharFormat) {
    if length == 0 || format.is_plain() {
        return;
    }
    if let Some(last) = runs.last_mut() {
        if last.end() == start && last.format == *format {
            last.length += length;
            return;
        }
    }
    runs.push(FormatRun::new(start, length, format.clone()));
}

/// Vertical script position of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptPosition {
    /// Baseline text
    #[default]
    Normal,
    /// Subscript
    Subscript,
    /// Superscript
    Superscript,
}

/// An RGB color, written as `#rrggbb` in markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red component
    pub r: u8,
    /// Green component
    pub g: u8,
    /// Blue component
    pub b: u8,
}

impl Color {
    /// Create a color from its components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| Error::Parse(format!("invalid color '{}'", s)))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::Parse(format!("invalid color '{}'", s)))
        };
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Metadata annotation attached to text or to a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Annotation {
    /// Editorial comment
    Comment {
        /// Comment id
        id: Option<String>,
        /// Comment author
        author: Option<String>,
        /// Creation timestamp
        created: Option<DateTime<Utc>>,
        /// Whether the comment has been resolved
        resolved: bool,
    },

    /// Work item
    Todo {
        /// Todo id
        id: Option<String>,
        /// Whether the todo is done
        completed: bool,
        /// Free-form priority
        priority: Option<String>,
    },

    /// Footnote reference
    Footnote {
        /// Footnote id
        id: Option<String>,
        /// Display number
        number: Option<u32>,
    },

    /// Reference to a character entry
    CharacterRef {
        /// Reference id
        id: Option<String>,
        /// Referenced character
        target: Option<String>,
    },

    /// Reference to a location entry
    LocationRef {
        /// Reference id
        id: Option<String>,
        /// Referenced location
        target: Option<String>,
    },
}

/// Discriminant of an [`Annotation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    /// `<comment>`
    Comment,
    /// `<todo>`
    Todo,
    /// `<footnote>`
    Footnote,
    /// `<charref>`
    CharacterRef,
    /// `<locref>`
    LocationRef,
}

impl Annotation {
    /// Get the annotation kind.
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Comment { .. } => AnnotationKind::Comment,
            Annotation::Todo { .. } => AnnotationKind::Todo,
            Annotation::Footnote { .. } => AnnotationKind::Footnote,
            Annotation::CharacterRef { .. } => AnnotationKind::CharacterRef,
            Annotation::LocationRef { .. } => AnnotationKind::LocationRef,
        }
    }

    /// Get the annotation id, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Annotation::Comment { id, .. }
            | Annotation::Todo { id, .. }
            | Annotation::Footnote { id, .. }
            | Annotation::CharacterRef { id, .. }
            | Annotation::LocationRef { id, .. } => id.as_deref(),
        }
    }
}

/// Resolved character format of a run.
///
/// Booleans accumulate through nesting; scalars (script position, color,
/// link, character style) take the value of the innermost tag that sets them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharFormat {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Underlined text
    pub underline: bool,

    /// Strikethrough text
    pub strikethrough: bool,

    /// Script position
    pub script: ScriptPosition,

    /// Text color
    pub color: Option<Color>,

    /// Hyperlink target
    pub link: Option<String>,

    /// Named character style the format was resolved from
    pub char_style: Option<String>,

    /// Metadata annotations, outermost first, at most one per kind
    pub annotations: Vec<Annotation>,
}

impl CharFormat {
    /// Bold-only format.
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Default::default()
        }
    }

    /// Italic-only format.
    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Default::default()
        }
    }

    /// Check whether the format carries no attribute at all.
    pub fn is_plain(&self) -> bool {
        *self == CharFormat::default()
    }

    /// Get the annotation of a given kind.
    pub fn annotation(&self, kind: AnnotationKind) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.kind() == kind)
    }

    /// Attach an annotation, replacing one of the same kind.
    pub fn set_annotation(&mut self, annotation: Annotation) {
        match self
            .annotations
            .iter_mut()
            .find(|a| a.kind() == annotation.kind())
        {
            Some(slot) => *slot = annotation,
            None => self.annotations.push(annotation),
        }
    }

    /// Compose an inline style into this format.
    ///
    /// This is the single composition rule shared by the streaming parser
    /// and the format range builder.
    pub fn apply(&mut self, style: &InlineStyle, resolver: &dyn StyleResolver) {
        match style {
            InlineStyle::Bold => self.bold = true,
            InlineStyle::Italic => self.italic = true,
            InlineStyle::Underline => self.underline = true,
            InlineStyle::Strikethrough => self.strikethrough = true,
            InlineStyle::Subscript => self.script = ScriptPosition::Subscript,
            InlineStyle::Superscript => self.script = ScriptPosition::Superscript,
            InlineStyle::Link { href } => self.link = Some(href.clone()),
            InlineStyle::CharStyle { style_id, color } => {
                if let Some(id) = style_id {
                    let resolved = resolver.resolve_character_style(id);
                    self.bold |= resolved.bold;
                    self.italic |= resolved.italic;
                    self.underline |= resolved.underline;
                    self.strikethrough |= resolved.strikethrough;
                    if resolved.color.is_some() {
                        self.color = resolved.color;
                    }
                    self.char_style = Some(id.clone());
                }
                if color.is_some() {
                    self.color = *color;
                }
            }
            InlineStyle::Annotation(annotation) => self.set_annotation(annotation.clone()),
        }
    }

    /// Return a copy with `style` composed in.
    pub fn with(&self, style: &InlineStyle, resolver: &dyn StyleResolver) -> Self {
        let mut next = self.clone();
        next.apply(style, resolver);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{StyleDef, StyleSheet};

    #[test]
    fn test_color_parse_and_display() {
        let color: Color = "#FF8000".parse().unwrap();
        assert_eq!(color, Color::rgb(255, 128, 0));
        assert_eq!(color.to_string(), "#ff8000");

        assert!("ff8000".parse::<Color>().is_err());
        assert!("#ff80".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn test_booleans_accumulate() {
        let styles = StyleSheet::new();
        let format = CharFormat::default()
            .with(&InlineStyle::Italic, &styles)
            .with(&InlineStyle::Bold, &styles);
        assert!(format.bold && format.italic);
        assert!(!format.underline);
    }

    #[test]
    fn test_scalars_last_writer_wins() {
        let styles = StyleSheet::new();
        let format = CharFormat::default()
            .with(&InlineStyle::Subscript, &styles)
            .with(&InlineStyle::Superscript, &styles);
        assert_eq!(format.script, ScriptPosition::Superscript);

        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);
        let format = CharFormat::default()
            .with(
                &InlineStyle::CharStyle {
                    style_id: None,
                    color: Some(red),
                },
                &styles,
            )
            .with(
                &InlineStyle::CharStyle {
                    style_id: None,
                    color: Some(blue),
                },
                &styles,
            );
        assert_eq!(format.color, Some(blue));
    }

    #[test]
    fn test_char_style_resolution() {
        let mut styles = StyleSheet::new();
        styles.insert(StyleDef {
            bold: Some(true),
            color: Some(Color::rgb(0, 128, 0)),
            ..StyleDef::new("emphasis")
        });

        let format = CharFormat::italic().with(
            &InlineStyle::CharStyle {
                style_id: Some("emphasis".to_string()),
                color: None,
            },
            &styles,
        );
        assert!(format.bold && format.italic);
        assert_eq!(format.color, Some(Color::rgb(0, 128, 0)));
        assert_eq!(format.char_style.as_deref(), Some("emphasis"));
    }

    #[test]
    fn test_inner_annotation_replaces_same_kind() {
        let styles = StyleSheet::new();
        let outer = Annotation::Todo {
            id: Some("t1".to_string()),
            completed: false,
            priority: None,
        };
        let inner = Annotation::Todo {
            id: Some("t2".to_string()),
            completed: true,
            priority: None,
        };
        let note = Annotation::Footnote {
            id: None,
            number: Some(1),
        };
        let format = CharFormat::default()
            .with(&InlineStyle::Annotation(outer), &styles)
            .with(&InlineStyle::Annotation(note), &styles)
            .with(&InlineStyle::Annotation(inner), &styles);

        assert_eq!(format.annotations.len(), 2);
        assert_eq!(
            format.annotation(AnnotationKind::Todo).and_then(|a| a.id()),
            Some("t2")
        );
    }

    #[test]
    fn test_push_run_coalesces_adjacent_equal_formats() {
        let mut runs = Vec::new();
        push_run(&mut runs, 0, 3, &CharFormat::bold());
        push_run(&mut runs, 3, 2, &CharFormat::bold());
        push_run(&mut runs, 5, 4, &CharFormat::default());
        push_run(&mut runs, 9, 1, &CharFormat::bold());

        assert_eq!(
            runs,
            vec![
                FormatRun::new(0, 5, CharFormat::bold()),
                FormatRun::new(9, 1, CharFormat::bold()),
            ]
        );
    }
}
