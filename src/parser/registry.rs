//! KML tag vocabulary.
//!
//! Single source of truth for tag names and aliases, used by both the
//! parser and the serializer.

use crate::model::{AnnotationKind, InlineStyle, ScriptPosition};
use std::borrow::Cow;

/// Classification of a KML tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Document root (`kml`, `document`, `doc`)
    Root,
    /// Paragraph block (`p`, `paragraph`)
    Block,
    /// `b`, `bold`, `strong`
    Bold,
    /// `i`, `italic`, `em`
    Italic,
    /// `u`, `underline`
    Underline,
    /// `s`, `strike`, `strikethrough`
    Strikethrough,
    /// `sub`, `subscript`
    Subscript,
    /// `sup`, `superscript`
    Superscript,
    /// `a`
    Link,
    /// `span`
    Span,
    /// `t`, `text`
    TextRun,
    /// Metadata tags
    Metadata(AnnotationKind),
}

/// Classify a tag name, or `None` for unknown tags.
pub fn classify(tag: &str) -> Option<TagKind> {
    let kind = match tag {
        "kml" | "document" | "doc" => TagKind::Root,
        "p" | "paragraph" => TagKind::Block,
        "b" | "bold" | "strong" => TagKind::Bold,
        "i" | "italic" | "em" => TagKind::Italic,
        "u" | "underline" => TagKind::Underline,
        "s" | "strike" | "strikethrough" => TagKind::Strikethrough,
        "sub" | "subscript" => TagKind::Subscript,
        "sup" | "superscript" => TagKind::Superscript,
        "a" => TagKind::Link,
        "span" => TagKind::Span,
        "t" | "text" => TagKind::TextRun,
        "comment" => TagKind::Metadata(AnnotationKind::Comment),
        "todo" => TagKind::Metadata(AnnotationKind::Todo),
        "footnote" => TagKind::Metadata(AnnotationKind::Footnote),
        "charref" => TagKind::Metadata(AnnotationKind::CharacterRef),
        "locref" => TagKind::Metadata(AnnotationKind::LocationRef),
        _ => return None,
    };
    Some(kind)
}

/// Check whether a tag is a boolean/script formatting tag.
pub fn is_formatting_tag(tag: &str) -> bool {
    matches!(
        classify(tag),
        Some(
            TagKind::Bold
                | TagKind::Italic
                | TagKind::Underline
                | TagKind::Strikethrough
                | TagKind::Subscript
                | TagKind::Superscript
        )
    )
}

/// Check whether a tag is a metadata tag.
pub fn is_metadata_tag(tag: &str) -> bool {
    matches!(classify(tag), Some(TagKind::Metadata(_)))
}

/// Inline style of an attribute-free formatting tag.
pub(crate) fn simple_style(kind: TagKind) -> Option<InlineStyle> {
    match kind {
        TagKind::Bold => Some(InlineStyle::Bold),
        TagKind::Italic => Some(InlineStyle::Italic),
        TagKind::Underline => Some(InlineStyle::Underline),
        TagKind::Strikethrough => Some(InlineStyle::Strikethrough),
        TagKind::Subscript => Some(InlineStyle::Subscript),
        TagKind::Superscript => Some(InlineStyle::Superscript),
        _ => None,
    }
}

/// Canonical tag written for a script position.
pub fn script_tag(script: ScriptPosition) -> Option<&'static str> {
    match script {
        ScriptPosition::Normal => None,
        ScriptPosition::Subscript => Some("sub"),
        ScriptPosition::Superscript => Some("sup"),
    }
}

/// Canonical tag name of a metadata kind.
pub fn metadata_tag(kind: AnnotationKind) -> &'static str {
    match kind {
        AnnotationKind::Comment => "comment",
        AnnotationKind::Todo => "todo",
        AnnotationKind::Footnote => "footnote",
        AnnotationKind::CharacterRef => "charref",
        AnnotationKind::LocationRef => "locref",
    }
}

/// Attributes accepted on a metadata tag.
pub fn metadata_attributes(kind: AnnotationKind) -> &'static [&'static str] {
    match kind {
        AnnotationKind::Comment => &["id", "author", "created", "resolved"],
        AnnotationKind::Todo => &["id", "completed", "priority"],
        AnnotationKind::Footnote => &["id", "number"],
        AnnotationKind::CharacterRef | AnnotationKind::LocationRef => &["id", "target"],
    }
}

/// Escape `&`, `<`, `>`, `"` and `'` for text or attribute values.
pub fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Replace predefined entities and character references with their characters.
pub fn unescape(text: &str) -> crate::Result<Cow<'_, str>> {
    quick_xml::escape::unescape(text).map_err(|e| crate::Error::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        for tag in ["b", "bold", "strong"] {
            assert_eq!(classify(tag), Some(TagKind::Bold));
        }
        for tag in ["s", "strike", "strikethrough"] {
            assert_eq!(classify(tag), Some(TagKind::Strikethrough));
        }
        assert_eq!(
            classify("charref"),
            Some(TagKind::Metadata(AnnotationKind::CharacterRef))
        );
        assert_eq!(classify("table"), None);
    }

    #[test]
    fn test_tag_predicates() {
        assert!(is_formatting_tag("em"));
        assert!(!is_formatting_tag("comment"));
        assert!(is_metadata_tag("locref"));
        assert!(!is_metadata_tag("span"));
    }

    #[test]
    fn test_escape_roundtrip() {
        let raw = r#"a < b && c > "d" 'e'"#;
        let escaped = escape(raw);
        assert_eq!(
            escaped,
            "a &lt; b &amp;&amp; c &gt; &quot;d&quot; &apos;e&apos;"
        );
        assert_eq!(unescape(&escaped).unwrap(), raw);
        assert!(unescape("&bogus;").is_err());
    }
}
