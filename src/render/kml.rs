//! KML serialization.
//!
//! Writes paragraphs back to markup that parses to the same text, runs and
//! anchors. Each run is wrapped in a fixed tag order: annotations, link,
//! span, then b, i, u, s and sub/sup.

use crate::document::Document;
use crate::layout::LayoutEngine;
use crate::model::{Alignment, Anchor, Annotation, CharFormat, Paragraph};
use crate::parser::registry::{escape, metadata_tag, script_tag};

/// Serializer from paragraphs to KML.
#[derive(Debug, Clone, Copy, Default)]
pub struct KmlSerializer {
    indent: bool,
}

impl KmlSerializer {
    /// Create a serializer producing compact output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put each paragraph on its own indented line.
    pub fn indented(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Serialize a document.
    pub fn serialize<E: LayoutEngine>(&self, doc: &Document<E>) -> String {
        self.serialize_paragraphs(doc.paragraphs())
    }

    /// Serialize a sequence of paragraphs under a `<kml>` root.
    pub fn serialize_paragraphs(&self, paragraphs: &[Paragraph]) -> String {
        let mut out = String::from("<kml>");
        for paragraph in paragraphs {
            if self.indent {
                out.push_str("\n  ");
            }
            write_block(&mut out, paragraph);
        }
        if self.indent {
            out.push('\n');
        }
        out.push_str("</kml>");
        if self.indent {
            out.push('\n');
        }
        out
    }
}

/// Serialize a document as compact KML.
pub fn to_kml<E: LayoutEngine>(doc: &Document<E>) -> String {
    KmlSerializer::new().serialize(doc)
}

/// Serialize one paragraph as a `<p>` block.
pub fn paragraph_to_kml(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    write_block(&mut out, paragraph);
    out
}

/// Serialize the content of one paragraph, without the `<p>` wrapper.
pub fn paragraph_inner_kml(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    write_content(&mut out, paragraph);
    out
}

fn write_block(out: &mut String, paragraph: &Paragraph) {
    out.push_str("<p");
    if paragraph.alignment != Alignment::Left {
        write_attr(out, "align", paragraph.alignment.as_str());
    }
    if let Some(style) = paragraph.style_id.as_deref() {
        write_attr(out, "style", style);
    }
    if paragraph.text.is_empty() && paragraph.anchors.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    write_content(out, paragraph);
    out.push_str("</p>");
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
}

fn write_content(out: &mut String, paragraph: &Paragraph) {
    let text = &paragraph.text;
    let mut bytes: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
    bytes.push(text.len());
    let len = bytes.len() - 1;

    let mut cuts = vec![0, len];
    for run in &paragraph.runs {
        cuts.push(run.start);
        cuts.push(run.end());
    }
    cuts.extend(paragraph.anchors.iter().map(|a| a.offset));
    cuts.retain(|&c| c <= len);
    cuts.sort_unstable();
    cuts.dedup();

    let mut anchors: Vec<&Anchor> = paragraph.anchors.iter().collect();
    anchors.sort_by_key(|a| a.offset);
    let mut next_anchor = 0;
    let mut run = 0;

    for pair in cuts.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        while next_anchor < anchors.len() && anchors[next_anchor].offset <= start {
            write_annotation(out, &anchors[next_anchor].annotation, true);
            next_anchor += 1;
        }
        while run < paragraph.runs.len() && paragraph.runs[run].end() <= start {
            run += 1;
        }
        let format = paragraph
            .runs
            .get(run)
            .filter(|r| r.start <= start)
            .map(|r| &r.format);
        write_segment(out, format, &text[bytes[start]..bytes[end]]);
    }
    for anchor in &anchors[next_anchor..] {
        write_annotation(out, &anchor.annotation, true);
    }
}

fn write_segment(out: &mut String, format: Option<&CharFormat>, text: &str) {
    let Some(format) = format.filter(|f| !f.is_plain()) else {
        out.push_str(&escape(text));
        return;
    };

    let mut closers: Vec<&'static str> = Vec::new();
    for annotation in &format.annotations {
        write_annotation(out, annotation, false);
        closers.push(metadata_tag(annotation.kind()));
    }
    if let Some(href) = format.link.as_deref() {
        out.push_str("<a");
        write_attr(out, "href", href);
        out.push('>');
        closers.push("a");
    }
    if format.char_style.is_some() || format.color.is_some() {
        out.push_str("<span");
        if let Some(style) = format.char_style.as_deref() {
            write_attr(out, "style", style);
        }
        if let Some(color) = format.color {
            write_attr(out, "color", &color.to_string());
        }
        out.push('>');
        closers.push("span");
    }
    for (on, tag) in [
        (format.bold, "b"),
        (format.italic, "i"),
        (format.underline, "u"),
        (format.strikethrough, "s"),
    ] {
        if on {
            out.push_str(&format!("<{}>", tag));
            closers.push(tag);
        }
    }
    if let Some(tag) = script_tag(format.script) {
        out.push_str(&format!("<{}>", tag));
        closers.push(tag);
    }

    out.push_str(&escape(text));
    for tag in closers.iter().rev() {
        out.push_str(&format!("</{}>", tag));
    }
}

fn write_annotation(out: &mut String, annotation: &Annotation, empty: bool) {
    out.push('<');
    out.push_str(metadata_tag(annotation.kind()));
    if let Some(id) = annotation.id() {
        write_attr(out, "id", id);
    }
    match annotation {
        Annotation::Comment {
            author,
            created,
            resolved,
            ..
        } => {
            if let Some(author) = author {
                write_attr(out, "author", author);
            }
            if let Some(created) = created {
                write_attr(out, "created", &created.to_rfc3339());
            }
            if *resolved {
                write_attr(out, "resolved", "true");
            }
        }
        Annotation::Todo {
            completed,
            priority,
            ..
        } => {
            if *completed {
                write_attr(out, "completed", "true");
            }
            if let Some(priority) = priority {
                write_attr(out, "priority", priority);
            }
        }
        Annotation::Footnote { number, .. } => {
            if let Some(number) = number {
                write_attr(out, "number", &number.to_string());
            }
        }
        Annotation::CharacterRef { target, .. } | Annotation::LocationRef { target, .. } => {
            if let Some(target) = target {
                write_attr(out, "target", target);
            }
        }
    }
    out.push_str(if empty { "/>" } else { ">" });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CharFormat, FormatRun};
    use crate::parser::parse_paragraph;

    #[test]
    fn test_plain_and_empty_paragraphs() {
        assert_eq!(paragraph_to_kml(&Paragraph::with_text("a < b")), "<p>a &lt; b</p>");
        assert_eq!(paragraph_to_kml(&Paragraph::new()), "<p/>");
    }

    #[test]
    fn test_block_attributes() {
        let p = Paragraph {
            text: "x".to_string(),
            alignment: Alignment::Justify,
            style_id: Some("body".to_string()),
            ..Default::default()
        };
        assert_eq!(
            paragraph_to_kml(&p),
            r#"<p align="justify" style="body">x</p>"#
        );
    }

    #[test]
    fn test_tag_order() {
        let format = CharFormat {
            bold: true,
            italic: true,
            link: Some("http://a?b&c".to_string()),
            ..Default::default()
        };
        let p = Paragraph {
            text: "ab".to_string(),
            runs: vec![FormatRun::new(1, 1, format)],
            ..Default::default()
        };
        assert_eq!(
            paragraph_inner_kml(&p),
            r#"a<a href="http://a?b&amp;c"><b><i>b</i></b></a>"#
        );
    }

    #[test]
    fn test_every_tag_closes_in_reverse_order() {
        let format = CharFormat {
            underline: true,
            strikethrough: true,
            script: crate::model::ScriptPosition::Subscript,
            char_style: Some("q\"uote".to_string()),
            ..Default::default()
        };
        let p = Paragraph {
            text: "x".to_string(),
            runs: vec![FormatRun::new(0, 1, format)],
            ..Default::default()
        };
        assert_eq!(
            paragraph_inner_kml(&p),
            r#"<span style="q&quot;uote"><u><s><sub>x</sub></s></u></span>"#
        );
    }

    #[test]
    fn test_anchor_inside_run_roundtrips() {
        let p = parse_paragraph(r#"<b>ab<footnote id="n" number="1"/>cd</b>"#).unwrap();
        let kml = paragraph_inner_kml(&p);
        assert_eq!(
            kml,
            r#"<b>ab</b><footnote id="n" number="1"/><b>cd</b>"#
        );
        assert_eq!(parse_paragraph(&kml).unwrap(), p);
    }

    #[test]
    fn test_indented_document() {
        let paragraphs = vec![Paragraph::with_text("a"), Paragraph::with_text("b")];
        let kml = KmlSerializer::new().indented(true).serialize_paragraphs(&paragraphs);
        assert_eq!(kml, "<kml>\n  <p>a</p>\n  <p>b</p>\n</kml>\n");
        let compact = KmlSerializer::new().serialize_paragraphs(&paragraphs);
        assert_eq!(compact, "<kml><p>a</p><p>b</p></kml>");
    }
}
