//! Format range builder.
//!
//! Flattens an inline element tree into format runs and anchors using the
//! same composition rule as the streaming parser.

use crate::error::{Error, Result};
use crate::model::format::push_run;
use crate::model::{Anchor, CharFormat, FormatRun, InlineElement};
use crate::style::StyleResolver;

struct RunBuilder<'a> {
    resolver: &'a dyn StyleResolver,
    offset: usize,
    runs: Vec<FormatRun>,
    anchors: Vec<Anchor>,
}

impl RunBuilder<'_> {
    fn walk(&mut self, elements: &[InlineElement], format: &CharFormat) {
        for element in elements {
            match element {
                InlineElement::Text { text } => {
                    let length = text.chars().count();
                    push_run(&mut self.runs, self.offset, length, format);
                    self.offset += length;
                }
                InlineElement::Styled { style, children } => {
                    let inner = format.with(style, self.resolver);
                    self.walk(children, &inner);
                }
                InlineElement::Group { children } => self.walk(children, format),
                InlineElement::Anchor { annotation } => self.anchors.push(Anchor {
                    offset: self.offset,
                    annotation: annotation.clone(),
                }),
            }
        }
    }
}

/// Build the format runs and anchors of an element tree.
///
/// `text_len` is the character length of the tree's concatenated text; a
/// mismatch with the length the walk covers is an
/// [`Error::InternalConsistency`].
pub fn build_format_runs(
    elements: &[InlineElement],
    resolver: &dyn StyleResolver,
    text_len: usize,
) -> Result<(Vec<FormatRun>, Vec<Anchor>)> {
    let mut builder = RunBuilder {
        resolver,
        offset: 0,
        runs: Vec::new(),
        anchors: Vec::new(),
    };
    builder.walk(elements, &CharFormat::default());

    if builder.offset != text_len {
        return Err(Error::InternalConsistency(format!(
            "format runs cover {} characters but the text has {}",
            builder.offset, text_len
        )));
    }
    Ok((builder.runs, builder.anchors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{elements_text, InlineStyle};
    use crate::parser::{parse_elements, MarkupParser};
    use crate::style::StyleSheet;

    #[test]
    fn test_builder_agrees_with_streaming_parser() {
        let styles = StyleSheet::new();
        let markup = r#"x<b>bold <i>both</i></b> <a href="http://x">link</a><sub>2</sub><locref target="home"/>"#;

        let tree = parse_elements(markup).unwrap();
        let text_len = elements_text(&tree).chars().count();
        let (runs, anchors) = build_format_runs(&tree, &styles, text_len).unwrap();
        let streamed = MarkupParser::new(&styles).parse_paragraph(markup).unwrap();

        assert_eq!(text_len, 16);
        assert_eq!(streamed.char_len(), text_len);
        assert_eq!(runs, streamed.runs);
        assert_eq!(anchors, streamed.anchors);
    }

    #[test]
    fn test_length_mismatch_is_internal_error() {
        let styles = StyleSheet::new();
        let tree = vec![InlineElement::styled(
            InlineStyle::Bold,
            vec![InlineElement::text("abc")],
        )];
        let err = build_format_runs(&tree, &styles, 4).unwrap_err();
        assert!(matches!(err, Error::InternalConsistency(_)));
    }
}
