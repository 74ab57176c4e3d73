//! Serialize/parse round trips through the KML writer.

use kmlview::render::{paragraph_inner_kml, to_kml, KmlSerializer};
use kmlview::{
    Alignment, Annotation, Document, InlineElement, InlineStyle, Paragraph, StyleSheet,
};
use proptest::prelude::*;

fn text() -> impl Strategy<Value = String> {
    "[a-z <>&\"']{0,6}"
}

fn style() -> impl Strategy<Value = InlineStyle> {
    prop_oneof![
        Just(InlineStyle::Bold),
        Just(InlineStyle::Italic),
        Just(InlineStyle::Underline),
        Just(InlineStyle::Strikethrough),
        Just(InlineStyle::Subscript),
        Just(InlineStyle::Superscript),
        "[a-z]{1,4}".prop_map(|href| InlineStyle::Link {
            href: format!("http://{}?a&b", href)
        }),
    ]
}

fn element() -> impl Strategy<Value = InlineElement> {
    let leaf = prop_oneof![
        4 => text().prop_map(InlineElement::text),
        1 => (0u32..9).prop_map(|n| InlineElement::anchor(Annotation::Footnote {
            id: None,
            number: Some(n),
        })),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (style(), prop::collection::vec(inner.clone(), 0..4))
                .prop_map(|(style, children)| InlineElement::styled(style, children)),
            prop::collection::vec(inner, 0..4).prop_map(InlineElement::group),
        ]
    })
}

proptest! {
    #[test]
    fn paragraph_survives_kml_round_trip(elements in prop::collection::vec(element(), 0..5)) {
        let styles = StyleSheet::new();
        let paragraph = Paragraph::from_elements(&elements, &styles).unwrap();
        prop_assert!(paragraph.validate().is_ok());

        let kml = paragraph_inner_kml(&paragraph);
        let parsed = kmlview::parse_paragraph(&kml).unwrap();
        prop_assert_eq!(&parsed, &paragraph);
        prop_assert_eq!(paragraph_inner_kml(&parsed), kml);
    }
}

#[test]
fn test_document_round_trip() {
    let source = concat!(
        "<kml>",
        r#"<p align="center" style="title">A <b>bold</b> start</p>"#,
        "<p/>",
        r#"<p><comment id="c" author="ann" resolved="true">noted</comment> text<footnote number="3"/></p>"#,
        r##"<p><span style="quiet" color="#102030"><i>styled</i></span> &amp; escaped &lt;x&gt;</p>"##,
        r#"<p><todo completed="1" priority="low">done</todo><sub>2</sub><locref target="rome"/></p>"#,
        "</kml>",
    );
    let doc = kmlview::load_str(source).unwrap();
    let kml = to_kml(&doc);

    let reloaded = kmlview::load_str(&kml).unwrap();
    assert_eq!(reloaded.paragraphs(), doc.paragraphs());
    assert_eq!(to_kml(&reloaded), kml);

    assert_eq!(doc.paragraph(0).unwrap().alignment, Alignment::Center);
    assert!(kml.contains("<p/>"));
}

#[test]
fn test_indented_output_reloads() {
    let doc = kmlview::load_str("<p>one</p><p><u>two</u></p>").unwrap();
    let kml = KmlSerializer::new().indented(true).serialize(&doc);
    assert_eq!(kml, "<kml>\n  <p>one</p>\n  <p><u>two</u></p>\n</kml>\n");

    let reloaded = kmlview::load_str(&kml).unwrap();
    assert_eq!(reloaded.paragraphs(), doc.paragraphs());
}

#[test]
fn test_edited_document_round_trip() {
    let mut doc = Document::new();
    doc.load_kml("<p>keep</p>").unwrap();
    doc.push_paragraph(Paragraph::with_text("a < b & c")).unwrap();
    doc.insert_kml(0, r#"<a href="x">first</a>"#).unwrap();

    let reloaded = kmlview::load_str(&to_kml(&doc)).unwrap();
    assert_eq!(reloaded.paragraphs(), doc.paragraphs());
    assert_eq!(reloaded.plain_text(), "first\nkeep\na < b & c");
}
