//! JSON rendering for KML documents.

use crate::document::{Document, DocumentStats};
use crate::error::{Error, Result};
use crate::layout::LayoutEngine;
use crate::model::{Alignment, Anchor, FormatRun};
use serde::Serialize;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    stats: DocumentStats,
    total_height: f64,
    paragraphs: Vec<JsonParagraph<'a>>,
}

#[derive(Serialize)]
struct JsonParagraph<'a> {
    index: usize,
    text: &'a str,
    alignment: Alignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<&'a str>,
    runs: &'a [FormatRun],
    anchors: &'a [Anchor],
    y: f64,
    height: f64,
    layouted: bool,
}

/// Convert a document to JSON, including current geometry.
pub fn to_json<E: LayoutEngine>(doc: &Document<E>, format: JsonFormat) -> Result<String> {
    let mut y = 0.0;
    let mut paragraphs = Vec::with_capacity(doc.paragraph_count());
    for (index, paragraph) in doc.paragraphs().iter().enumerate() {
        let height = doc.paragraph_height(index)?;
        paragraphs.push(JsonParagraph {
            index,
            text: &paragraph.text,
            alignment: paragraph.alignment,
            style: paragraph.style_id.as_deref(),
            runs: &paragraph.runs,
            anchors: &paragraph.anchors,
            y,
            height,
            layouted: doc.is_layouted(index)?,
        });
        y += height;
    }

    let output = JsonDocument {
        stats: doc.stats(),
        total_height: doc.total_height(),
        paragraphs,
    };
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&output),
        JsonFormat::Compact => serde_json::to_string(&output),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.load_kml(r#"<kml><p>Hello</p><p align="center"><b>World</b><footnote id="f"/></p></kml>"#)
            .unwrap();
        doc
    }

    #[test]
    fn test_to_json_pretty() {
        let mut doc = sample();
        doc.ensure_layouted(0, 0).unwrap();
        let json = to_json(&doc, JsonFormat::Pretty).unwrap();
        assert!(json.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stats"]["paragraphs"], 2);
        assert_eq!(value["paragraphs"][0]["layouted"], true);
        assert_eq!(value["paragraphs"][1]["layouted"], false);
        assert_eq!(value["paragraphs"][1]["alignment"], "center");
        assert_eq!(value["paragraphs"][1]["runs"][0]["format"]["bold"], true);
        assert_eq!(value["paragraphs"][1]["anchors"][0]["offset"], 5);
        assert_eq!(
            value["paragraphs"][1]["y"].as_f64(),
            Some(doc.paragraph_y(1).unwrap())
        );
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }
}
