//! Plain text rendering for KML documents.

use crate::document::Document;
use crate::layout::LayoutEngine;

/// Convert a document to plain text, one line per paragraph.
pub fn to_text<E: LayoutEngine>(doc: &Document<E>) -> String {
    let mut output = doc.plain_text();
    if !output.is_empty() {
        output.push('\n');
    }
    output
}
