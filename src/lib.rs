//! # kmlview
//!
//! Lazy-layout document core for large KML documents.
//!
//! A document is an ordered sequence of paragraphs (plain text plus
//! flattened format runs). Paragraph heights live in a height index so the
//! Y position of any paragraph, and the paragraph at any Y, are answered in
//! logarithmic time. Expensive layout objects are created only for the
//! paragraphs inside the viewport and released again as it moves.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kmlview::KmlView;
//!
//! fn main() -> kmlview::Result<()> {
//!     let mut doc = KmlView::new()
//!         .with_line_width(640.0)
//!         .load_file("chapter.kml")?;
//!
//!     // Lay out what is visible at the top of the document.
//!     if let Some(visible) = doc.layout_viewport(0.0, 900.0)? {
//!         for index in visible {
//!             println!("{} at y={}", index, doc.paragraph_y(index)?);
//!         }
//!     }
//!     println!("total height: {}", doc.total_height());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Height index**: Fenwick tree over paragraph heights
//! - **Lazy layout**: materialize on demand, evict outside the viewport
//! - **Streaming parser**: nested inline markup to canonical format runs
//! - **Parallel loading**: paragraph blocks parse with Rayon
//! - **Output**: KML round trip, JSON with geometry, plain text

pub mod document;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
pub mod render;
pub mod style;

// Re-export commonly used types
pub use document::{Document, DocumentEvent, DocumentListener, DocumentStats, ListenerId, TextStats};
pub use error::{Error, Result};
pub use layout::{
    EstimateMetrics, FontSpec, HeightTree, LayoutEngine, LayoutOptions, LazyLayoutCache,
    MeasuredLayout, MonospaceEngine, TextLayout,
};
pub use model::{
    Alignment, Anchor, Annotation, AnnotationKind, CharFormat, Color, FormatRun, InlineElement,
    InlineStyle, Paragraph, ScriptPosition,
};
pub use parser::{parse_elements, LoadOptions, MarkupParser};
pub use render::{to_json, to_kml, to_text, JsonFormat, KmlSerializer};
pub use style::{ResolvedStyle, StyleDef, StyleResolver, StyleSheet};

use std::path::Path;
use std::sync::Arc;

/// Load a document from a KML string with default options.
///
/// # Example
///
/// ```
/// let doc = kmlview::load_str("<kml><p>Hello</p><p><b>World</b></p></kml>").unwrap();
/// assert_eq!(doc.paragraph_count(), 2);
/// ```
pub fn load_str(kml: &str) -> Result<Document> {
    KmlView::new().load_str(kml)
}

/// Load a document from a KML file with default options.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    KmlView::new().load_file(path)
}

/// Parse the inner markup of one paragraph.
///
/// # Example
///
/// ```
/// let p = kmlview::parse_paragraph("a <i>b</i>").unwrap();
/// assert_eq!(p.text, "a b");
/// assert_eq!(p.runs.len(), 1);
/// ```
pub fn parse_paragraph(markup: &str) -> Result<Paragraph> {
    parser::parse_paragraph(markup)
}

/// Builder bundling load options, layout options and styles.
///
/// # Example
///
/// ```no_run
/// use kmlview::{FontSpec, KmlView};
///
/// let doc = KmlView::new()
///     .sequential()
///     .with_font(FontSpec::new("Georgia", 12.0))
///     .load_file("book.kml")?;
/// # Ok::<(), kmlview::Error>(())
/// ```
pub struct KmlView {
    load_options: LoadOptions,
    layout_options: LayoutOptions,
    styles: Option<StyleSheet>,
}

impl KmlView {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            load_options: LoadOptions::default(),
            layout_options: LayoutOptions::default(),
            styles: None,
        }
    }

    /// Disable parallel parsing.
    pub fn sequential(mut self) -> Self {
        self.load_options = self.load_options.sequential();
        self
    }

    /// Set the load options.
    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    /// Set the layout options.
    pub fn with_layout_options(mut self, options: LayoutOptions) -> Self {
        self.layout_options = options;
        self
    }

    /// Set the line width.
    pub fn with_line_width(mut self, width: f64) -> Self {
        self.layout_options = self.layout_options.with_line_width(width);
        self
    }

    /// Set the layout font.
    pub fn with_font(mut self, font: FontSpec) -> Self {
        self.layout_options = self.layout_options.with_font(font);
        self
    }

    /// Resolve named styles through a style sheet.
    pub fn with_styles(mut self, styles: StyleSheet) -> Self {
        self.styles = Some(styles);
        self
    }

    /// Build an empty document with these options.
    pub fn document(self) -> Document {
        self.document_with_engine(MonospaceEngine::new())
    }

    /// Build an empty document laid out by a custom engine.
    pub fn document_with_engine<E: LayoutEngine>(self, engine: E) -> Document<E> {
        let styles: Arc<dyn StyleResolver> = Arc::new(self.styles.unwrap_or_default());
        Document::with_engine(engine)
            .with_layout_options(self.layout_options)
            .with_load_options(self.load_options)
            .with_styles(styles)
    }

    /// Load a document from a KML string.
    pub fn load_str(self, kml: &str) -> Result<Document> {
        let mut doc = self.document();
        doc.load_kml(kml)?;
        Ok(doc)
    }

    /// Load a document from a KML file.
    pub fn load_file<P: AsRef<Path>>(self, path: P) -> Result<Document> {
        let mut doc = self.document();
        doc.load_file(path)?;
        Ok(doc)
    }
}

impl Default for KmlView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_options() {
        let view = KmlView::new()
            .sequential()
            .with_line_width(320.0)
            .with_font(FontSpec::new("Mono", 9.0));
        assert!(!view.load_options.parallel);
        assert_eq!(view.layout_options.line_width, 320.0);

        let doc = view.document();
        assert_eq!(doc.layout_options().font.family, "Mono");
        assert!(!doc.load_options().parallel);
    }

    #[test]
    fn test_builder_styles_reach_parser() {
        let mut styles = StyleSheet::new();
        styles.insert(StyleDef {
            italic: Some(true),
            ..StyleDef::new("aside")
        });
        let doc = KmlView::new()
            .with_styles(styles)
            .load_str(r#"<p><span style="aside">x</span></p>"#)
            .unwrap();
        assert!(doc.paragraph_formats(0).unwrap()[0].format.italic);
    }

    #[test]
    fn test_load_str_error() {
        let err = load_str("<kml><p><b>unclosed</p></kml>").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_load_empty() {
        let doc = load_str("").unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.total_height(), 0.0);
    }
}
