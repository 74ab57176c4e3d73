//! KML markup parsing module.

mod markup;
mod options;
mod ranges;
pub mod registry;
mod tokens;
mod tree;

pub use markup::MarkupParser;
pub use options::LoadOptions;
pub use ranges::build_format_runs;
pub use tree::parse_elements;

use crate::error::Result;
use crate::model::Paragraph;
use crate::style::StyleSheet;

/// Parse paragraph inner markup with no named styles defined.
pub fn parse_paragraph(markup: &str) -> Result<Paragraph> {
    MarkupParser::new(&StyleSheet::new()).parse_paragraph(markup)
}
