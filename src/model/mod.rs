//! Document model types.
//!
//! Value types shared by the parser, the layout cache and the renderers:
//! paragraphs, their format runs and the inline element tree.

mod element;
pub(crate) mod format;
mod paragraph;

pub use element::{elements_text, InlineElement, InlineStyle};
pub use format::{Annotation, AnnotationKind, CharFormat, Color, FormatRun, ScriptPosition};
pub use paragraph::{Alignment, Anchor, Paragraph};
