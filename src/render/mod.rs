//! Rendering module for converting documents to output formats.

mod json;
mod kml;
mod text;

pub use json::{to_json, JsonFormat};
pub use kml::{paragraph_inner_kml, paragraph_to_kml, to_kml, KmlSerializer};
pub use text::to_text;
