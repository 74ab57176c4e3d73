//! Height index and lazy layout.
//!
//! Paragraph heights live in a [`HeightTree`] seeded with estimates. The
//! [`LazyLayoutCache`] materializes layouts through a [`LayoutEngine`] only
//! for the paragraphs that are asked for and replaces estimates with
//! measured heights as it goes.

mod cache;
mod engine;
mod height_tree;
mod options;

pub use cache::{HeightChange, LazyLayoutCache, HEIGHT_EPSILON};
pub use engine::{
    wrap_lines, EstimateMetrics, LayoutEngine, LineBox, MeasuredLayout, MonospaceEngine, TextLayout,
};
pub use height_tree::HeightTree;
pub use options::{FontSpec, LayoutOptions};
