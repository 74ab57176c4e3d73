//! Document model.
//!
//! [`Document`] owns the paragraph sequence, its [`HeightTree`] and its
//! [`LazyLayoutCache`], and keeps the three the same length across every
//! mutation. Listeners are notified synchronously after each change.

mod events;
mod stats;

pub use events::{DocumentEvent, DocumentListener, ListenerId};
pub use stats::{DocumentStats, TextStats};

use crate::error::{check_index, Error, Result};
use crate::layout::{FontSpec, HeightTree, LayoutEngine, LayoutOptions, LazyLayoutCache, MonospaceEngine};
use crate::model::{Color, FormatRun, InlineElement, Paragraph};
use crate::parser::{LoadOptions, MarkupParser};
use crate::style::{StyleResolver, StyleSheet};
use events::Listeners;
use log::debug;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;

/// A KML document with height-indexed, lazily laid out paragraphs.
pub struct Document<E: LayoutEngine = MonospaceEngine> {
    paragraphs: Vec<Paragraph>,
    heights: HeightTree,
    cache: LazyLayoutCache<E::Layout>,
    engine: E,
    options: LayoutOptions,
    load_options: LoadOptions,
    styles: Arc<dyn StyleResolver>,
    stats: TextStats,
    listeners: Listeners,
}

impl Document<MonospaceEngine> {
    /// Create an empty document using the monospace reference engine.
    pub fn new() -> Self {
        Self::with_engine(MonospaceEngine::new())
    }
}

impl Default for Document<MonospaceEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: LayoutEngine> fmt::Debug for Document<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("paragraphs", &self.paragraphs.len())
            .field("total_height", &self.heights.total())
            .field("live_layouts", &self.cache.live_count())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E: LayoutEngine> Document<E> {
    /// Create an empty document laid out by `engine`.
    pub fn with_engine(engine: E) -> Self {
        Self {
            paragraphs: Vec::new(),
            heights: HeightTree::new(),
            cache: LazyLayoutCache::new(),
            engine,
            options: LayoutOptions::default(),
            load_options: LoadOptions::default(),
            styles: Arc::new(StyleSheet::new()),
            stats: TextStats::default(),
            listeners: Listeners::default(),
        }
    }

    /// Set the layout options (builder form).
    pub fn with_layout_options(mut self, options: LayoutOptions) -> Self {
        self.set_layout_options(options);
        self
    }

    /// Set the load options (builder form).
    pub fn with_load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    /// Set the style resolver (builder form).
    pub fn with_styles(mut self, styles: Arc<dyn StyleResolver>) -> Self {
        self.styles = styles;
        self
    }

    // ---------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------

    /// Replace the document with parsed KML.
    ///
    /// All-or-nothing: on a parse error the current content is kept.
    pub fn load_kml(&mut self, kml: &str) -> Result<()> {
        let parser = MarkupParser::new(self.styles.as_ref());
        let paragraphs = parser.parse_document(kml, &self.load_options)?;

        let heights = paragraphs
            .iter()
            .map(|p| self.options.estimate_height(p.char_len()))
            .collect();
        let mut stats = TextStats::default();
        for paragraph in &paragraphs {
            stats += TextStats::of(&paragraph.text);
        }

        self.heights = HeightTree::from_heights(heights);
        self.cache = LazyLayoutCache::with_len(paragraphs.len());
        self.paragraphs = paragraphs;
        self.stats = stats;

        debug!(
            "Loaded {} paragraphs ({} characters, estimated height {})",
            self.paragraphs.len(),
            self.stats.characters,
            self.heights.total()
        );
        self.listeners.emit(DocumentEvent::Loaded {
            paragraph_count: self.paragraphs.len(),
        });
        self.emit_total_height();
        Ok(())
    }

    /// Replace the document with a KML file.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let kml = std::fs::read_to_string(path)?;
        self.load_kml(&kml)
    }

    // ---------------------------------------------------------------
    // Access
    // ---------------------------------------------------------------

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Check if the document has no paragraphs.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    /// All paragraphs.
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Paragraph `index`.
    pub fn paragraph(&self, index: usize) -> Result<&Paragraph> {
        self.paragraphs.get(index).ok_or(Error::OutOfRange {
            index,
            count: self.paragraphs.len(),
        })
    }

    /// Plain text of paragraph `index`.
    pub fn paragraph_text(&self, index: usize) -> Result<&str> {
        Ok(&self.paragraph(index)?.text)
    }

    /// Format runs of paragraph `index`.
    pub fn paragraph_formats(&self, index: usize) -> Result<&[FormatRun]> {
        Ok(&self.paragraph(index)?.runs)
    }

    /// Character length of paragraph `index`.
    pub fn paragraph_length(&self, index: usize) -> Result<usize> {
        Ok(self.paragraph(index)?.char_len())
    }

    /// Whole document text, paragraphs joined with `\n`.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Style resolver used when parsing.
    pub fn styles(&self) -> &dyn StyleResolver {
        self.styles.as_ref()
    }

    /// Replace the style resolver. Already parsed paragraphs keep their
    /// resolved formats.
    pub fn set_styles(&mut self, styles: Arc<dyn StyleResolver>) {
        self.styles = styles;
    }

    /// Current load options.
    pub fn load_options(&self) -> &LoadOptions {
        &self.load_options
    }

    /// Replace the load options.
    pub fn set_load_options(&mut self, options: LoadOptions) {
        self.load_options = options;
    }

    /// The layout engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    // ---------------------------------------------------------------
    // Statistics
    // ---------------------------------------------------------------

    /// Aggregate statistics.
    pub fn stats(&self) -> DocumentStats {
        DocumentStats {
            paragraphs: self.paragraphs.len(),
            characters: self.stats.characters,
            words: self.stats.words,
            non_space_characters: self.stats.non_space,
            total_height: self.heights.total(),
            live_layouts: self.cache.live_count(),
        }
    }

    /// Total characters.
    pub fn character_count(&self) -> usize {
        self.stats.characters
    }

    /// Total words.
    pub fn word_count(&self) -> usize {
        self.stats.words
    }

    /// Total non-whitespace characters.
    pub fn character_count_no_spaces(&self) -> usize {
        self.stats.non_space
    }

    // ---------------------------------------------------------------
    // Geometry
    // ---------------------------------------------------------------

    /// Y offset of paragraph `index`.
    pub fn paragraph_y(&self, index: usize) -> Result<f64> {
        check_index(index, self.paragraphs.len())?;
        self.heights.prefix_height(index)
    }

    /// Current height of paragraph `index` (measured or estimated).
    pub fn paragraph_height(&self, index: usize) -> Result<f64> {
        self.heights.height(index)
    }

    /// Sum of all paragraph heights.
    pub fn total_height(&self) -> f64 {
        self.heights.total()
    }

    /// Paragraph containing vertical position `y`; the paragraph count when
    /// `y` is past the end.
    pub fn paragraph_at_y(&self, y: f64) -> usize {
        self.heights.locate(y)
    }

    // ---------------------------------------------------------------
    // Layout
    // ---------------------------------------------------------------

    /// Materialize layouts for paragraphs `first..=last`.
    pub fn ensure_layouted(&mut self, first: usize, last: usize) -> Result<()> {
        let changes = self.cache.ensure_range(
            first,
            last,
            &self.paragraphs,
            &self.engine,
            &self.options,
            &mut self.heights,
        )?;
        for change in &changes {
            self.listeners.emit(DocumentEvent::ParagraphHeightChanged {
                index: change.index,
                height: change.new_height,
            });
        }
        if !changes.is_empty() {
            self.emit_total_height();
        }
        Ok(())
    }

    /// Materialized layout of paragraph `index`, if any.
    pub fn layout(&self, index: usize) -> Result<Option<&E::Layout>> {
        self.cache.layout(index)
    }

    /// Whether paragraph `index` holds a layout.
    pub fn is_layouted(&self, index: usize) -> Result<bool> {
        self.cache.is_layouted(index)
    }

    /// Drop the layout of paragraph `index`; its height is kept until the
    /// next materialization.
    pub fn invalidate_layout(&mut self, index: usize) -> Result<()> {
        self.cache.invalidate(index)
    }

    /// Drop every layout, keeping heights.
    pub fn invalidate_all_layouts(&mut self) {
        self.cache.invalidate_all();
    }

    /// Release layouts outside `keep_first..=keep_last`; heights are kept.
    pub fn evict_layouts(&mut self, keep_first: usize, keep_last: usize) -> Result<usize> {
        self.cache.evict(keep_first, keep_last)
    }

    /// Number of paragraphs holding a layout.
    pub fn live_layout_count(&self) -> usize {
        self.cache.live_count()
    }

    /// Number of layout engine invocations so far.
    pub fn materialization_count(&self) -> u64 {
        self.cache.materializations()
    }

    /// Lay out the viewport `[y, y + height)`.
    ///
    /// Materializes the visible paragraphs plus `viewport_buffer` paragraphs
    /// on each side, evicts everything else and returns the visible range.
    /// If more than `max_cached_layouts` layouts remain, the least recently
    /// accessed are released; visible paragraphs are always kept.
    /// Returns `None` for an empty document.
    pub fn layout_viewport(&mut self, y: f64, height: f64) -> Result<Option<RangeInclusive<usize>>> {
        let count = self.paragraphs.len();
        if count == 0 {
            return Ok(None);
        }
        let last_index = count - 1;
        let top = if y.is_finite() { y.max(0.0) } else { 0.0 };
        let bottom = if height.is_finite() && height > 0.0 {
            top + height
        } else {
            top
        };

        let first = self.heights.locate(top).min(last_index);
        let last = self.heights.locate(bottom).min(last_index).max(first);

        let buffer = self.options.viewport_buffer;
        let keep_first = first.saturating_sub(buffer);
        let keep_last = last.saturating_add(buffer).min(last_index);

        self.ensure_layouted(keep_first, keep_last)?;
        self.cache.evict(keep_first, keep_last)?;
        self.cache.touch_range(first, last)?;
        let keep = self.options.max_cached_layouts.max(last - first + 1);
        self.cache.evict_oldest(keep);
        Ok(Some(first..=last))
    }

    // ---------------------------------------------------------------
    // Editing
    // ---------------------------------------------------------------

    /// Insert a paragraph before `index` (`index == paragraph_count()` appends).
    pub fn insert_paragraph(&mut self, index: usize, paragraph: Paragraph) -> Result<()> {
        if index > self.paragraphs.len() {
            return Err(Error::OutOfRange {
                index,
                count: self.paragraphs.len(),
            });
        }
        let height = self.options.estimate_height(paragraph.char_len());
        self.heights.insert(index, height)?;
        self.cache.insert(index);
        self.stats += TextStats::of(&paragraph.text);
        self.paragraphs.insert(index, paragraph);

        self.listeners.emit(DocumentEvent::ParagraphInserted { index });
        self.emit_total_height();
        Ok(())
    }

    /// Append a paragraph.
    pub fn push_paragraph(&mut self, paragraph: Paragraph) -> Result<()> {
        self.insert_paragraph(self.paragraphs.len(), paragraph)
    }

    /// Parse paragraph inner markup and insert it before `index`.
    pub fn insert_kml(&mut self, index: usize, markup: &str) -> Result<()> {
        let paragraph = self.parse_paragraph(markup)?;
        self.insert_paragraph(index, paragraph)
    }

    /// Remove paragraph `index`, returning it.
    pub fn remove_paragraph(&mut self, index: usize) -> Result<Paragraph> {
        check_index(index, self.paragraphs.len())?;
        self.heights.remove(index)?;
        self.cache.remove(index);
        let paragraph = self.paragraphs.remove(index);
        self.stats -= TextStats::of(&paragraph.text);

        self.listeners.emit(DocumentEvent::ParagraphRemoved { index });
        self.emit_total_height();
        Ok(paragraph)
    }

    /// Replace paragraph `index`, returning the previous one.
    ///
    /// The paragraph's layout is dropped and its height re-estimated.
    pub fn replace_paragraph(&mut self, index: usize, paragraph: Paragraph) -> Result<Paragraph> {
        check_index(index, self.paragraphs.len())?;
        self.stats -= TextStats::of(&self.paragraphs[index].text);
        self.stats += TextStats::of(&paragraph.text);
        let previous = std::mem::replace(&mut self.paragraphs[index], paragraph);

        self.cache.reset(index)?;
        let old_height = self.heights.height(index)?;
        let height = self.options.estimate_height(self.paragraphs[index].char_len());
        self.heights.update(index, height)?;

        self.listeners.emit(DocumentEvent::ParagraphChanged { index });
        if old_height != height {
            self.listeners
                .emit(DocumentEvent::ParagraphHeightChanged { index, height });
            self.emit_total_height();
        }
        Ok(previous)
    }

    /// Replace the content of paragraph `index` with parsed inner markup,
    /// keeping its alignment and paragraph style.
    pub fn set_paragraph_kml(&mut self, index: usize, markup: &str) -> Result<()> {
        check_index(index, self.paragraphs.len())?;
        let paragraph = self.parse_paragraph(markup)?;
        self.set_content(index, paragraph)
    }

    /// Replace the content of paragraph `index` with an element tree,
    /// keeping its alignment and paragraph style.
    pub fn set_paragraph_elements(&mut self, index: usize, elements: &[InlineElement]) -> Result<()> {
        check_index(index, self.paragraphs.len())?;
        let paragraph = Paragraph::from_elements(elements, self.styles.as_ref())?;
        self.set_content(index, paragraph)
    }

    fn set_content(&mut self, index: usize, mut paragraph: Paragraph) -> Result<()> {
        let current = &self.paragraphs[index];
        paragraph.alignment = current.alignment;
        paragraph.style_id = current.style_id.clone();
        self.replace_paragraph(index, paragraph).map(|_| ())
    }

    fn parse_paragraph(&self, markup: &str) -> Result<Paragraph> {
        MarkupParser::new(self.styles.as_ref()).parse_paragraph(markup)
    }

    /// Remove every paragraph.
    pub fn clear(&mut self) {
        self.paragraphs.clear();
        self.heights.clear();
        self.cache.clear();
        self.stats = TextStats::default();
        self.emit_total_height();
    }

    // ---------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------

    /// Current layout options.
    pub fn layout_options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Replace the layout options.
    ///
    /// All layouts are invalidated. Paragraphs never measured are
    /// re-estimated; measured ones keep their height until re-materialized.
    pub fn set_layout_options(&mut self, options: LayoutOptions) {
        self.options = options;
        self.cache.invalidate_all();

        let before = self.heights.total();
        let heights: Vec<f64> = self
            .paragraphs
            .iter()
            .zip(self.cache.measured_flags())
            .zip(self.heights.heights())
            .map(|((paragraph, measured), &height)| {
                if measured {
                    height
                } else {
                    self.options.estimate_height(paragraph.char_len())
                }
            })
            .collect();
        self.heights = HeightTree::from_heights(heights);

        if (self.heights.total() - before).abs() > f64::EPSILON {
            self.emit_total_height();
        }
    }

    /// Set the layout font.
    ///
    /// Estimates are recalibrated from the engine's metrics for the new font.
    pub fn set_font(&mut self, font: FontSpec) {
        let options = self.recalibrated(self.options.clone().with_font(font));
        self.set_layout_options(options);
    }

    /// Set the line width.
    ///
    /// Estimates are recalibrated from the engine's metrics for the new width.
    pub fn set_line_width(&mut self, width: f64) {
        let options = self.recalibrated(self.options.clone().with_line_width(width));
        self.set_layout_options(options);
    }

    fn recalibrated(&self, options: LayoutOptions) -> LayoutOptions {
        match self.engine.estimate_metrics(&options) {
            Some(metrics) => {
                debug!(
                    "Estimates recalibrated: {} chars per line, line height {}",
                    metrics.chars_per_line, metrics.line_height
                );
                options
                    .with_chars_per_line(metrics.chars_per_line)
                    .with_estimated_line_height(metrics.line_height)
            }
            None => options,
        }
    }

    /// Set the default text color.
    pub fn set_text_color(&mut self, color: Color) {
        let options = self.options.clone().with_text_color(color);
        self.set_layout_options(options);
    }

    /// Set the estimated line height.
    pub fn set_estimated_line_height(&mut self, height: f64) {
        let options = self.options.clone().with_estimated_line_height(height);
        self.set_layout_options(options);
    }

    // ---------------------------------------------------------------
    // Listeners
    // ---------------------------------------------------------------

    /// Subscribe a listener to document events.
    pub fn subscribe<L>(&mut self, listener: L) -> ListenerId
    where
        L: DocumentListener + 'static,
    {
        self.listeners.subscribe(Box::new(listener))
    }

    /// Remove a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn emit_total_height(&mut self) {
        let height = self.heights.total();
        self.listeners
            .emit(DocumentEvent::TotalHeightChanged { height });
    }

    /// Check that the paragraph, height and layout sequences agree.
    pub fn check_consistency(&self) -> Result<()> {
        let count = self.paragraphs.len();
        if self.heights.len() != count || self.cache.len() != count {
            return Err(Error::InternalConsistency(format!(
                "{} paragraphs, {} heights, {} layout slots",
                count,
                self.heights.len(),
                self.cache.len()
            )));
        }
        self.paragraphs.iter().try_for_each(Paragraph::validate)
    }
}
