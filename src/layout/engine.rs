//! Layout engine seam and the monospace reference engine.

use super::options::LayoutOptions;
use crate::model::Paragraph;
use serde::Serialize;

/// A layout object together with its measured height.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredLayout<L> {
    /// Engine-specific layout object
    pub layout: L,
    /// Exact height of the layout
    pub height: f64,
}

/// Calibration for height estimates of paragraphs not yet laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateMetrics {
    /// Average characters per line
    pub chars_per_line: f64,
    /// Height of one line
    pub line_height: f64,
}

/// Text layout collaborator.
///
/// Must be deterministic: the same paragraph and options always produce the
/// same height.
pub trait LayoutEngine {
    /// Layout object kept by the cache while a paragraph is materialized.
    type Layout;

    /// Lay out one paragraph.
    fn layout(&self, paragraph: &Paragraph, options: &LayoutOptions) -> MeasuredLayout<Self::Layout>;

    /// Estimate calibration for `options`, used when the font or line width
    /// changes. `None` keeps the configured estimates.
    fn estimate_metrics(&self, _options: &LayoutOptions) -> Option<EstimateMetrics> {
        None
    }
}

/// One wrapped line: a character range of the paragraph text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineBox {
    /// First character of the line
    pub start: usize,
    /// Number of characters on the line (trailing break space excluded)
    pub len: usize,
}

/// Layout produced by [`MonospaceEngine`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLayout {
    /// Wrapped lines
    pub lines: Vec<LineBox>,
    /// Height of one line
    pub line_height: f64,
}

impl TextLayout {
    /// Number of lines, at least one.
    pub fn line_count(&self) -> usize {
        self.lines.len().max(1)
    }

    /// Total height.
    pub fn height(&self) -> f64 {
        self.line_count() as f64 * self.line_height
    }
}

/// Deterministic fixed-advance layout with greedy word wrapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceEngine {
    /// Character advance as a fraction of the font size
    pub advance_ratio: f64,
    /// Line height as a multiple of the font size
    pub line_spacing: f64,
}

impl Default for MonospaceEngine {
    fn default() -> Self {
        Self {
            advance_ratio: 0.6,
            line_spacing: 1.5,
        }
    }
}

impl MonospaceEngine {
    /// Create an engine with the default metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Characters that fit on one line (at least one).
    pub fn chars_per_line(&self, options: &LayoutOptions) -> usize {
        let advance = options.font.size * self.advance_ratio;
        if !(advance.is_finite() && advance > 0.0 && options.line_width.is_finite()) {
            return 1;
        }
        ((options.line_width / advance).floor() as usize).max(1)
    }

    fn line_height(&self, options: &LayoutOptions) -> f64 {
        let height = options.font.size * self.line_spacing;
        if height.is_finite() && height > 0.0 {
            height
        } else {
            options.line_height()
        }
    }
}

/// Greedy word wrap of `text` at `max_chars` characters per line.
///
/// Breaks at the last whitespace that fits and drops that whitespace; words
/// longer than a line are split. `\n` forces a break.
pub fn wrap_lines(text: &str, max_chars: usize) -> Vec<LineBox> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    let mut lines = Vec::new();
    let mut segment_start = 0;

    for segment_end in chars
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == '\n')
        .map(|(i, _)| i)
        .chain(std::iter::once(chars.len()))
    {
        let mut start = segment_start;
        if start == segment_end {
            lines.push(LineBox { start, len: 0 });
        }
        while start < segment_end {
            let remaining = segment_end - start;
            if remaining <= max_chars {
                lines.push(LineBox {
                    start,
                    len: remaining,
                });
                break;
            }
            let limit = start + max_chars;
            match (start + 1..=limit).rev().find(|&i| chars[i].is_whitespace()) {
                Some(space) => {
                    lines.push(LineBox {
                        start,
                        len: space - start,
                    });
                    start = space + 1;
                }
                None => {
                    lines.push(LineBox {
                        start,
                        len: max_chars,
                    });
                    start = limit;
                }
            }
        }
        segment_start = segment_end + 1;
    }

    lines
}

impl LayoutEngine for MonospaceEngine {
    type Layout = TextLayout;

    fn layout(&self, paragraph: &Paragraph, options: &LayoutOptions) -> MeasuredLayout<TextLayout> {
        let layout = TextLayout {
            lines: wrap_lines(&paragraph.text, self.chars_per_line(options)),
            line_height: self.line_height(options),
        };
        let height = layout.height();
        MeasuredLayout { layout, height }
    }

    fn estimate_metrics(&self, options: &LayoutOptions) -> Option<EstimateMetrics> {
        Some(EstimateMetrics {
            chars_per_line: self.chars_per_line(options) as f64,
            line_height: self.line_height(options),
        })
    }
}
