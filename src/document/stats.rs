//! Text statistics.

use serde::Serialize;
use std::ops::{AddAssign, SubAssign};

/// Character and word counts of a piece of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextStats {
    /// Characters
    pub characters: usize,
    /// Whitespace-separated words
    pub words: usize,
    /// Characters that are not whitespace
    pub non_space: usize,
}

impl TextStats {
    /// Count a piece of text.
    pub fn of(text: &str) -> Self {
        let mut stats = TextStats::default();
        let mut in_word = false;
        for c in text.chars() {
            stats.characters += 1;
            if c.is_whitespace() {
                in_word = false;
            } else {
                stats.non_space += 1;
                if !in_word {
                    stats.words += 1;
                    in_word = true;
                }
            }
        }
        stats
    }
}

impl AddAssign for TextStats {
    fn add_assign(&mut self, other: Self) {
        self.characters += other.characters;
        self.words += other.words;
        self.non_space += other.non_space;
    }
}

impl SubAssign for TextStats {
    fn sub_assign(&mut self, other: Self) {
        self.characters = self.characters.saturating_sub(other.characters);
        self.words = self.words.saturating_sub(other.words);
        self.non_space = self.non_space.saturating_sub(other.non_space);
    }
}

/// Aggregate document statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DocumentStats {
    /// Number of paragraphs
    pub paragraphs: usize,
    /// Characters across all paragraphs
    pub characters: usize,
    /// Words across all paragraphs
    pub words: usize,
    /// Non-whitespace characters across all paragraphs
    pub non_space_characters: usize,
    /// Current total height (exact and estimated heights mixed)
    pub total_height: f64,
    /// Paragraphs currently holding a layout
    pub live_layouts: usize,
}
