//! Loading options.

/// Options for loading KML documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Whether to parse paragraph blocks in parallel
    pub parallel: bool,

    /// Minimum number of blocks before parallel parsing kicks in
    pub parallel_threshold: usize,
}

impl LoadOptions {
    /// Create new load options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the block count at which parsing goes parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Whether a document with `blocks` paragraphs is parsed in parallel.
    pub fn use_parallel(&self, blocks: usize) -> bool {
        self.parallel && blocks >= self.parallel_threshold.max(1)
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_builders() {
        let options = LoadOptions::new();
        assert!(options.parallel);
        assert!(!options.use_parallel(10));
        assert!(options.use_parallel(64));

        let options = LoadOptions::new().with_parallel_threshold(2).sequential();
        assert!(!options.use_parallel(100));
    }
}
