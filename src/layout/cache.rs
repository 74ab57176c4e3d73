//! Lazy layout cache.
//!
//! One slot per paragraph holding an optional materialized layout. Heights
//! live in the [`HeightTree`]; the cache only decides when they change.

use super::engine::LayoutEngine;
use super::height_tree::HeightTree;
use super::options::LayoutOptions;
use crate::error::{check_index, check_range, Result};
use crate::model::Paragraph;
use log::{debug, trace};

/// Height changes smaller than this are not reported.
pub const HEIGHT_EPSILON: f64 = 0.01;

/// A paragraph height update caused by materialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightChange {
    /// Paragraph index
    pub index: usize,
    /// Height before materialization
    pub old_height: f64,
    /// Measured height
    pub new_height: f64,
}

#[derive(Debug, Clone)]
struct Slot<L> {
    layout: Option<L>,
    valid: bool,
    measured: bool,
    last_access: u64,
}

impl<L> Default for Slot<L> {
    fn default() -> Self {
        Self {
            layout: None,
            valid: false,
            measured: false,
            last_access: 0,
        }
    }
}

/// Per-paragraph layout slots.
#[derive(Debug, Clone)]
pub struct LazyLayoutCache<L> {
    slots: Vec<Slot<L>>,
    materializations: u64,
    clock: u64,
}

impl<L> Default for LazyLayoutCache<L> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            materializations: 0,
            clock: 0,
        }
    }
}

impl<L> LazyLayoutCache<L> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with `len` empty slots.
    pub fn with_len(len: usize) -> Self {
        let mut cache = Self::new();
        cache.slots.resize_with(len, Slot::default);
        cache
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the cache has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Insert an empty slot before `index`.
    pub fn insert(&mut self, index: usize) {
        self.slots.insert(index, Slot::default());
    }

    /// Remove slot `index`.
    pub fn remove(&mut self, index: usize) {
        self.slots.remove(index);
    }

    /// Remove all slots.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Reset slot `index` to the never-measured state.
    pub fn reset(&mut self, index: usize) -> Result<()> {
        check_index(index, self.len())?;
        self.slots[index] = Slot::default();
        Ok(())
    }

    /// Materialized layout of paragraph `index`, if any.
    pub fn layout(&self, index: usize) -> Result<Option<&L>> {
        check_index(index, self.len())?;
        Ok(self.slots[index].layout.as_ref())
    }

    /// Whether paragraph `index` currently holds a layout.
    pub fn is_layouted(&self, index: usize) -> Result<bool> {
        check_index(index, self.len())?;
        Ok(self.slots[index].layout.is_some())
    }

    /// Whether paragraph `index` holds a valid layout.
    pub fn is_valid(&self, index: usize) -> Result<bool> {
        check_index(index, self.len())?;
        Ok(self.slots[index].valid)
    }

    /// Whether paragraph `index` has ever been measured.
    pub fn is_measured(&self, index: usize) -> Result<bool> {
        check_index(index, self.len())?;
        Ok(self.slots[index].measured)
    }

    /// Number of live layouts.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.layout.is_some()).count()
    }

    /// Whether each paragraph has ever been measured, in index order.
    pub fn measured_flags(&self) -> impl Iterator<Item = bool> + '_ {
        self.slots.iter().map(|s| s.measured)
    }

    /// Total number of engine invocations since creation.
    pub fn materializations(&self) -> u64 {
        self.materializations
    }

    /// Materialize every paragraph in `first..=last` that lacks a layout.
    ///
    /// Every slot in the range counts as accessed.
    /// Measured heights below 1.0 are floored to the estimated line height.
    /// Heights moving by more than [`HEIGHT_EPSILON`] update `heights` and
    /// are returned in index order.
    pub fn ensure_range<E>(
        &mut self,
        first: usize,
        last: usize,
        paragraphs: &[Paragraph],
        engine: &E,
        options: &LayoutOptions,
        heights: &mut HeightTree,
    ) -> Result<Vec<HeightChange>>
    where
        E: LayoutEngine<Layout = L>,
    {
        check_range(first, last, self.len())?;
        let mut changes = Vec::new();
        let mut created = 0;

        for index in first..=last {
            self.clock += 1;
            self.slots[index].last_access = self.clock;
            if self.slots[index].layout.is_some() {
                continue;
            }
            let measured = engine.layout(&paragraphs[index], options);
            let mut height = measured.height;
            if height.is_nan() || height < 1.0 {
                height = options.line_height();
            }

            let slot = &mut self.slots[index];
            slot.layout = Some(measured.layout);
            slot.valid = true;
            slot.measured = true;
            created += 1;

            let old_height = heights.height(index)?;
            if (height - old_height).abs() > HEIGHT_EPSILON {
                heights.update(index, height)?;
                trace!("Paragraph {} height {} -> {}", index, old_height, height);
                changes.push(HeightChange {
                    index,
                    old_height,
                    new_height: height,
                });
            }
        }

        self.materializations += created;
        if created > 0 {
            debug!(
                "Materialized {} layouts in {}..={} ({} height changes)",
                created,
                first,
                last,
                changes.len()
            );
        }
        Ok(changes)
    }

    /// Mark `first..=last` as the most recently accessed slots.
    pub fn touch_range(&mut self, first: usize, last: usize) -> Result<()> {
        check_range(first, last, self.len())?;
        for slot in &mut self.slots[first..=last] {
            self.clock += 1;
            slot.last_access = self.clock;
        }
        Ok(())
    }

    /// Release the least recently accessed layouts until at most `keep`
    /// remain, returning how many were released. Heights are untouched.
    pub fn evict_oldest(&mut self, keep: usize) -> usize {
        let mut live: Vec<(u64, usize)> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.layout.is_some())
            .map(|(index, s)| (s.last_access, index))
            .collect();
        if live.len() <= keep {
            return 0;
        }
        live.sort_unstable();
        let evicted = live.len() - keep;
        for &(_, index) in &live[..evicted] {
            let slot = &mut self.slots[index];
            slot.layout = None;
            slot.valid = false;
        }
        debug!("Evicted {} least recently used layouts, {} kept", evicted, keep);
        evicted
    }

    /// Drop the layout of paragraph `index`, keeping its height.
    pub fn invalidate(&mut self, index: usize) -> Result<()> {
        check_index(index, self.len())?;
        let slot = &mut self.slots[index];
        slot.layout = None;
        slot.valid = false;
        Ok(())
    }

    /// Drop every layout, keeping heights.
    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            slot.layout = None;
            slot.valid = false;
        }
    }

    /// Release layouts outside `keep_first..=keep_last`, returning how many
    /// were released. Heights are untouched.
    pub fn evict(&mut self, keep_first: usize, keep_last: usize) -> Result<usize> {
        check_range(keep_first, keep_last, self.len())?;
        let mut evicted = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if (index < keep_first || index > keep_last) && slot.layout.take().is_some() {
                evicted += 1;
            }
        }
        if evicted > 0 {
            debug!(
                "Evicted {} layouts outside {}..={}",
                evicted, keep_first, keep_last
            );
        }
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::layout::{MeasuredLayout, MonospaceEngine};
    use std::cell::Cell;

    /// Engine returning a fixed height and counting calls.
    struct FixedEngine {
        height: f64,
        calls: Cell<usize>,
    }

    impl LayoutEngine for FixedEngine {
        type Layout = usize;

        fn layout(&self, _: &Paragraph, _: &LayoutOptions) -> MeasuredLayout<usize> {
            self.calls.set(self.calls.get() + 1);
            MeasuredLayout {
                layout: self.calls.get(),
                height: self.height,
            }
        }
    }

    fn setup(n: usize) -> (Vec<Paragraph>, HeightTree, LayoutOptions) {
        let options = LayoutOptions::new();
        let paragraphs: Vec<Paragraph> = (0..n).map(|i| Paragraph::with_text(format!("p{}", i))).collect();
        let heights = HeightTree::from_heights(
            paragraphs
                .iter()
                .map(|p| options.estimate_height(p.char_len()))
                .collect(),
        );
        (paragraphs, heights, options)
    }

    #[test]
    fn test_ensure_range_materializes_once() {
        let (paragraphs, mut heights, options) = setup(4);
        let engine = FixedEngine {
            height: 33.0,
            calls: Cell::new(0),
        };
        let mut cache = LazyLayoutCache::with_len(4);

        let changes = cache
            .ensure_range(1, 2, &paragraphs, &engine, &options, &mut heights)
            .unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].index, 1);
        assert_eq!(changes[0].old_height, 20.0);
        assert_eq!(heights.total(), 20.0 + 33.0 + 33.0 + 20.0);

        let first = *cache.layout(1).unwrap().unwrap();
        let again = cache
            .ensure_range(1, 2, &paragraphs, &engine, &options, &mut heights)
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(engine.calls.get(), 2);
        assert_eq!(*cache.layout(1).unwrap().unwrap(), first);
        assert!(!cache.is_layouted(0).unwrap());
    }

    #[test]
    fn test_small_height_is_floored_and_unchanged_height_is_silent() {
        let (paragraphs, mut heights, options) = setup(2);
        let engine = FixedEngine {
            height: 0.0,
            calls: Cell::new(0),
        };
        let mut cache = LazyLayoutCache::with_len(2);
        let changes = cache
            .ensure_range(0, 1, &paragraphs, &engine, &options, &mut heights)
            .unwrap();
        // Floored to the 20.0 estimate, which equals the seeded height.
        assert!(changes.is_empty());
        assert_eq!(heights.height(0).unwrap(), 20.0);
        assert!(cache.is_measured(0).unwrap());
    }

    #[test]
    fn test_invalidate_keeps_height() {
        let (paragraphs, mut heights, options) = setup(3);
        let engine = MonospaceEngine::new();
        let mut cache = LazyLayoutCache::with_len(3);
        cache
            .ensure_range(0, 2, &paragraphs, &engine, &options, &mut heights)
            .unwrap();
        let measured = heights.height(0).unwrap();

        cache.invalidate(0).unwrap();
        assert!(!cache.is_layouted(0).unwrap());
        assert!(!cache.is_valid(0).unwrap());
        assert_eq!(heights.height(0).unwrap(), measured);

        cache.invalidate_all();
        assert_eq!(cache.live_count(), 0);
        assert!(matches!(cache.invalidate(3), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_evict_outside_kept_range() {
        let (paragraphs, mut heights, options) = setup(6);
        let engine = MonospaceEngine::new();
        let mut cache = LazyLayoutCache::with_len(6);
        cache
            .ensure_range(0, 5, &paragraphs, &engine, &options, &mut heights)
            .unwrap();
        let total = heights.total();

        assert_eq!(cache.evict(2, 3).unwrap(), 4);
        assert_eq!(cache.live_count(), 2);
        assert!(cache.is_layouted(2).unwrap());
        assert!(!cache.is_layouted(5).unwrap());
        assert_eq!(heights.total(), total);
    }

    #[test]
    fn test_evict_oldest_keeps_recent() {
        let (paragraphs, mut heights, options) = setup(6);
        let engine = MonospaceEngine::new();
        let mut cache = LazyLayoutCache::with_len(6);
        cache
            .ensure_range(0, 5, &paragraphs, &engine, &options, &mut heights)
            .unwrap();
        cache.touch_range(1, 1).unwrap();
        cache
            .ensure_range(4, 4, &paragraphs, &engine, &options, &mut heights)
            .unwrap();

        assert_eq!(cache.evict_oldest(6), 0);
        assert_eq!(cache.evict_oldest(3), 3);
        assert_eq!(cache.live_count(), 3);
        for index in [1, 4, 5] {
            assert!(cache.is_layouted(index).unwrap(), "{}", index);
        }
        assert!(!cache.is_valid(0).unwrap());
        assert!(cache.is_measured(0).unwrap());

        assert_eq!(cache.evict_oldest(0), 3);
        assert_eq!(cache.live_count(), 0);
        assert!(cache.touch_range(2, 6).is_err());
    }

    #[test]
    fn test_range_errors() {
        let (paragraphs, mut heights, options) = setup(2);
        let engine = MonospaceEngine::new();
        let mut cache = LazyLayoutCache::with_len(2);
        assert!(matches!(
            cache.ensure_range(1, 0, &paragraphs, &engine, &options, &mut heights),
            Err(Error::InvalidRange { first: 1, last: 0 })
        ));
        assert!(matches!(
            cache.ensure_range(0, 2, &paragraphs, &engine, &options, &mut heights),
            Err(Error::OutOfRange { index: 2, count: 2 })
        ));
        assert!(cache.evict(0, 5).is_err());
    }
}
