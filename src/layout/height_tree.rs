//! Height index over paragraph heights.
//!
//! A Fenwick (binary indexed) tree of `f64` heights. Updates, prefix sums
//! and position lookups are O(log n); inserting or removing a paragraph
//! rebuilds the tree in O(n).

use crate::error::{Error, Result};

/// Order-statistics structure mapping paragraph index to vertical position.
#[derive(Debug, Clone, Default)]
pub struct HeightTree {
    heights: Vec<f64>,
    // 1-based Fenwick array, `tree.len() == heights.len() + 1`
    tree: Vec<f64>,
    total: f64,
}

fn sanitize(height: f64) -> f64 {
    if height.is_finite() && height > 0.0 {
        height
    } else {
        0.0
    }
}

#[inline]
fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

impl HeightTree {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            tree: vec![0.0],
            total: 0.0,
        }
    }

    /// Build an index from heights in O(n).
    ///
    /// Negative and non-finite heights are stored as zero.
    pub fn from_heights(heights: Vec<f64>) -> Self {
        let mut index = Self {
            heights: heights.into_iter().map(sanitize).collect(),
            tree: Vec::new(),
            total: 0.0,
        };
        index.rebuild();
        index
    }

    fn rebuild(&mut self) {
        let n = self.heights.len();
        self.tree = vec![0.0; n + 1];
        for i in 1..=n {
            self.tree[i] += self.heights[i - 1];
            let parent = i + lowbit(i);
            if parent <= n {
                self.tree[parent] += self.tree[i];
            }
        }
        self.total = self.heights.iter().sum();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// All heights in paragraph order.
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Height of entry `index`.
    pub fn height(&self, index: usize) -> Result<f64> {
        self.heights
            .get(index)
            .copied()
            .ok_or(Error::OutOfRange {
                index,
                count: self.len(),
            })
    }

    /// Set the height of entry `index`.
    pub fn update(&mut self, index: usize, height: f64) -> Result<()> {
        let old = self.height(index)?;
        let height = sanitize(height);
        let delta = height - old;
        if delta == 0.0 {
            return Ok(());
        }
        self.heights[index] = height;
        let mut i = index + 1;
        while i < self.tree.len() {
            self.tree[i] += delta;
            i += lowbit(i);
        }
        self.total += delta;
        Ok(())
    }

    /// Sum of the heights of entries `0..index` (the Y offset of `index`).
    ///
    /// `index == len()` is accepted and yields the total.
    pub fn prefix_height(&self, index: usize) -> Result<f64> {
        if index > self.len() {
            return Err(Error::OutOfRange {
                index,
                count: self.len(),
            });
        }
        let mut sum = 0.0;
        let mut i = index;
        while i > 0 {
            sum += self.tree[i];
            i -= lowbit(i);
        }
        Ok(sum)
    }

    /// Index of the entry whose `[y0, y0 + height)` range contains `y`.
    ///
    /// Returns `len()` when `y` is at or past the end, and 0 for negative
    /// positions or an empty index.
    pub fn locate(&self, y: f64) -> usize {
        let n = self.len();
        if n == 0 || y.is_nan() || y < 0.0 {
            return 0;
        }
        if y >= self.total {
            return n;
        }

        // Largest `pos` with prefix(pos) <= y.
        let mut pos = 0;
        let mut remaining = y;
        let mut step = 1usize << (usize::BITS - 1 - n.leading_zeros());
        while step > 0 {
            let next = pos + step;
            if next <= n && self.tree[next] <= remaining {
                pos = next;
                remaining -= self.tree[next];
            }
            step >>= 1;
        }
        pos.min(n - 1)
    }

    /// Sum of all heights.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Insert an entry before `index` (`index == len()` appends).
    pub fn insert(&mut self, index: usize, height: f64) -> Result<()> {
        if index > self.len() {
            return Err(Error::OutOfRange {
                index,
                count: self.len(),
            });
        }
        self.heights.insert(index, sanitize(height));
        self.rebuild();
        Ok(())
    }

    /// Append an entry.
    pub fn push(&mut self, height: f64) {
        let height = sanitize(height);
        self.heights.push(height);
        let n = self.heights.len();
        // The new node covers (n - lowbit(n), n]; sum the children it spans.
        let mut value = height;
        let mut child = n - 1;
        let floor = n - lowbit(n);
        while child > floor {
            value += self.tree[child];
            child -= lowbit(child);
        }
        self.tree.push(value);
        self.total += height;
    }

    /// Remove entry `index`, returning its height.
    pub fn remove(&mut self, index: usize) -> Result<f64> {
        let height = self.height(index)?;
        self.heights.remove(index);
        self.rebuild();
        Ok(height)
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.heights.clear();
        self.tree = vec![0.0];
        self.total = 0.0;
    }
}
