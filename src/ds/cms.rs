//! Count-Min Sketch frequency estimator.
//!
//! A `d × w` matrix of counters with one independently seeded hash per
//! row. Increments bump one counter per row; a query takes the minimum
//! across rows, so estimates can only overshoot the true count (by hash
//! collisions), never undershoot.

use crate::ds::seeded_hash;

/// Frequency estimator with tunable width/depth.
#[derive(Debug)]
pub struct CountMinSketch {
    width: usize,
    depth: usize,
    /// Row-major `depth × width` counter matrix.
    counters: Vec<u64>,
    /// One hash seed per row.
    seeds: Vec<u64>,
}

impl CountMinSketch {
    /// Builds a sketch with explicit dimensions. Both must be non-zero.
    pub fn with_dim(width: usize, depth: usize) -> Self {
        debug_assert!(width > 0 && depth > 0);
        let seeds = (0..depth as u64)
            .map(|row| crate::ds::splitmix64(row.wrapping_add(1)))
            .collect();
        CountMinSketch {
            width,
            depth,
            counters: vec![0; width * depth],
            seeds,
        }
    }

    /// Builds a sketch from error bounds: estimates exceed the true count
    /// by more than `ε · N` with probability at most `δ`.
    ///
    /// `w = ⌈e/ε⌉`, `d = ⌈ln(1/δ)⌉`.
    pub fn with_prob(epsilon: f64, delta: f64) -> Self {
        let width = (std::f64::consts::E / epsilon).ceil() as usize;
        let depth = (1.0 / delta).ln().ceil() as usize;
        Self::with_dim(width.max(1), depth.max(1))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Adds `delta` to the item's counter in every row and returns the
    /// updated estimate (the minimum across rows).
    pub fn incr_by(&mut self, item: &str, delta: u64) -> u64 {
        let mut estimate = u64::MAX;
        for row in 0..self.depth {
            let col = (seeded_hash(self.seeds[row], item) as usize) % self.width;
            let cell = &mut self.counters[row * self.width + col];
            *cell = cell.saturating_add(delta);
            estimate = estimate.min(*cell);
        }
        estimate
    }

    /// Estimated count for the item: the minimum of its cells across rows.
    pub fn query(&self, item: &str) -> u64 {
        let mut estimate = u64::MAX;
        for row in 0..self.depth {
            let col = (seeded_hash(self.seeds[row], item) as usize) % self.width;
            estimate = estimate.min(self.counters[row * self.width + col]);
        }
        estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_prob_applies_sizing_formulas() {
        let cms = CountMinSketch::with_prob(0.001, 0.01);
        // ⌈e / 0.001⌉ = 2719, ⌈ln 100⌉ = 5
        assert_eq!(cms.width(), 2719);
        assert_eq!(cms.depth(), 5);
    }

    #[test]
    fn with_dim_uses_exact_dimensions() {
        let cms = CountMinSketch::with_dim(2000, 5);
        assert_eq!(cms.width(), 2000);
        assert_eq!(cms.depth(), 5);
    }

    #[test]
    fn incr_and_query_track_counts() {
        let mut cms = CountMinSketch::with_dim(2000, 5);
        assert_eq!(cms.incr_by("apple", 3), 3);
        assert_eq!(cms.incr_by("banana", 2), 2);
        assert_eq!(cms.query("apple"), 3);
        assert_eq!(cms.query("banana"), 2);
    }

    #[test]
    fn repeated_increments_accumulate() {
        let mut cms = CountMinSketch::with_dim(1000, 4);
        cms.incr_by("k", 1);
        cms.incr_by("k", 1);
        assert_eq!(cms.incr_by("k", 5), 7);
        assert_eq!(cms.query("k"), 7);
    }

    #[test]
    fn unseen_item_reads_zero_in_sparse_sketch() {
        let mut cms = CountMinSketch::with_dim(2000, 5);
        cms.incr_by("apple", 3);
        cms.incr_by("banana", 2);
        assert_eq!(cms.query("cherry"), 0);
    }

    #[test]
    fn estimates_never_undershoot() {
        // Cram many items into a tiny sketch; collisions may inflate
        // estimates but must never deflate them.
        let mut cms = CountMinSketch::with_dim(16, 3);
        for i in 0..100 {
            cms.incr_by(&format!("item{i}"), 1);
        }
        for i in 0..100 {
            assert!(cms.query(&format!("item{i}")) >= 1);
        }
    }
}
