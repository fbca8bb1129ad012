//! Bloom filter membership estimator.
//!
//! Sized from a target capacity and error rate: `m = ⌈−c·ln p / (ln 2)²⌉`
//! bits and `k = ⌈(m/c)·ln 2⌉` probes per item. Probes are derived by
//! double hashing (`h1 + i·h2`), so two base hashes cover all k positions.
//! False positives are possible at roughly the configured rate; false
//! negatives are not.

use crate::ds::seeded_hash;

/// Default capacity when a filter is created implicitly.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default false-positive rate when a filter is created implicitly.
pub const DEFAULT_ERROR_RATE: f64 = 0.01;

const H1_SEED: u64 = 0x51_7c_c1_b7_27_22_0a_95;
const H2_SEED: u64 = 0x2d_35_8d_cc_aa_6c_78_a5;

/// Fixed-size bit array with k-probe membership.
#[derive(Debug)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: usize,
    num_hashes: usize,
}

impl BloomFilter {
    /// Creates a filter sized for `capacity` items at `error_rate`.
    pub fn reserve(capacity: usize, error_rate: f64) -> Self {
        let capacity = capacity.max(1);
        let ln2 = std::f64::consts::LN_2;
        let num_bits = ((-(capacity as f64) * error_rate.ln()) / (ln2 * ln2)).ceil() as usize;
        let num_bits = num_bits.max(1);
        let num_hashes = (((num_bits as f64) / (capacity as f64)) * ln2).ceil() as usize;
        BloomFilter {
            bits: vec![0; num_bits.div_ceil(64)],
            num_bits,
            num_hashes: num_hashes.max(1),
        }
    }

    /// Creates a filter with the documented defaults (100 items, 1%).
    pub fn with_defaults() -> Self {
        Self::reserve(DEFAULT_CAPACITY, DEFAULT_ERROR_RATE)
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Sets every probe bit for the item. Returns `true` if any bit was
    /// previously unset (the item was not already recorded).
    pub fn madd(&mut self, item: &str) -> bool {
        let (h1, h2) = self.base_hashes(item);
        let mut was_new = false;
        for i in 0..self.num_hashes {
            let bit = self.probe(h1, h2, i);
            let (word, mask) = (bit / 64, 1u64 << (bit % 64));
            if self.bits[word] & mask == 0 {
                self.bits[word] |= mask;
                was_new = true;
            }
        }
        was_new
    }

    /// Whether every probe bit for the item is set.
    pub fn exists(&self, item: &str) -> bool {
        let (h1, h2) = self.base_hashes(item);
        (0..self.num_hashes).all(|i| {
            let bit = self.probe(h1, h2, i);
            self.bits[bit / 64] & (1u64 << (bit % 64)) != 0
        })
    }

    fn base_hashes(&self, item: &str) -> (u64, u64) {
        // An odd h2 stride visits distinct positions even when num_bits
        // shares factors with it.
        (seeded_hash(H1_SEED, item), seeded_hash(H2_SEED, item) | 1)
    }

    fn probe(&self, h1: u64, h2: u64, i: usize) -> usize {
        (h1.wrapping_add(h2.wrapping_mul(i as u64)) % self.num_bits as u64) as usize
    }
}
