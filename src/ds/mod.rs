//! Secondary data structures.
//!
//! Each structure here backs one command family and lives in its own
//! registry, independent of the main keyspace:
//!
//! - [`bplustree`]: order-statistic B+ tree for the sorted-set commands
//! - [`simple_set`]: plain hash-set of strings
//! - [`cms`]: Count-Min Sketch frequency estimator
//! - [`bloom`]: Bloom filter membership estimator

pub mod bloom;
pub mod bplustree;
pub mod cms;
pub mod simple_set;

pub use bloom::BloomFilter;
pub use bplustree::BPlusTree;
pub use cms::CountMinSketch;
pub use simple_set::SimpleSet;

use std::hash::{DefaultHasher, Hash, Hasher};

/// Hashes `item` under a seed, giving the probabilistic structures
/// independent hash functions from one hasher.
pub(crate) fn seeded_hash(seed: u64, item: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    item.hash(&mut hasher);
    hasher.finish()
}

/// splitmix64 step, used to derive well-mixed seeds from small integers.
pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
