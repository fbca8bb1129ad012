//! Top-level data-store registries.
//!
//! The keyspace and each secondary structure family are deliberately
//! separate: commands dispatch by name to the registry they own, and no
//! sum type ties the value kinds together. Everything is owned by the
//! event-loop thread and reached through `&mut` — single-threaded
//! execution needs no synchronization.

use crate::ds::{BloomFilter, BPlusTree, CountMinSketch, SimpleSet};
use crate::storage::dict::Dict;
use std::collections::HashMap;

/// Everything the command executor can reach.
pub struct Stores {
    /// Primary keyspace (SET/GET/TTL/…).
    pub dict: Dict,
    /// name → sorted set, auto-created by ZADD.
    pub zsets: HashMap<String, BPlusTree>,
    /// name → simple set, auto-created by SADD.
    pub sets: HashMap<String, SimpleSet>,
    /// name → Count-Min Sketch, created only by CMS.INITBY*.
    pub sketches: HashMap<String, CountMinSketch>,
    /// name → Bloom filter, reserved explicitly or on first use.
    pub blooms: HashMap<String, BloomFilter>,
    /// Degree for trees created by ZADD.
    pub zset_degree: usize,
}

impl Stores {
    pub fn new(dict: Dict, zset_degree: usize) -> Self {
        Stores {
            dict,
            zsets: HashMap::new(),
            sets: HashMap::new(),
            sketches: HashMap::new(),
            blooms: HashMap::new(),
            zset_degree,
        }
    }
}
