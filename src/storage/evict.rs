//! Eviction engine.
//!
//! Two policies keep the key population under the configured ceiling:
//!
//! - `allkeys-random`: delete uniformly random keys until the target
//!   count is reached.
//! - `allkeys-lru`: approximate LRU. Each round samples a handful of
//!   random keys into a small candidate pool ordered by access recency,
//!   then evicts the pool's oldest entry. The pool survives across
//!   rounds; entries are snapshots, so one whose key is gone or whose
//!   live `last_access` has moved on is discarded on encounter.
//!
//! Both policies remove a victim from the store and the expiry map
//! together. Eviction runs inline on the event-loop thread, so a round
//! completes before the write that triggered it proceeds.

use crate::storage::dict::Dict;
use rand::seq::IteratorRandom;
use std::str::FromStr;

/// Default capacity of the LRU candidate pool.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Default number of keys sampled per LRU eviction round.
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Which victims the engine picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    AllkeysRandom,
    AllkeysLru,
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allkeys-random" => Ok(EvictionPolicy::AllkeysRandom),
            "allkeys-lru" => Ok(EvictionPolicy::AllkeysLru),
            other => Err(format!("unknown eviction policy '{other}'")),
        }
    }
}

impl std::fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvictionPolicy::AllkeysRandom => f.write_str("allkeys-random"),
            EvictionPolicy::AllkeysLru => f.write_str("allkeys-lru"),
        }
    }
}

/// A candidate remembered by the pool: the key plus the `last_access`
/// tick observed when it was sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PoolEntry {
    pub(crate) key: String,
    pub(crate) last_access: u32,
}

/// Bounded "best candidates seen so far", ordered by ascending
/// `last_access` (head = oldest).
#[derive(Debug)]
pub(crate) struct EvictionPool {
    entries: Vec<PoolEntry>,
    max_size: usize,
    sample_size: usize,
}

impl EvictionPool {
    pub(crate) fn new(max_size: usize, sample_size: usize) -> Self {
        EvictionPool {
            entries: Vec::with_capacity(max_size),
            max_size: max_size.max(1),
            sample_size: sample_size.max(1),
        }
    }

    pub(crate) fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Offers a candidate. Kept if the pool has room, or if it is older
    /// than the pool's youngest entry (which it then displaces). Equal
    /// ticks rank behind existing entries, so the earlier-offered
    /// candidate stays closer to the head.
    pub(crate) fn offer(&mut self, key: &str, last_access: u32) {
        if self.entries.iter().any(|e| e.key == key) {
            return;
        }

        let pos = self
            .entries
            .partition_point(|e| e.last_access <= last_access);

        if self.entries.len() < self.max_size {
            self.entries.insert(
                pos,
                PoolEntry {
                    key: key.to_string(),
                    last_access,
                },
            );
        } else if pos < self.entries.len() {
            self.entries.pop();
            self.entries.insert(
                pos,
                PoolEntry {
                    key: key.to_string(),
                    last_access,
                },
            );
        }
    }

    /// Removes and returns the oldest candidate.
    pub(crate) fn pop_oldest(&mut self) -> Option<PoolEntry> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }
}

/// Evicts up to `target` keys under `policy`. Returns the number
/// actually removed (less than `target` only if the store ran out).
pub(crate) fn run(dict: &mut Dict, policy: EvictionPolicy, target: usize) -> usize {
    match policy {
        EvictionPolicy::AllkeysRandom => evict_random(dict, target),
        EvictionPolicy::AllkeysLru => evict_lru(dict, target),
    }
}

fn evict_random(dict: &mut Dict, target: usize) -> usize {
    let mut rng = rand::thread_rng();
    let mut removed = 0;

    while removed < target {
        let victim = match dict.store.keys().choose(&mut rng) {
            Some(key) => key.clone(),
            None => break,
        };
        dict.store.remove(&victim);
        dict.expires.remove(&victim);
        removed += 1;
    }
    removed
}

fn evict_lru(dict: &mut Dict, target: usize) -> usize {
    let mut rng = rand::thread_rng();
    let mut removed = 0;

    while removed < target && !dict.store.is_empty() {
        // Refill: offer a fresh random sample to the pool.
        let sample: Vec<(String, u32)> = dict
            .store
            .values()
            .choose_multiple(&mut rng, dict.pool.sample_size())
            .into_iter()
            .map(|obj| (obj.key.clone(), obj.last_access))
            .collect();
        for (key, last_access) in &sample {
            dict.pool.offer(key, *last_access);
        }

        // Evict the oldest live candidate; stale snapshots are dropped
        // on the way. An emptied pool sends us back to refill.
        while let Some(entry) = dict.pool.pop_oldest() {
            let live = dict
                .store
                .get(&entry.key)
                .is_some_and(|obj| obj.last_access == entry.last_access);
            if live {
                dict.store.remove(&entry.key);
                dict.expires.remove(&entry.key);
                removed += 1;
                break;
            }
        }
    }
    removed
}
