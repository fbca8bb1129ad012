//! Keyspace with TTL.
//!
//! Two parallel maps over string keys: `store` holds the value objects,
//! `expires` holds absolute expiry timestamps (UNIX ms) for the subset of
//! keys that carry a TTL. A key in `expires` is always in `store`, and a
//! deadline at or before "now" means the key is logically absent even
//! while physically present — the read path deletes it on first touch
//! (passive expiration) and the event loop's maintenance phase catches
//! the rest.
//!
//! The dict is owned by the event-loop thread and mutated through
//! `&mut self` only: operations are totally ordered, so no lock guards
//! any of this state, and an eviction round triggered by the key ceiling
//! completes before the insert that triggered it.

use crate::storage::evict::{self, EvictionPolicy, EvictionPool};
use rand::seq::IteratorRandom;
use std::collections::HashMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A stored value object.
#[derive(Debug, Clone)]
pub struct Obj {
    /// The owning key, kept for reverse identification when objects are
    /// reached through sampling.
    pub key: String,
    pub value: String,
    /// Monotonic millisecond tick (wrapping) of the last successful
    /// lookup; eviction recency is judged against this.
    pub last_access: u32,
}

/// Tunables for the keyspace, mirrored from the server configuration.
#[derive(Debug, Clone)]
pub struct DictOptions {
    /// Key-count ceiling; inserting a new key beyond it triggers eviction.
    pub max_keys: usize,
    /// Fraction of `max_keys` evicted per round.
    pub eviction_ratio: f64,
    pub policy: EvictionPolicy,
    /// Eviction pool capacity (LRU policy).
    pub pool_size: usize,
    /// Keys sampled per eviction round (LRU policy).
    pub sample_size: usize,
}

impl Default for DictOptions {
    fn default() -> Self {
        DictOptions {
            max_keys: 1_000_000,
            eviction_ratio: 0.1,
            policy: EvictionPolicy::AllkeysRandom,
            pool_size: evict::DEFAULT_POOL_SIZE,
            sample_size: evict::DEFAULT_SAMPLE_SIZE,
        }
    }
}

/// The primary keyspace.
pub struct Dict {
    pub(crate) store: HashMap<String, Obj>,
    pub(crate) expires: HashMap<String, u64>,
    pub(crate) pool: EvictionPool,
    /// Origin for `last_access` ticks.
    origin: Instant,
    max_keys: usize,
    eviction_ratio: f64,
    policy: EvictionPolicy,
}

impl Dict {
    pub fn new(opts: DictOptions) -> Self {
        Dict {
            store: HashMap::new(),
            expires: HashMap::new(),
            pool: EvictionPool::new(opts.pool_size, opts.sample_size),
            origin: Instant::now(),
            max_keys: opts.max_keys,
            eviction_ratio: opts.eviction_ratio,
            policy: opts.policy,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DictOptions::default())
    }

    /// Current access tick. Wraps after ~49 days, which only perturbs
    /// recency comparisons briefly.
    fn ticks(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }

    /// Builds a value object stamped with the current access tick.
    fn new_obj(&self, key: &str, value: &str) -> Obj {
        Obj {
            key: key.to_string(),
            value: value.to_string(),
            last_access: self.ticks(),
        }
    }

    /// Inserts or replaces a key. A non-negative `ttl_ms` records an
    /// absolute expiry; a negative one clears any prior expiry.
    ///
    /// Before inserting a *new* key at or above the ceiling, an eviction
    /// round removes `⌈max_keys × eviction_ratio⌉` keys.
    pub fn set(&mut self, key: &str, value: &str, ttl_ms: i64) {
        let obj = self.new_obj(key, value);

        let is_new = !self.store.contains_key(key);
        if is_new && self.store.len() >= self.max_keys {
            let policy = self.policy;
            let target = self.eviction_target();
            evict::run(self, policy, target);
        }

        self.store.insert(key.to_string(), obj);
        if ttl_ms >= 0 {
            self.expires
                .insert(key.to_string(), deadline_from_ttl(ttl_ms));
        } else {
            self.expires.remove(key);
        }
    }

    /// Raw read: refreshes `last_access` and returns the value without
    /// consulting the expiry map. Callers on the command path want
    /// [`Dict::lookup`] instead.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let ticks = self.ticks();
        self.store.get_mut(key).map(|obj| {
            obj.last_access = ticks;
            obj.value.clone()
        })
    }

    /// Read path with passive expiration: an expired key is deleted from
    /// both maps and reported as absent.
    pub fn lookup(&mut self, key: &str) -> Option<String> {
        let now = now_ms();
        let ticks = self.ticks();

        if let Some(&deadline) = self.expires.get(key) {
            if deadline <= now {
                self.store.remove(key);
                self.expires.remove(key);
                return None;
            }
        }

        self.store.get_mut(key).map(|obj| {
            obj.last_access = ticks;
            obj.value.clone()
        })
    }

    /// Whether the key has an expiry at or before now.
    pub fn has_expired(&self, key: &str) -> bool {
        self.expires
            .get(key)
            .is_some_and(|&deadline| deadline <= now_ms())
    }

    /// Deletes the key from both maps; true if it was present (expired
    /// or not).
    pub fn del(&mut self, key: &str) -> bool {
        let was_present = self.store.remove(key).is_some();
        self.expires.remove(key);
        was_present
    }

    /// Attaches an expiry to an existing key; no-op when the key is
    /// absent. Returns whether the expiry was set.
    pub fn set_expiry(&mut self, key: &str, ttl_ms: i64) -> bool {
        if !self.store.contains_key(key) {
            return false;
        }
        self.expires
            .insert(key.to_string(), deadline_from_ttl(ttl_ms));
        true
    }

    /// Absolute expiry in UNIX ms, if one is set.
    pub fn get_expiry(&self, key: &str) -> Option<u64> {
        self.expires.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of keys carrying an expiry.
    pub fn expires_len(&self) -> usize {
        self.expires.len()
    }

    /// One active-expiration sample: picks up to `sample_size` random
    /// keys from the expiry map and deletes the expired ones. Returns
    /// `(removed, sampled)` so the caller can decide whether to repeat.
    pub fn expire_sample(&mut self, sample_size: usize) -> (usize, usize) {
        let now = now_ms();
        let mut rng = rand::thread_rng();

        let sampled: Vec<String> = self
            .expires
            .keys()
            .choose_multiple(&mut rng, sample_size)
            .into_iter()
            .cloned()
            .collect();

        let mut removed = 0;
        for key in &sampled {
            if self.expires.get(key).is_some_and(|&d| d <= now) {
                self.store.remove(key);
                self.expires.remove(key);
                removed += 1;
            }
        }
        (removed, sampled.len())
    }

    /// Removes `target` keys under the configured policy (or empties the
    /// store trying). Returns the number actually evicted.
    pub fn evict(&mut self, target: usize) -> usize {
        let policy = self.policy;
        evict::run(self, policy, target)
    }

    /// Runs an eviction round if the store is at or above the ceiling.
    pub fn enforce_ceiling(&mut self) -> usize {
        if self.store.len() < self.max_keys {
            return 0;
        }
        let policy = self.policy;
        let target = self.eviction_target();
        evict::run(self, policy, target)
    }

    fn eviction_target(&self) -> usize {
        ((self.max_keys as f64 * self.eviction_ratio).ceil() as usize).max(1)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(self.expires.len() <= self.store.len());
        for key in self.expires.keys() {
            assert!(
                self.store.contains_key(key),
                "expiry without a stored key: {key}"
            );
        }
    }
}

/// Wall-clock UNIX time in milliseconds.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Absolute deadline for a TTL relative to now. Negative TTLs clamp to
/// the epoch, i.e. already expired.
fn deadline_from_ttl(ttl_ms: i64) -> u64 {
    (now_ms() as i64).saturating_add(ttl_ms).max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dict(max_keys: usize, policy: EvictionPolicy) -> Dict {
        Dict::new(DictOptions {
            max_keys,
            eviction_ratio: 0.1,
            policy,
            ..DictOptions::default()
        })
    }

    #[test]
    fn set_then_get() {
        let mut dict = Dict::with_defaults();
        dict.set("foo", "bar", -1);
        assert_eq!(dict.get("foo"), Some("bar".to_string()));
        assert_eq!(dict.lookup("foo"), Some("bar".to_string()));
        dict.check_invariants();
    }

    #[test]
    fn get_missing_key() {
        let mut dict = Dict::with_defaults();
        assert_eq!(dict.get("nope"), None);
        assert_eq!(dict.lookup("nope"), None);
    }

    #[test]
    fn set_overwrites_value() {
        let mut dict = Dict::with_defaults();
        dict.set("k", "v1", -1);
        dict.set("k", "v2", -1);
        assert_eq!(dict.lookup("k"), Some("v2".to_string()));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn del_removes_both_maps() {
        let mut dict = Dict::with_defaults();
        dict.set("k", "v", 60_000);
        assert!(dict.del("k"));
        assert!(!dict.del("k"));
        assert_eq!(dict.len(), 0);
        assert_eq!(dict.expires_len(), 0);
        dict.check_invariants();
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let mut dict = Dict::with_defaults();
        dict.set("k", "v", 0);
        assert!(dict.has_expired("k"));
        // Passive expiration deletes on first touch.
        assert_eq!(dict.lookup("k"), None);
        assert_eq!(dict.len(), 0);
        assert_eq!(dict.expires_len(), 0);
        dict.check_invariants();
    }

    #[test]
    fn future_ttl_is_not_expired() {
        let mut dict = Dict::with_defaults();
        dict.set("k", "v", 60_000);
        assert!(!dict.has_expired("k"));
        assert_eq!(dict.lookup("k"), Some("v".to_string()));
        let deadline = dict.get_expiry("k").unwrap();
        assert!(deadline > now_ms());
    }

    #[test]
    fn set_without_ttl_clears_prior_expiry() {
        let mut dict = Dict::with_defaults();
        dict.set("k", "v", 60_000);
        assert_eq!(dict.expires_len(), 1);
        dict.set("k", "v2", -1);
        assert_eq!(dict.expires_len(), 0);
        assert_eq!(dict.get_expiry("k"), None);
    }

    #[test]
    fn set_expiry_requires_existing_key() {
        let mut dict = Dict::with_defaults();
        assert!(!dict.set_expiry("ghost", 1000));
        assert_eq!(dict.expires_len(), 0);

        dict.set("k", "v", -1);
        assert!(dict.set_expiry("k", 1000));
        assert!(dict.get_expiry("k").is_some());
        dict.check_invariants();
    }

    #[test]
    fn expire_sample_reaps_only_expired() {
        let mut dict = Dict::with_defaults();
        for i in 0..10 {
            dict.set(&format!("dead{i}"), "v", 0);
        }
        for i in 0..5 {
            dict.set(&format!("live{i}"), "v", 60_000);
        }

        // Sample size covers the whole expiry map, so one pass reaps all.
        let (removed, sampled) = dict.expire_sample(100);
        assert_eq!(removed, 10);
        assert_eq!(sampled, 15);
        assert_eq!(dict.len(), 5);
        assert_eq!(dict.expires_len(), 5);
        dict.check_invariants();
    }

    #[test]
    fn expire_sample_on_empty_dict() {
        let mut dict = Dict::with_defaults();
        assert_eq!(dict.expire_sample(20), (0, 0));
    }

    #[test]
    fn ceiling_triggers_eviction_on_new_key() {
        let mut dict = test_dict(10, EvictionPolicy::AllkeysRandom);
        for i in 0..10 {
            dict.set(&format!("k{i}"), "v", -1);
        }
        assert_eq!(dict.len(), 10);

        dict.set("k10", "v", -1);

        // ⌈10 × 0.1⌉ = 1 evicted, then the new key lands.
        assert_eq!(dict.len(), 10);
        assert_eq!(dict.lookup("k10"), Some("v".to_string()));
        let missing = (0..10)
            .filter(|i| dict.lookup(&format!("k{i}")).is_none())
            .count();
        assert_eq!(missing, 1);
        dict.check_invariants();
    }

    #[test]
    fn updating_existing_key_skips_eviction() {
        let mut dict = test_dict(10, EvictionPolicy::AllkeysRandom);
        for i in 0..10 {
            dict.set(&format!("k{i}"), "v", -1);
        }
        dict.set("k3", "v2", -1);
        assert_eq!(dict.len(), 10);
        for i in 0..10 {
            assert!(dict.lookup(&format!("k{i}")).is_some());
        }
    }

    #[test]
    fn evict_removes_exact_count() {
        let mut dict = test_dict(1000, EvictionPolicy::AllkeysRandom);
        for i in 0..100 {
            dict.set(&format!("k{i}"), "v", -1);
        }
        assert_eq!(dict.evict(10), 10);
        assert_eq!(dict.len(), 90);
        dict.check_invariants();
    }

    #[test]
    fn evict_stops_at_empty_store() {
        let mut dict = test_dict(1000, EvictionPolicy::AllkeysRandom);
        for i in 0..5 {
            dict.set(&format!("k{i}"), "v", -1);
        }
        assert_eq!(dict.evict(50), 5);
        assert!(dict.is_empty());
    }

    #[test]
    fn lru_eviction_respects_ceiling() {
        let mut dict = test_dict(10, EvictionPolicy::AllkeysLru);
        for i in 0..12 {
            dict.set(&format!("k{i}"), "v", -1);
        }
        assert!(dict.len() <= 10);
        dict.check_invariants();
    }

    #[test]
    fn enforce_ceiling_is_quiet_below_limit() {
        let mut dict = test_dict(100, EvictionPolicy::AllkeysRandom);
        for i in 0..50 {
            dict.set(&format!("k{i}"), "v", -1);
        }
        assert_eq!(dict.enforce_ceiling(), 0);
        assert_eq!(dict.len(), 50);
    }
}
