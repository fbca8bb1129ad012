//! Active expiration.
//!
//! Passive expiry (on access) never touches keys nobody reads, so the
//! event loop runs a maintenance phase between polls: sample a handful
//! of random keys from the expiry map, delete the expired ones, and
//! repeat while the sample keeps coming back dirty. Sampling means no
//! round ever scans the whole keyspace; a time budget keeps a dirty
//! burst from monopolizing the loop, and the sweep itself is rate
//! limited so an idle loop iteration costs nothing.

use crate::storage::dict::Dict;
use std::time::{Duration, Instant};
use tracing::debug;

/// Tunables for active expiration.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Minimum interval between sweeps.
    pub period: Duration,
    /// Keys sampled from the expiry map per round.
    pub sample_size: usize,
    /// Re-sample while more than this fraction of the sample was expired.
    pub threshold: f64,
    /// Hard cap on one sweep's execution time.
    pub budget: Duration,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(100),
            sample_size: 20,
            threshold: 0.25,
            budget: Duration::from_millis(25),
        }
    }
}

/// Drives sampled expiration from the event loop.
///
/// Stateless apart from the last-sweep timestamp: `on_tick` is called
/// once per loop iteration and runs a sweep at most every
/// [`ExpiryConfig::period`].
#[derive(Debug)]
pub struct ExpiryManager {
    config: ExpiryConfig,
    last_sweep: Option<Instant>,
}

impl ExpiryManager {
    pub fn new(config: ExpiryConfig) -> Self {
        Self {
            config,
            last_sweep: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ExpiryConfig::default())
    }

    /// Runs a sweep if the period has elapsed since the last one.
    /// Returns the number of keys removed.
    pub fn on_tick(&mut self, dict: &mut Dict) -> usize {
        if let Some(last) = self.last_sweep {
            if last.elapsed() < self.config.period {
                return 0;
            }
        }
        self.last_sweep = Some(Instant::now());

        let expired = run_expiration_round(dict, &self.config);
        if expired > 0 {
            debug!(expired, keys = dict.len(), "active expiration reclaimed keys");
        }
        expired
    }
}

/// One sweep: sampled rounds until the sample comes back mostly clean,
/// the expiry map is exhausted, or the time budget runs out. Returns the
/// number of keys removed.
pub fn run_expiration_round(dict: &mut Dict, config: &ExpiryConfig) -> usize {
    let started = Instant::now();
    let mut total = 0;

    loop {
        let (removed, sampled) = dict.expire_sample(config.sample_size);
        total += removed;

        if sampled == 0 {
            break;
        }
        if (removed as f64) / (sampled as f64) <= config.threshold {
            break;
        }
        if started.elapsed() >= config.budget {
            break;
        }
    }
    total
}
