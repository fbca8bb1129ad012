//! Storage layer: keyspace, expiration, eviction, and the registries.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Stores                          │
//! │  ┌───────────────┐  ┌───────┐ ┌──────┐ ┌────┐ ┌────┐ │
//! │  │ Dict          │  │ zsets │ │ sets │ │cms │ │ bf │ │
//! │  │ store/expires │  └───────┘ └──────┘ └────┘ └────┘ │
//! │  │ eviction pool │                                   │
//! │  └───────┬───────┘                                   │
//! └──────────┼───────────────────────────────────────────┘
//!            │
//!   ┌────────┴────────┐
//!   │  ExpiryManager  │   sampled expiry between polls
//!   │ (loop-driven)   │
//!   └─────────────────┘
//! ```
//!
//! Everything here is owned by the event-loop thread and mutated through
//! `&mut` — operations are totally ordered and unsynchronized. Expired
//! keys are reclaimed two ways: passively when a read touches them, and
//! actively by the loop's sampled maintenance phase. The key ceiling is
//! enforced at write time (before a new key is inserted) and again each
//! loop iteration.

pub mod dict;
pub mod evict;
pub mod expiry;
pub mod stores;

pub use dict::{Dict, DictOptions, Obj};
pub use evict::EvictionPolicy;
pub use expiry::{run_expiration_round, ExpiryConfig, ExpiryManager};
pub use stores::Stores;
