//! # TideKV
//!
//! An in-memory key-value server speaking a RESP subset over TCP, with
//! TTL expiration, bounded-memory eviction, and a small family of
//! secondary data structures: an order-statistic B+ tree for sorted
//! sets, plain sets, a Count-Min Sketch, and a Bloom filter.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                event loop (one thread, mio poll)             │
//! │                                                              │
//! │  listeners ──accept──► connections ──frames──► executor      │
//! │                             │                     │          │
//! │                        RESP parser          ┌─────┴────────┐ │
//! │                                             │    Stores    │ │
//! │                                             │ dict  zsets  │ │
//! │                                             │ sets  cms bf │ │
//! │                                             └─────┬────────┘ │
//! │                                                   │          │
//! │  maintenance (between polls) ─────────────────────┘          │
//! │  sampled expiry + ceiling checks                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A single thread owns the readiness notifier, every socket, and all
//! store state, so command execution is totally ordered and nothing is
//! locked. Commands on one connection are executed and answered strictly
//! in arrival order; cross-connection order follows the notifier's event
//! order. The only other thread is signal delivery, which sets a
//! shutdown flag the loop observes once per iteration.
//!
//! ## Memory bounds
//!
//! Keys with a TTL are reclaimed passively on access and actively by the
//! loop's sampled maintenance phase. When the key population reaches the
//! configured ceiling, the eviction engine removes a configurable
//! fraction of keys — uniformly at random, or approximately
//! least-recently-used via a bounded candidate pool.
//!
//! ## Modules
//!
//! - [`protocol`]: RESP codec (resumable parser + reply serializer)
//! - [`storage`]: keyspace, expiration, eviction, registries
//! - [`ds`]: B+ tree, simple set, Count-Min Sketch, Bloom filter
//! - [`commands`]: stateless command dispatch and execution
//! - [`connection`]: per-client read-execute-respond cycle
//! - [`server`]: the event loop itself
//! - [`config`]: constants and command-line overrides

pub mod commands;
pub mod config;
pub mod connection;
pub mod ds;
pub mod protocol;
pub mod server;
pub mod storage;

pub use config::Config;
pub use connection::{Connection, ConnectionStats};
pub use protocol::{ParseError, RespParser, RespValue};
pub use server::Server;
pub use storage::{run_expiration_round, Dict, ExpiryConfig, ExpiryManager, Stores};

/// Default port the server listens on.
pub const DEFAULT_PORT: u16 = 3000;

/// Default host the server binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
