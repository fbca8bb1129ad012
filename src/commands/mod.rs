//! Command processing layer.
//!
//! Sits between the protocol codec and the stores: parsed request frames
//! come in, replies go out. The dispatcher is stateless — it borrows the
//! stores for the duration of one command and keeps nothing between
//! frames.
//!
//! ## Command surface
//!
//! - Keyspace: `PING`, `SET`, `GET`, `TTL`, `EXPIRE`, `DEL`, `EXISTS`,
//!   `INFO`
//! - Sorted sets: `ZADD`, `ZSCORE`, `ZRANK`
//! - Sets: `SADD`, `SREM`, `SMEMBERS`, `SISMEMBER`
//! - Count-Min Sketch: `CMS.INITBYDIM`, `CMS.INITBYPROB`, `CMS.INCRBY`,
//!   `CMS.QUERY`
//! - Bloom filter: `BF.RESERVE`, `BF.MADD`, `BF.EXISTS`
//!
//! Anything else answers `-CMD NOT FOUND`.

pub mod handler;

pub use handler::execute;
