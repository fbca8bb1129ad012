//! Client connection management.
//!
//! The event loop owns every accepted socket and calls into
//! [`Connection`] when the readiness notifier reports one readable. The
//! connection drains 512-byte chunks into its accumulator, frames them
//! through the RESP parser, executes each command, and writes the reply
//! before touching the next frame. Connection failures never propagate
//! past the loop's per-client handling — a bad client costs exactly one
//! connection.

pub mod handler;

pub use handler::{Connection, ConnectionError, ConnectionStats, MAX_BUFFER_SIZE, READ_CHUNK};
