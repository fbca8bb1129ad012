//! Per-connection read-execute-respond cycle.
//!
//! Each accepted socket is nonblocking and owned by the event loop. When
//! the loop sees the socket readable it calls [`Connection::on_readable`],
//! which drains the socket in fixed 512-byte chunks into a per-connection
//! accumulator, executes every complete frame, and writes each reply
//! before parsing the next frame — so commands on one connection are
//! strictly ordered, and the reply to one is on the wire before the next
//! byte of input is interpreted.
//!
//! Failures are connection-scoped: a malformed frame, an I/O error, EOF,
//! or an oversized frame ends this connection and nothing else.

use crate::commands;
use crate::protocol::{ParseError, RespParser, RespValue};
use crate::storage::Stores;
use bytes::BytesMut;
use mio::net::TcpStream;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use tracing::{trace, warn};

/// Bytes read from the socket per read call.
pub const READ_CHUNK: usize = 512;

/// Cap on the per-connection accumulator; a frame larger than this drops
/// the connection.
pub const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Server-wide connection counters. Plain integers — the loop is the
/// only writer.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    pub connections_accepted: u64,
    pub commands_processed: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&mut self) {
        self.connections_accepted += 1;
    }

    pub fn command_processed(&mut self) {
        self.commands_processed += 1;
    }
}

/// State for one client connection.
pub struct Connection {
    socket: TcpStream,
    addr: SocketAddr,
    buffer: BytesMut,
    parser: RespParser,
}

impl Connection {
    pub fn new(socket: TcpStream, addr: SocketAddr) -> Self {
        Self {
            socket,
            addr,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            parser: RespParser::new(),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The underlying socket, for registry (de)registration.
    pub fn socket_mut(&mut self) -> &mut TcpStream {
        &mut self.socket
    }

    /// Services a readiness event: reads until the socket would block,
    /// executing and answering every complete frame on the way. Any
    /// returned error means the connection is done and must be closed.
    pub fn on_readable(
        &mut self,
        stores: &mut Stores,
        stats: &mut ConnectionStats,
    ) -> Result<(), ConnectionError> {
        loop {
            if self.buffer.len() >= MAX_BUFFER_SIZE {
                warn!(
                    client = %self.addr,
                    buffered = self.buffer.len(),
                    "frame exceeds buffer cap"
                );
                return Err(ConnectionError::BufferFull);
            }

            let mut chunk = [0u8; READ_CHUNK];
            match self.socket.read(&mut chunk) {
                Ok(0) => {
                    return if self.buffer.is_empty() {
                        Err(ConnectionError::Closed)
                    } else {
                        // EOF in the middle of a frame.
                        Err(ConnectionError::UnexpectedEof)
                    };
                }
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);
                    stats.bytes_read += n as u64;
                    self.drain_frames(stores, stats)?;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ConnectionError::Io(e)),
            }
        }
    }

    /// Executes every complete frame sitting in the accumulator.
    fn drain_frames(
        &mut self,
        stores: &mut Stores,
        stats: &mut ConnectionStats,
    ) -> Result<(), ConnectionError> {
        loop {
            let parsed = self.parser.parse(&self.buffer).map_err(|e| {
                warn!(client = %self.addr, error = %e, "malformed frame");
                ConnectionError::Parse(e)
            })?;
            let Some((frame, consumed)) = parsed else {
                return Ok(());
            };

            let _ = self.buffer.split_to(consumed);
            trace!(client = %self.addr, consumed, "frame parsed");

            let reply = commands::execute(stores, frame);
            stats.command_processed();
            self.write_reply(&reply, stats)?;
        }
    }

    fn write_reply(
        &mut self,
        reply: &RespValue,
        stats: &mut ConnectionStats,
    ) -> Result<(), ConnectionError> {
        let bytes = reply.serialize();
        let mut written = 0;
        while written < bytes.len() {
            match self.socket.write(&bytes[written..]) {
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // A full send buffer means the client is not reading its
                // replies; drop it rather than stall the loop.
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Err(ConnectionError::WriteStalled);
                }
                Err(e) => return Err(ConnectionError::Io(e)),
            }
        }
        stats.bytes_written += bytes.len() as u64;
        Ok(())
    }
}

/// Reasons a connection ends.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Clean EOF with an empty accumulator.
    #[error("client disconnected")]
    Closed,

    #[error("unexpected end of stream")]
    UnexpectedEof,

    #[error("buffer cap exceeded")]
    BufferFull,

    #[error("client not draining replies")]
    WriteStalled,
}
