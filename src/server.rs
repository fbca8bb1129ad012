//! Single-threaded event-loop server.
//!
//! One thread owns everything: the readiness notifier, every socket, the
//! keyspace, and all registries. Each iteration:
//!
//! 1. `poll` with a bounded timeout (default 50 ms).
//! 2. For each ready token: accept on a listener, or run the owning
//!    connection's read-execute-respond cycle.
//! 3. Run the maintenance phase: sampled active expiration (rate-limited
//!    to its period) and a key-ceiling check.
//! 4. Observe the shutdown flag; when set, close all clients and return.
//!
//! Because no other thread touches any of this state, command execution
//! is totally ordered: commands on one connection execute in arrival
//! order, and cross-connection order is the notifier's event order plus
//! the loop's iteration order over ready events. No locks anywhere.
//!
//! Error scope follows the descriptor: a failing client costs exactly
//! that connection, while a failing *listener* is fatal — `run` returns
//! the error so the process can exit non-zero.

use crate::config::Config;
use crate::connection::{Connection, ConnectionError, ConnectionStats};
use crate::storage::{ExpiryManager, Stores};
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Readiness events drained per poll.
const EVENTS_CAPACITY: usize = 1024;

/// The event loop and everything it owns.
pub struct Server {
    poll: Poll,
    /// Listening sockets, registered at tokens `0..listeners.len()`.
    listeners: Vec<TcpListener>,
    /// Accepted clients by token.
    conns: HashMap<Token, Connection>,
    next_token: usize,
    stores: Stores,
    expiry: ExpiryManager,
    stats: ConnectionStats,
    /// Set from signal context; observed once per iteration.
    shutdown: Arc<AtomicBool>,
    poll_timeout: Duration,
    max_connections: usize,
}

impl Server {
    /// Registers the listeners and assembles the loop state. The
    /// listeners must already be bound and nonblocking.
    pub fn new(
        mut listeners: Vec<TcpListener>,
        stores: Stores,
        config: &Config,
    ) -> io::Result<Self> {
        let poll = Poll::new()?;
        for (index, listener) in listeners.iter_mut().enumerate() {
            poll.registry()
                .register(listener, Token(index), Interest::READABLE)?;
        }

        let next_token = listeners.len();
        Ok(Server {
            poll,
            listeners,
            conns: HashMap::new(),
            next_token,
            stores,
            expiry: ExpiryManager::with_defaults(),
            stats: ConnectionStats::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            poll_timeout: config.poll_timeout,
            max_connections: config.max_connections,
        })
    }

    /// Flag that stops the loop at the end of the current iteration.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Runs the loop until the shutdown flag is set (Ok) or a listener
    /// fails (Err — the caller should exit non-zero).
    pub fn run(&mut self) -> io::Result<()> {
        let mut events = Events::with_capacity(EVENTS_CAPACITY);
        info!(listeners = self.listeners.len(), "event loop running");

        while !self.shutdown.load(Ordering::Relaxed) {
            if let Err(e) = self.poll.poll(&mut events, Some(self.poll_timeout)) {
                // A signal landing mid-poll interrupts it; the flag is
                // checked at the top of the loop.
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e);
            }

            let ready: Vec<Token> = events.iter().map(|event| event.token()).collect();
            for token in ready {
                if token.0 < self.listeners.len() {
                    self.accept_ready(token.0)?;
                } else {
                    self.client_ready(token);
                }
            }

            self.expiry.on_tick(&mut self.stores.dict);
            self.stores.dict.enforce_ceiling();
        }

        info!(clients = self.conns.len(), "shutdown flag set, closing clients");
        let open: Vec<Token> = self.conns.keys().copied().collect();
        for token in open {
            self.close(token);
        }
        Ok(())
    }

    /// Drains pending connections off a ready listener. Listener-level
    /// errors propagate — they are fatal for the whole loop.
    fn accept_ready(&mut self, index: usize) -> io::Result<()> {
        loop {
            match self.listeners[index].accept() {
                Ok((socket, addr)) => {
                    if self.conns.len() >= self.max_connections {
                        warn!(client = %addr, "connection limit reached, refusing client");
                        drop(socket);
                        continue;
                    }
                    self.register_client(socket, addr);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(listener = index, error = %e, "listener failed");
                    return Err(e);
                }
            }
        }
    }

    fn register_client(&mut self, mut socket: TcpStream, addr: SocketAddr) {
        let token = Token(self.next_token);
        self.next_token += 1;

        if let Err(e) = self
            .poll
            .registry()
            .register(&mut socket, token, Interest::READABLE)
        {
            warn!(client = %addr, error = %e, "failed to register client");
            return;
        }

        self.stats.connection_opened();
        debug!(client = %addr, "client connected");
        self.conns.insert(token, Connection::new(socket, addr));
    }

    fn client_ready(&mut self, token: Token) {
        let Some(conn) = self.conns.get_mut(&token) else {
            // Token already closed earlier in this batch.
            return;
        };
        let addr = conn.addr();

        match conn.on_readable(&mut self.stores, &mut self.stats) {
            Ok(()) => {}
            Err(ConnectionError::Closed) => {
                debug!(client = %addr, "client disconnected");
                self.close(token);
            }
            Err(e) => {
                debug!(client = %addr, error = %e, "closing connection");
                self.close(token);
            }
        }
    }

    fn close(&mut self, token: Token) {
        if let Some(mut conn) = self.conns.remove(&token) {
            let _ = self.poll.registry().deregister(conn.socket_mut());
        }
    }
}
