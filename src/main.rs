//! TideKV server entry point.
//!
//! Binds the listening sockets, installs the signal-driven shutdown
//! flag, and hands everything to the single-threaded event loop. A
//! fatal listener error propagates out of [`Server::run`] and exits the
//! process non-zero.

use anyhow::Context;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tidekv::config::Config;
use tidekv::server::Server;
use tidekv::storage::{Dict, Stores};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let listeners = bind_listeners(&config)?;
    let dict = Dict::new(config.dict_options());
    let stores = Stores::new(dict, config.zset_degree);
    let mut server = Server::new(listeners, stores, &config)?;

    // Signal delivery runs outside the loop thread and only flips this
    // flag; the loop observes it once per iteration.
    let shutdown = server.shutdown_handle();
    signal_hook::flag::register(signal_hook::consts::SIGINT, shutdown.clone())
        .context("failed to install SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, shutdown)
        .context("failed to install SIGTERM handler")?;

    info!(
        address = %config.bind_address(),
        max_keys = config.max_keys,
        policy = %config.eviction_policy,
        "tidekv v{} listening",
        tidekv::VERSION
    );

    server.run()?;

    info!("server shutdown complete");
    Ok(())
}

/// Binds `config.listeners` nonblocking sockets to the same address with
/// `SO_REUSEPORT`, so the kernel spreads incoming connections across
/// them while the loop watches all of them through one notifier.
fn bind_listeners(config: &Config) -> anyhow::Result<Vec<mio::net::TcpListener>> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;

    let mut listeners = Vec::with_capacity(config.listeners.max(1));
    for _ in 0..config.listeners.max(1) {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(1024)?;
        listeners.push(mio::net::TcpListener::from_std(socket.into()));
    }
    Ok(listeners)
}
