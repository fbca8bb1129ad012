//! Server configuration.
//!
//! Everything is a constant default with a command-line override — there
//! is no configuration file. The defaults mirror the documented
//! production settings; tests shrink `max_keys` to exercise eviction.

use crate::ds::bplustree::DEFAULT_DEGREE;
use crate::storage::{DictOptions, EvictionPolicy};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Hard cap on concurrent client connections.
    pub max_connections: usize,
    /// Listening sockets sharing the port (and the notifier).
    pub listeners: usize,
    /// Upper bound on one `poll` call, which also bounds the latency to
    /// the maintenance phase.
    pub poll_timeout: Duration,
    /// Key-count ceiling for the keyspace.
    pub max_keys: usize,
    /// Fraction of `max_keys` evicted per round.
    pub eviction_ratio: f64,
    pub eviction_policy: EvictionPolicy,
    /// LRU eviction pool capacity.
    pub epool_max_size: usize,
    /// Keys sampled per LRU eviction round.
    pub epool_sample_size: usize,
    /// Degree of trees created by ZADD.
    pub zset_degree: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_connections: 20_000,
            listeners: 2,
            poll_timeout: Duration::from_millis(50),
            max_keys: 1_000_000,
            eviction_ratio: 0.1,
            eviction_policy: EvictionPolicy::AllkeysRandom,
            epool_max_size: 16,
            epool_sample_size: 5,
            zset_degree: DEFAULT_DEGREE,
        }
    }
}

impl Config {
    /// Parses configuration from the command line.
    pub fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    config.host = take_value(&args, &mut i, "--host");
                }
                "--port" | "-p" => {
                    let raw = take_value(&args, &mut i, "--port");
                    config.port = raw.parse().unwrap_or_else(|_| {
                        eprintln!("Error: invalid port number");
                        std::process::exit(1);
                    });
                }
                "--max-keys" => {
                    let raw = take_value(&args, &mut i, "--max-keys");
                    config.max_keys = raw.parse().unwrap_or_else(|_| {
                        eprintln!("Error: invalid key limit");
                        std::process::exit(1);
                    });
                }
                "--eviction-policy" => {
                    let raw = take_value(&args, &mut i, "--eviction-policy");
                    config.eviction_policy = raw.parse().unwrap_or_else(|e| {
                        eprintln!("Error: {e}");
                        std::process::exit(1);
                    });
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("tidekv version {}", crate::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    print_help();
                    std::process::exit(1);
                }
            }
            i += 1;
        }

        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Keyspace tunables derived from this configuration.
    pub fn dict_options(&self) -> DictOptions {
        DictOptions {
            max_keys: self.max_keys,
            eviction_ratio: self.eviction_ratio,
            policy: self.eviction_policy,
            pool_size: self.epool_max_size,
            sample_size: self.epool_sample_size,
        }
    }
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    match args.get(*i) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {flag} requires a value");
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        r#"
tidekv - an in-memory RESP key-value server

USAGE:
    tidekv [OPTIONS]

OPTIONS:
    -h, --host <HOST>              Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>              Port to listen on (default: 3000)
        --max-keys <N>             Key ceiling before eviction (default: 1000000)
        --eviction-policy <NAME>   allkeys-random | allkeys-lru
    -v, --version                  Print version information
        --help                     Print this help message

CONNECTING:
    Any RESP client works:
    $ redis-cli -p 3000
    127.0.0.1:3000> SET foo bar
    OK
    127.0.0.1:3000> GET foo
    "bar"
"#
    );
}
