//! Server configuration.

use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::time::Duration;

use anyhow::Context;

use tetris_versus_types::{DEFAULT_PORT, PING_INTERVAL_MS, PONG_TIMEOUT_MS};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Cadence of `ServerPing` to validated sessions
    pub ping_interval: Duration,
    /// Silence allowed since a session's last pong
    pub pong_timeout: Duration,
    /// Longest the tick loop waits for the first event
    pub tick: Duration,
    /// tokio worker threads for socket I/O
    pub net_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            ping_interval: Duration::from_millis(PING_INTERVAL_MS),
            pong_timeout: Duration::from_millis(PONG_TIMEOUT_MS),
            tick: Duration::from_millis(16),
            net_threads: 1,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl ServerConfig {
    /// Create from environment variables, falling back to the defaults.
    ///
    /// `TETRIS_SERVER_HOST`, `TETRIS_SERVER_PORT`, `TETRIS_PING_INTERVAL_MS`,
    /// `TETRIS_PONG_TIMEOUT_MS`, `TETRIS_TICK_MS`, `TETRIS_NET_THREADS`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("TETRIS_SERVER_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);
        let port = env_parse("TETRIS_SERVER_PORT").unwrap_or(defaults.port);
        let ping_interval = env_parse("TETRIS_PING_INTERVAL_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.ping_interval);
        let pong_timeout = env_parse("TETRIS_PONG_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.pong_timeout);
        let tick = env_parse("TETRIS_TICK_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick);
        let net_threads = env_parse("TETRIS_NET_THREADS").unwrap_or(defaults.net_threads);

        Self {
            host,
            port,
            ping_interval,
            pong_timeout,
            tick,
            net_threads,
        }
    }

    /// Resolve `host:port` to the first matching address.
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))?
            .next()
            .with_context(|| format!("{}:{} resolved to no address", self.host, self.port))
    }
}

/// Fail fast if `host:port` cannot be bound (typically `AddrInUse`).
pub fn check_tcp_listen_available(host: &str, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind((host, port))?;
    drop(listener);
    Ok(())
}
