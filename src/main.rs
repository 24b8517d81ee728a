//! Versus server runner (default binary).
//!
//! Configured entirely through the environment; see
//! [`ServerConfig::from_env`](tetris_versus::server::ServerConfig::from_env).
//! Runs until the process is killed.

use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use tracing::info;

use tetris_versus::server::{check_tcp_listen_available, Server, ServerConfig};

fn main() -> Result<()> {
    tetris_versus::init_tracing();

    let config = ServerConfig::from_env();
    check_tcp_listen_available(&config.host, config.port)
        .with_context(|| format!("cannot listen on {}:{}", config.host, config.port))?;

    info!(
        host = %config.host,
        port = config.port,
        ping_ms = config.ping_interval.as_millis() as u64,
        pong_timeout_ms = config.pong_timeout.as_millis() as u64,
        "starting versus server"
    );

    let mut server = Server::bind(config)?;
    let stop = AtomicBool::new(false);
    server.run(&stop);
    Ok(())
}
