//! Two-player networked Tetris (workspace facade crate).
//!
//! The implementation lives in dedicated crates under `crates/`; this package
//! re-exports them under one roof and hosts the binaries, integration tests
//! and benches.

pub use tetris_versus_client as client;
pub use tetris_versus_core as core;
pub use tetris_versus_net as net;
pub use tetris_versus_protocol as protocol;
pub use tetris_versus_server as server;
pub use tetris_versus_types as types;

/// Install the `tracing` subscriber used by the binaries (`RUST_LOG`,
/// default `info`). Logs go to stderr so stdout stays machine-readable.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
