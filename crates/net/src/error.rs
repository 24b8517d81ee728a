use std::io;
use std::time::Duration;

use thiserror::Error;

/// Transport-level failure.
///
/// Codec errors never surface here: a connection that receives a bad frame
/// logs it and closes, and the owner only sees the `Disconnected` event.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("failed to start network runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("connecting to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("not connected")]
    NotConnected,

    #[error("connection closed before queued writes were flushed")]
    Closed,

    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
