//! Network runtime ownership.
//!
//! Every server or client session owns one [`NetRuntime`]: a small tokio
//! multi-thread runtime whose workers drive all socket I/O. The logic thread
//! stays outside it and talks to it through the inbox and the connection
//! handles.

use std::future::Future;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::NetError;

pub struct NetRuntime {
    handle: Handle,
    rt: Option<Runtime>,
}

impl NetRuntime {
    /// Start a runtime with `worker_threads` I/O workers (at least one).
    pub fn new(worker_threads: usize) -> Result<Self, NetError> {
        let rt = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("tetris-net")
            .enable_all()
            .build()
            .map_err(NetError::Runtime)?;
        Ok(Self {
            handle: rt.handle().clone(),
            rt: Some(rt),
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Run `future` to completion on the calling (non-async) thread.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.handle.block_on(future)
    }
}

impl Drop for NetRuntime {
    fn drop(&mut self) {
        // A plain drop blocks on worker shutdown and panics inside async code.
        if let Some(rt) = self.rt.take() {
            rt.shutdown_background();
        }
    }
}

impl std::fmt::Debug for NetRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetRuntime")
            .field("workers", &self.handle.metrics().num_workers())
            .finish()
    }
}
