//! Unbounded FIFO between the network tasks and the logic thread.
//!
//! Producers are network tasks holding cloned [`InboxSender`]s; the single
//! consumer is whichever thread owns the [`Inbox`]. Pushing never blocks and
//! never fails from the producer's point of view.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::event::NetEvent;

/// Create a connected sender/inbox pair.
///
/// `handle` drives the timer behind [`Inbox::pop_timeout`].
pub fn channel<T>(handle: Handle) -> (InboxSender<T>, Inbox<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InboxSender { tx }, Inbox { rx, handle })
}

/// Producer side.
#[derive(Debug)]
pub struct InboxSender<T = NetEvent> {
    tx: mpsc::UnboundedSender<T>,
}

// Manual impl: derive(Clone) would require `T: Clone`.
impl<T> Clone for InboxSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> InboxSender<T> {
    /// Enqueue an item, waking a blocked consumer. Dropped silently once the
    /// consumer is gone.
    pub fn push(&self, item: T) {
        let _ = self.tx.send(item);
    }
}

/// Consumer side.
///
/// The blocking pops must be called from a thread that is not running async
/// code (the server tick loop or a client frame loop).
#[derive(Debug)]
pub struct Inbox<T = NetEvent> {
    rx: mpsc::UnboundedReceiver<T>,
    handle: Handle,
}

impl<T> Inbox<T> {
    /// Next item if one is queued.
    pub fn pop_nonblocking(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next item. `None` once every sender is gone and the
    /// queue is drained.
    pub fn pop_blocking(&mut self) -> Option<T> {
        self.rx.blocking_recv()
    }

    /// Wait up to `timeout` for the next item.
    pub fn pop_timeout(&mut self, timeout: Duration) -> Option<T> {
        if let Some(item) = self.pop_nonblocking() {
            return Some(item);
        }
        let rx = &mut self.rx;
        self.handle
            .block_on(async { tokio::time::timeout(timeout, rx.recv()).await })
            .ok()
            .flatten()
    }

    /// Async receive, for consumers that live on the runtime.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Racy snapshot; only a hint.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
