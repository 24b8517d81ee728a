//! Framed connection over one byte stream.
//!
//! # Tasks
//!
//! [`Connection::spawn`] splits the stream and starts two tasks on the given
//! runtime handle:
//!
//! - **reader**: reads chunks into a [`FrameDecoder`] and pushes every whole
//!   message to the owner's inbox as [`NetEvent::Message`]
//! - **writer**: drains the outbound queue, writing each frame in order
//!
//! The [`Connection`] value itself is a cheap handle (`Clone`) onto shared
//! state; it can be used from any thread.
//!
//! # Lifecycle
//!
//! ```text
//! Connecting -> Open -> Closing -> Closed
//! ```
//!
//! Whatever ends the connection (peer EOF, socket error, malformed frame,
//! [`Connection::disconnect`], a completed [`Connection::shutdown`]) the
//! owner's inbox receives exactly one [`NetEvent::Disconnected`].

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, trace, warn};

use tetris_versus_protocol::{encode, FrameDecoder, Message};

use crate::error::NetError;
use crate::event::NetEvent;
use crate::inbox::InboxSender;

/// Connection identifier. On the server this is also the player id.
pub type ConnectionId = u32;

/// Read buffer size per `read` call.
const READ_CHUNK: usize = 4096;

/// Upper bound on a single frame write (and on the final flush of a
/// shutdown).
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Open,
            2 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

enum Outbound {
    Frame(Vec<u8>),
    /// Flush everything queued before this, close, then report.
    Close(oneshot::Sender<Result<(), NetError>>),
}

struct Shared {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    state: AtomicU8,
    notified: AtomicBool,
    outbound: mpsc::UnboundedSender<Outbound>,
    closed: watch::Sender<bool>,
    events: InboxSender<NetEvent>,
    write_timeout: Duration,
}

/// Handle to one framed connection.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

impl Connection {
    /// Start the reader and writer tasks for `stream` on `handle`.
    pub fn spawn<S>(
        handle: &Handle,
        id: ConnectionId,
        stream: S,
        peer: Option<SocketAddr>,
        events: InboxSender<NetEvent>,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        Self::spawn_with_timeout(handle, id, stream, peer, events, DEFAULT_WRITE_TIMEOUT)
    }

    pub fn spawn_with_timeout<S>(
        handle: &Handle,
        id: ConnectionId,
        stream: S,
        peer: Option<SocketAddr>,
        events: InboxSender<NetEvent>,
        write_timeout: Duration,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        Self::open(handle, id, stream, peer, events, write_timeout, false)
    }

    /// Like [`spawn`](Self::spawn), but first pushes
    /// [`NetEvent::Connected`] so the owner sees the connection before any of
    /// its messages.
    pub fn accept<S>(
        handle: &Handle,
        id: ConnectionId,
        stream: S,
        peer: Option<SocketAddr>,
        events: InboxSender<NetEvent>,
        write_timeout: Duration,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        Self::open(handle, id, stream, peer, events, write_timeout, true)
    }

    fn open<S>(
        handle: &Handle,
        id: ConnectionId,
        stream: S,
        peer: Option<SocketAddr>,
        events: InboxSender<NetEvent>,
        write_timeout: Duration,
        announce: bool,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = watch::channel(false);

        let conn = Self {
            shared: Arc::new(Shared {
                id,
                peer,
                state: AtomicU8::new(ConnectionState::Connecting as u8),
                notified: AtomicBool::new(false),
                outbound: out_tx,
                closed: closed_tx,
                events,
                write_timeout,
            }),
        };

        conn.set_state(ConnectionState::Open);
        if announce {
            conn.shared.events.push(NetEvent::Connected(conn.clone()));
        }
        handle.spawn(read_loop(conn.clone(), reader, closed_rx.clone()));
        handle.spawn(write_loop(conn.clone(), writer, out_rx, closed_rx));
        conn
    }

    pub fn id(&self) -> ConnectionId {
        self.shared.id
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.shared.peer
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    fn set_state(&self, state: ConnectionState) {
        // states only move forward
        let _ = self
            .shared
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                (cur < state as u8).then_some(state as u8)
            });
    }

    /// Queue a message. Never blocks; dropped if the connection is no longer
    /// open.
    pub fn send(&self, message: &Message) {
        if !self.is_open() {
            trace!(id = self.id(), kind = ?message.kind(), "send on closed connection dropped");
            return;
        }
        let _ = self.shared.outbound.send(Outbound::Frame(encode(message)));
    }

    /// Close now, abandoning queued writes. Idempotent.
    pub fn disconnect(&self) {
        if self.state() == ConnectionState::Closed {
            return;
        }
        self.set_state(ConnectionState::Closing);
        self.finish();
    }

    /// Flush everything queued so far, then close.
    ///
    /// Messages sent after this call are dropped. The returned handle reports
    /// when the flush completed.
    pub fn shutdown(&self) -> Shutdown {
        let (tx, rx) = oneshot::channel();
        if self.is_open() {
            self.set_state(ConnectionState::Closing);
            if let Err(mpsc::error::SendError(Outbound::Close(tx))) =
                self.shared.outbound.send(Outbound::Close(tx))
            {
                let _ = tx.send(Err(NetError::Closed));
            }
        } else {
            let _ = tx.send(Err(NetError::Closed));
        }
        Shutdown { rx }
    }

    /// Move to `Closed`, stop both tasks and notify the owner (once).
    fn finish(&self) {
        self.set_state(ConnectionState::Closed);
        let _ = self.shared.closed.send(true);
        if !self.shared.notified.swap(true, Ordering::AcqRel) {
            debug!(id = self.id(), "connection closed");
            self.shared
                .events
                .push(NetEvent::Disconnected { id: self.id() });
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id())
            .field("peer", &self.peer_addr())
            .field("state", &self.state())
            .finish()
    }
}

/// Completion handle for [`Connection::shutdown`].
#[derive(Debug)]
pub struct Shutdown {
    rx: oneshot::Receiver<Result<(), NetError>>,
}

impl Shutdown {
    /// Block until the flush finished. Must not be called from async code.
    pub fn wait(self) -> Result<(), NetError> {
        self.rx.blocking_recv().unwrap_or(Err(NetError::Closed))
    }

    /// Async counterpart of [`wait`](Self::wait).
    pub async fn finished(self) -> Result<(), NetError> {
        self.rx.await.unwrap_or(Err(NetError::Closed))
    }
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    // Err means the sender (and thus the connection) is gone.
    let _ = closed.wait_for(|c| *c).await;
}

async fn read_loop<R>(conn: Connection, mut reader: R, mut closed: watch::Receiver<bool>)
where
    R: AsyncRead + Unpin,
{
    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let read = tokio::select! {
            biased;
            _ = wait_closed(&mut closed) => return,
            read = reader.read(&mut buf) => read,
        };
        match read {
            Ok(0) => {
                debug!(id = conn.id(), "peer closed the stream");
                break;
            }
            Ok(n) => {
                decoder.extend(&buf[..n]);
                loop {
                    match decoder.next_message() {
                        Ok(Some(message)) => conn.shared.events.push(NetEvent::Message {
                            id: conn.id(),
                            message,
                        }),
                        Ok(None) => break,
                        Err(e) => {
                            warn!(id = conn.id(), error = %e, "bad frame, closing connection");
                            conn.finish();
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                debug!(id = conn.id(), error = %e, "read failed");
                break;
            }
        }
    }
    conn.finish();
}

async fn write_loop<W>(
    conn: Connection,
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    mut closed: watch::Receiver<bool>,
) where
    W: AsyncWrite + Unpin,
{
    let timeout = conn.shared.write_timeout;
    loop {
        let next = tokio::select! {
            biased;
            _ = wait_closed(&mut closed) => return,
            next = outbound.recv() => next,
        };
        match next {
            Some(Outbound::Frame(bytes)) => {
                let written = tokio::select! {
                    biased;
                    _ = wait_closed(&mut closed) => return,
                    written = write_frame(&mut writer, &bytes, timeout) => written,
                };
                if let Err(e) = written {
                    debug!(id = conn.id(), error = %e, "write failed");
                    conn.finish();
                    return;
                }
            }
            Some(Outbound::Close(done)) => {
                let flushed = match tokio::time::timeout(timeout, writer.shutdown()).await {
                    Ok(result) => result.map_err(NetError::from),
                    Err(_) => Err(NetError::WriteTimeout(timeout)),
                };
                conn.finish();
                let _ = done.send(flushed);
                return;
            }
            None => return,
        }
    }
}

async fn write_frame<W>(writer: &mut W, bytes: &[u8], timeout: Duration) -> Result<(), NetError>
where
    W: AsyncWrite + Unpin,
{
    match tokio::time::timeout(timeout, writer.write_all(bytes)).await {
        Ok(result) => result.map_err(NetError::from),
        Err(_) => Err(NetError::WriteTimeout(timeout)),
    }
}
