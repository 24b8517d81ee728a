//! Client session endpoint.
//!
//! A [`Session`] owns its own [`NetRuntime`], an inbox and at most one
//! connection to the server. All methods are called from the client's frame
//! loop (never from async code).

use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tracing::{debug, info};

use tetris_versus_protocol::Message;
use tetris_versus_types::PlayerId;

use crate::connection::{Connection, ConnectionId, Shutdown};
use crate::error::NetError;
use crate::event::NetEvent;
use crate::inbox::{self, Inbox, InboxSender};
use crate::runtime::NetRuntime;

/// Client-side connection settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub connect_timeout: Duration,
    pub net_threads: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            net_threads: 1,
        }
    }
}

pub struct Session {
    config: SessionConfig,
    // Field order matters: the connection and inbox go before the runtime.
    conn: Option<Connection>,
    events: InboxSender<NetEvent>,
    inbox: Inbox<NetEvent>,
    player_id: Option<PlayerId>,
    next_conn_id: ConnectionId,
    runtime: NetRuntime,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self, NetError> {
        let runtime = NetRuntime::new(config.net_threads)?;
        let (events, inbox) = inbox::channel(runtime.handle().clone());
        Ok(Self {
            config,
            conn: None,
            events,
            inbox,
            player_id: None,
            next_conn_id: 1,
            runtime,
        })
    }

    /// Connect to `host:port`, replacing any previous connection.
    ///
    /// One attempt bounded by the configured connect timeout; there is no
    /// retry.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), NetError> {
        self.disconnect();

        let addr = format!("{host}:{port}");
        let timeout = self.config.connect_timeout;
        let stream = self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, TcpStream::connect(&addr)).await })
            .map_err(|_| NetError::ConnectTimeout {
                addr: addr.clone(),
                timeout,
            })?
            .map_err(|source| NetError::Connect {
                addr: addr.clone(),
                source,
            })?;
        let _ = stream.set_nodelay(true);
        let peer = stream.peer_addr().ok();

        let id = self.next_conn_id;
        self.next_conn_id = self.next_conn_id.wrapping_add(1);
        let conn = Connection::spawn(self.runtime.handle(), id, stream, peer, self.events.clone());
        info!(%addr, "connected to server");
        self.conn = Some(conn);
        Ok(())
    }

    /// Last known transport state.
    pub fn is_connected(&self) -> bool {
        self.conn.as_ref().is_some_and(Connection::is_open)
    }

    /// Fire-and-forget send.
    pub fn send(&self, message: &Message) -> Result<(), NetError> {
        match &self.conn {
            Some(conn) if conn.is_open() => {
                conn.send(message);
                Ok(())
            }
            _ => Err(NetError::NotConnected),
        }
    }

    fn accept_event(&mut self, event: NetEvent) -> Option<Message> {
        let current = self.conn.as_ref().map(Connection::id);
        match event {
            NetEvent::Message { id, message } if Some(id) == current => Some(message),
            NetEvent::Disconnected { id } if Some(id) == current => {
                debug!(id, "server connection dropped");
                None
            }
            // stale events from an earlier connection
            _ => None,
        }
    }

    /// Next received message, if any is queued.
    pub fn try_recv(&mut self) -> Option<Message> {
        while let Some(event) = self.inbox.pop_nonblocking() {
            if let Some(message) = self.accept_event(event) {
                return Some(message);
            }
        }
        None
    }

    /// Wait up to `timeout` for the next message.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Message> {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            let event = self.inbox.pop_timeout(left)?;
            if let Some(message) = self.accept_event(event) {
                return Some(message);
            }
            if left.is_zero() {
                return None;
            }
        }
    }

    /// Close immediately, abandoning anything queued.
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.disconnect();
        }
        self.player_id = None;
    }

    /// Flush queued messages, then close. Wait on the returned handle to know
    /// the bytes left this process.
    pub fn shutdown(&mut self) -> Option<Shutdown> {
        self.player_id = None;
        self.conn.take().map(|conn| conn.shutdown())
    }

    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    pub fn set_player_id(&mut self, id: PlayerId) {
        self.player_id = Some(id);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.disconnect();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connection", &self.conn)
            .field("player_id", &self.player_id)
            .finish()
    }
}
