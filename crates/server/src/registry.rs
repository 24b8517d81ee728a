//! Connection and player-session bookkeeping.
//!
//! Owned by the logic thread only. A connection exists from `Connected`
//! until its `Disconnected` event; a [`PlayerSession`] exists from
//! `RegisterWithServer` until the same point (or an unregister).

use std::collections::HashMap;
use std::time::Instant;

use tetris_versus_net::{Connection, ConnectionId};
use tetris_versus_protocol::Message;
use tetris_versus_types::{PlayerDescription, PlayerId, FIRST_PLAYER_ID};

/// Hands out player ids from [`FIRST_PLAYER_ID`] upward, never reusing one.
#[derive(Debug)]
pub struct IdAllocator {
    next: PlayerId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next: FIRST_PLAYER_ID,
        }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> PlayerId {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Server-side record of one registered player.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub id: PlayerId,
    pub validated: bool,
    pub last_pong: Instant,
    pub descriptor: PlayerDescription,
    /// A forced close was requested; waiting for its `Disconnected`.
    pub closing: bool,
}

#[derive(Debug, Default)]
pub struct Registry {
    connections: HashMap<ConnectionId, Connection>,
    sessions: HashMap<PlayerId, PlayerSession>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_connection(&mut self, conn: Connection) {
        self.connections.insert(conn.id(), conn);
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Create the session for `id`. Returns the stored descriptor (with
    /// `unique_id` forced to `id`), or `None` if `id` has no connection or is
    /// already registered.
    pub fn register(
        &mut self,
        id: PlayerId,
        descriptor: PlayerDescription,
        now: Instant,
    ) -> Option<PlayerDescription> {
        if !self.connections.contains_key(&id) || self.sessions.contains_key(&id) {
            return None;
        }
        let descriptor = PlayerDescription {
            unique_id: id,
            ..descriptor
        };
        self.sessions.insert(
            id,
            PlayerSession {
                id,
                validated: true,
                last_pong: now,
                descriptor,
                closing: false,
            },
        );
        Some(descriptor)
    }

    pub fn session(&self, id: PlayerId) -> Option<&PlayerSession> {
        self.sessions.get(&id)
    }

    pub fn session_mut(&mut self, id: PlayerId) -> Option<&mut PlayerSession> {
        self.sessions.get_mut(&id)
    }

    pub fn is_validated(&self, id: PlayerId) -> bool {
        self.sessions.get(&id).is_some_and(|s| s.validated)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &PlayerSession> {
        self.sessions.values()
    }

    /// Drop only the session, keeping the connection (unregister).
    pub fn remove_session(&mut self, id: PlayerId) -> Option<PlayerSession> {
        self.sessions.remove(&id)
    }

    /// Drop both the connection and the session.
    pub fn remove(&mut self, id: ConnectionId) -> (Option<Connection>, Option<PlayerSession>) {
        (self.connections.remove(&id), self.sessions.remove(&id))
    }

    /// Queue `message` for `id`; a missing connection is ignored.
    pub fn send_to(&self, id: ConnectionId, message: &Message) {
        if let Some(conn) = self.connections.get(&id) {
            conn.send(message);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Close every connection without waiting for flushes.
    pub fn disconnect_all(&mut self) {
        for conn in self.connections.values() {
            conn.disconnect();
        }
    }
}
