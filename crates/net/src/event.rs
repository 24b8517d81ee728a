use tetris_versus_protocol::Message;

use crate::connection::{Connection, ConnectionId};

/// Everything the network side reports to the logic thread.
#[derive(Debug)]
pub enum NetEvent {
    /// A new peer passed the accept policy. The logic thread takes ownership
    /// of the handle.
    Connected(Connection),
    /// One whole decoded message, in arrival order for its connection.
    Message { id: ConnectionId, message: Message },
    /// Pushed exactly once per connection, whichever side closed it.
    Disconnected { id: ConnectionId },
}

impl NetEvent {
    pub fn connection_id(&self) -> ConnectionId {
        match self {
            NetEvent::Connected(conn) => conn.id(),
            NetEvent::Message { id, .. } | NetEvent::Disconnected { id } => *id,
        }
    }
}
