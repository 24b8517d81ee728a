//! Network transport - framed connections bridged to a sync logic thread
//!
//! # Threading Model
//!
//! ```text
//!   tokio workers (NetRuntime)            logic thread (caller)
//!   +--------------------------+          +----------------------+
//!   | accept loop              |          |                      |
//!   | Connection reader tasks -+--push--> | Inbox::pop_*()       |
//!   | Connection writer tasks <+--send--- | Connection::send()   |
//!   +--------------------------+          +----------------------+
//! ```
//!
//! Only the inbox is shared. Session, room and connection maps live on the
//! logic thread and are never touched by network tasks; sending is a
//! non-blocking enqueue onto a connection's writer task.
//!
//! # Modules
//!
//! - [`connection`]: one framed byte stream with reader/writer tasks
//! - [`inbox`]: the unbounded event FIFO
//! - [`session`]: the client endpoint (`connect`, `send`, `try_recv`, ...)
//! - [`runtime`]: owned tokio runtime for network I/O

pub mod connection;
pub mod error;
pub mod event;
pub mod inbox;
pub mod runtime;
pub mod session;

pub use connection::{Connection, ConnectionId, ConnectionState, Shutdown, DEFAULT_WRITE_TIMEOUT};
pub use error::NetError;
pub use event::NetEvent;
pub use inbox::{Inbox, InboxSender};
pub use runtime::NetRuntime;
pub use session::{Session, SessionConfig};
