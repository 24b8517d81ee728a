//! Versus server - matchmaking, relay and arbitration for two-player Tetris
//!
//! # Event Flow
//!
//! ```text
//! Connected      -> store connection, send Accepted
//! Register       -> validated session, AssignId(id)
//! RequestJoin    -> RoomJoinAccepted, roster; second member => SendBagSeed + AllPlayersReady
//! game state     -> forwarded verbatim to the other member while Ready
//! PlayerDead     -> GameOver { winner: other, loser: sender } to both, once
//! Disconnected   -> same arbitration if the match was running; RoomPlayerLeft
//! ```
//!
//! # Liveness
//!
//! Every `ping_interval` each validated session gets `ServerPing`. A session
//! silent for more than `pong_timeout` is force-closed; its `Disconnected`
//! event then runs the normal cascade.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use tetris_versus_server::{Server, ServerConfig};
//!
//! let mut server = Server::bind(ServerConfig::from_env())?;
//! let stop = AtomicBool::new(false);
//! server.run(&stop);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod liveness;
pub mod registry;
pub mod relay;
pub mod room;
pub mod server;

pub use config::{check_tcp_listen_available, ServerConfig};
pub use liveness::LivenessMonitor;
pub use registry::{IdAllocator, PlayerSession, Registry};
pub use relay::{DropReason, Route};
pub use room::{generate_seed, JoinOutcome, LeaveOutcome, Room, RoomPhase};
pub use server::{start_server, AcceptPolicy, AllowAll, Server, ServerHandle};
