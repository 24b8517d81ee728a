//! Versus client flows on top of a [`Session`](tetris_versus_net::Session)
//!
//! - [`room_join`]: the handshake from `Accepted` to `AllPlayersReady`
//! - [`match_sync`]: per-frame exchange of game state with the opponent
//!
//! # Frame Loop
//!
//! ```no_run
//! use std::time::{Duration, Instant};
//! use tetris_versus_client::{JoinStatus, MatchSync, RoomJoin, RoomJoinConfig};
//! use tetris_versus_core::VersusState;
//! use tetris_versus_net::{Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::default())?;
//! session.connect("127.0.0.1", 60000)?;
//!
//! let mut join = RoomJoin::new(RoomJoinConfig::default(), Instant::now());
//! let JoinStatus::Ready { seed, player_id } = join.wait(&mut session, Duration::from_secs(60))
//! else {
//!     return Ok(());
//! };
//!
//! let mut sync = MatchSync::new(VersusState::new(seed), player_id);
//! while sync.result().is_none() && session.is_connected() {
//!     sync.process_packets(&mut session);
//!     sync.logic_mut().spawn_next();
//!     sync.sync_to_server(&session);
//!     std::thread::sleep(Duration::from_millis(16));
//! }
//! # Ok::<(), tetris_versus_net::NetError>(())
//! ```

pub mod match_sync;
pub mod room_join;

pub use match_sync::{MatchSync, MAX_SYNC_BATCH};
pub use room_join::{JoinFailure, JoinStatus, RoomJoin, RoomJoinConfig};
