//! Core versus logic - pure, deterministic, and testable
//!
//! This crate holds the rules-side pieces the synchronization layer talks to.
//! It has **zero dependencies** on networking or I/O.
//!
//! # Module Structure
//!
//! - [`bag`]: seeded 7-bag piece generation; both peers seed it with the
//!   server's `SendBagSeed` so their sequences match
//! - [`logic`]: the [`VersusLogic`] boundary trait and [`VersusState`], a plain
//!   two-sided state holder implementing it
//!
//! # Example
//!
//! ```
//! use tetris_versus_core::{VersusLogic, VersusState};
//!
//! let mut game = VersusState::new(0xC0FFEE);
//! game.spawn_next();
//! assert!(game.should_sync_cur_mino());
//! assert!(game.should_sync_preview());
//!
//! // after the network layer sent the flagged state
//! game.clear_sync_flags();
//! assert!(!game.should_sync_cur_mino());
//! ```

pub mod bag;
pub mod logic;

pub use tetris_versus_types as types;

pub use bag::{BagRandomizer, SeededRng};
pub use logic::{SideState, VersusLogic, VersusState, SPAWN_X, SPAWN_Y};
