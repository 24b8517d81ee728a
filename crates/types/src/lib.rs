//! Shared types module - constants and plain data carried between peers
//!
//! Everything in here is pure data: no I/O, no threading. The wire codec
//! (`tetris-versus-protocol`), the game-logic boundary (`tetris-versus-core`)
//! and both network sides build on these definitions.
//!
//! # Board Dimensions
//!
//! The synchronized board includes three hidden spawn rows above the visible
//! 20-row field:
//!
//! - **Width**: 10 columns
//! - **Height**: 23 rows (3 spawn rows + 20 visible)
//! - **Cells**: 230, row-major, `0` = empty, `1..=7` = locked piece kind
//!
//! # Session Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `PING_INTERVAL_MS` | 2000 | Server heartbeat cadence |
//! | `PONG_TIMEOUT_MS` | 5000 | Silence allowed since the last pong |
//! | `SERVER_RESPONSE_TIMEOUT_MS` | 3000 | Client wait for `Accepted` |
//!
//! # Examples
//!
//! ```
//! use tetris_versus_types::{PieceKind, Rotation, BOARD_CELLS};
//!
//! assert_eq!(PieceKind::from_wire(3), Some(PieceKind::T));
//! assert_eq!(PieceKind::T.to_wire(), 3);
//! assert_eq!(Rotation::East.to_wire(), 1);
//! assert_eq!(BOARD_CELLS, 230);
//! ```

use serde::{Deserialize, Serialize, Serializer};

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: usize = 10;

/// Board height in cells, spawn rows included (23 rows)
pub const BOARD_HEIGHT: usize = 3 + 20;

/// Number of cells in a board snapshot
pub const BOARD_CELLS: usize = BOARD_WIDTH * BOARD_HEIGHT;

/// Number of upcoming pieces shared in a preview update
pub const PREVIEW_COUNT: usize = 5;

/// Number of distinct tetromino kinds
pub const PIECE_KIND_COUNT: usize = 7;

/// Interval between server heartbeats (2000ms)
pub const PING_INTERVAL_MS: u64 = 2000;

/// Maximum silence since the last acknowledged heartbeat (5000ms)
pub const PONG_TIMEOUT_MS: u64 = 5000;

/// How long a joining client waits for the server's first answer (3000ms)
pub const SERVER_RESPONSE_TIMEOUT_MS: u64 = 3000;

/// First id handed out by the server; ids grow by one per accepted socket.
pub const FIRST_PLAYER_ID: PlayerId = 10_000;

/// Default server listen port
pub const DEFAULT_PORT: u16 = 60_000;

/// Players per room
pub const ROOM_CAPACITY: usize = 2;

/// Session-assigned player identifier (also the server's connection id)
pub type PlayerId = u32;

/// The seven tetromino piece kinds
///
/// Discriminants are the wire values and must never be renumbered: `0` is
/// reserved for "no piece".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum PieceKind {
    I = 1,
    O = 2,
    T = 3,
    L = 4,
    J = 5,
    S = 6,
    Z = 7,
}

impl PieceKind {
    /// All kinds in bag order.
    pub const ALL: [PieceKind; PIECE_KIND_COUNT] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
    ];

    /// Decode a wire value; `0` and out-of-range values yield `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tetris_versus_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_wire(1), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_wire(0), None);
    /// assert_eq!(PieceKind::from_wire(8), None);
    /// ```
    pub fn from_wire(v: i32) -> Option<Self> {
        match v {
            1 => Some(PieceKind::I),
            2 => Some(PieceKind::O),
            3 => Some(PieceKind::T),
            4 => Some(PieceKind::L),
            5 => Some(PieceKind::J),
            6 => Some(PieceKind::S),
            7 => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Wire value of this kind
    pub fn to_wire(self) -> i32 {
        self as i32
    }

}

/// Wire value for an optional piece (`None` → 0).
pub fn piece_to_wire(kind: Option<PieceKind>) -> i32 {
    kind.map(PieceKind::to_wire).unwrap_or(0)
}

/// Rotation states, clockwise from spawn
///
/// Wire values count quarter turns clockwise from spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum Rotation {
    #[default]
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Rotation {
    /// Wire value of this rotation
    pub fn to_wire(self) -> i32 {
        self as i32
    }
}

/// Which of the two boards a piece of state belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerSide {
    /// This process's own player
    Local,
    /// The opponent, mirrored from the network
    Remote,
}

impl PlayerSide {
    /// Index into two-element per-side arrays.
    pub fn index(self) -> usize {
        match self {
            PlayerSide::Local => 0,
            PlayerSide::Remote => 1,
        }
    }
}

/// The sender's authoritative falling piece.
///
/// Fields are kept as raw wire integers; the receiver trusts the sender and
/// only interprets them through [`MinoState::kind`] / [`MinoState::rotation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MinoState {
    pub kind: i32,
    pub x: i32,
    pub y: i32,
    pub rotation: i32,
}

impl MinoState {
    pub fn new(kind: PieceKind, x: i32, y: i32, rotation: Rotation) -> Self {
        Self {
            kind: kind.to_wire(),
            x,
            y,
            rotation: rotation.to_wire(),
        }
    }

    /// Hold updates only carry the kind.
    pub fn hold(kind: Option<PieceKind>) -> Self {
        Self {
            kind: piece_to_wire(kind),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> Option<PieceKind> {
        PieceKind::from_wire(self.kind)
    }

}

/// Upcoming pieces in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreviewState {
    pub kinds: [i32; PREVIEW_COUNT],
}

impl PreviewState {
    pub fn from_kinds(kinds: [PieceKind; PREVIEW_COUNT]) -> Self {
        Self {
            kinds: kinds.map(PieceKind::to_wire),
        }
    }

    pub fn kinds(&self) -> [Option<PieceKind>; PREVIEW_COUNT] {
        self.kinds.map(PieceKind::from_wire)
    }
}

/// Whole-board snapshot, row-major, sent as-is (never diffed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub cells: [i32; BOARD_CELLS],
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self {
            cells: [0; BOARD_CELLS],
        }
    }
}

impl BoardSnapshot {
    /// Cell value at (x, y); out-of-range reads return 0.
    pub fn get(&self, x: usize, y: usize) -> i32 {
        if x >= BOARD_WIDTH || y >= BOARD_HEIGHT {
            return 0;
        }
        self.cells[y * BOARD_WIDTH + x]
    }

    /// Set the cell at (x, y); out-of-range writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: i32) {
        if x >= BOARD_WIDTH || y >= BOARD_HEIGHT {
            return;
        }
        self.cells[y * BOARD_WIDTH + x] = value;
    }

    /// Number of non-empty cells
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }
}

// serde only derives for arrays up to 32 elements.
impl Serialize for BoardSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.cells.iter())
    }
}

/// Authoritative result of one room, produced once by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameOverInfo {
    pub winner_id: PlayerId,
    pub loser_id: PlayerId,
}

/// Roster entry for one registered player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerDescription {
    pub unique_id: PlayerId,
    pub avatar_id: u32,
}
