//! Game-logic boundary for versus play.
//!
//! The network layer never touches rules. It asks the logic what changed
//! since the last frame (the four sync flags), reads the local state to send
//! it, and writes the opponent's state back through the `apply_enemy_*`
//! setters.

use crate::bag::BagRandomizer;
use crate::types::{BoardSnapshot, MinoState, PieceKind, PlayerSide, PreviewState, Rotation};

/// Spawn column of a new piece's bounding box.
pub const SPAWN_X: i32 = 3;
/// Spawn row (inside the hidden rows above the visible field).
pub const SPAWN_Y: i32 = 0;

/// What the synchronization layer needs from a two-player game.
pub trait VersusLogic {
    fn should_sync_cur_mino(&self) -> bool;
    fn should_sync_hold(&self) -> bool;
    fn should_sync_preview(&self) -> bool;
    fn should_sync_board(&self) -> bool;

    /// Called once per frame after the flagged state was sent.
    fn clear_sync_flags(&mut self);

    fn local_mino(&self) -> MinoState;
    fn local_hold(&self) -> Option<PieceKind>;
    fn local_preview(&self) -> PreviewState;
    fn local_board(&self) -> &BoardSnapshot;

    fn apply_enemy_mino(&mut self, state: MinoState);
    fn apply_enemy_hold(&mut self, kind: Option<PieceKind>);
    fn apply_enemy_preview(&mut self, state: PreviewState);
    fn apply_enemy_board(&mut self, board: BoardSnapshot);

    fn set_game_over(&mut self, side: PlayerSide);
    fn is_game_over(&self, side: PlayerSide) -> bool;
}

/// State of one side of the match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideState {
    pub mino: MinoState,
    pub hold: Option<PieceKind>,
    pub preview: PreviewState,
    pub board: BoardSnapshot,
    pub game_over: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct SyncFlags {
    cur_mino: bool,
    hold: bool,
    preview: bool,
    board: bool,
}

/// Plain two-sided state holder.
///
/// The local side is driven by the `set_local_*` setters (or
/// [`spawn_next`](Self::spawn_next)), each of which raises its sync flag. The
/// remote side only changes through [`VersusLogic`]'s `apply_enemy_*` calls.
#[derive(Debug, Clone)]
pub struct VersusState {
    sides: [SideState; 2],
    bag: BagRandomizer,
    flags: SyncFlags,
}

impl VersusState {
    /// New match whose local pieces come from a bag seeded with `bag_seed`.
    pub fn new(bag_seed: u64) -> Self {
        let mut bag = BagRandomizer::new(bag_seed);
        let local = SideState {
            preview: PreviewState::from_kinds(bag.preview()),
            ..SideState::default()
        };
        Self {
            sides: [local, SideState::default()],
            bag,
            flags: SyncFlags::default(),
        }
    }

    pub fn side(&self, side: PlayerSide) -> &SideState {
        &self.sides[side.index()]
    }

    fn local_mut(&mut self) -> &mut SideState {
        &mut self.sides[PlayerSide::Local.index()]
    }

    fn remote_mut(&mut self) -> &mut SideState {
        &mut self.sides[PlayerSide::Remote.index()]
    }

    /// Draw the next piece from the bag into the spawn position and refresh
    /// the preview.
    pub fn spawn_next(&mut self) -> PieceKind {
        let kind = self.bag.next_piece();
        let preview = PreviewState::from_kinds(self.bag.preview());
        self.set_local_mino(MinoState::new(kind, SPAWN_X, SPAWN_Y, Rotation::North));
        self.set_local_preview(preview);
        kind
    }

    pub fn set_local_mino(&mut self, state: MinoState) {
        self.local_mut().mino = state;
        self.flags.cur_mino = true;
    }

    pub fn set_local_hold(&mut self, kind: Option<PieceKind>) {
        self.local_mut().hold = kind;
        self.flags.hold = true;
    }

    pub fn set_local_preview(&mut self, state: PreviewState) {
        self.local_mut().preview = state;
        self.flags.preview = true;
    }

    pub fn set_local_board(&mut self, board: BoardSnapshot) {
        self.local_mut().board = board;
        self.flags.board = true;
    }

    pub fn bag_seed(&self) -> u64 {
        self.bag.seed()
    }
}

impl VersusLogic for VersusState {
    fn should_sync_cur_mino(&self) -> bool {
        self.flags.cur_mino
    }

    fn should_sync_hold(&self) -> bool {
        self.flags.hold
    }

    fn should_sync_preview(&self) -> bool {
        self.flags.preview
    }

    fn should_sync_board(&self) -> bool {
        self.flags.board
    }

    fn clear_sync_flags(&mut self) {
        self.flags = SyncFlags::default();
    }

    fn local_mino(&self) -> MinoState {
        self.side(PlayerSide::Local).mino
    }

    fn local_hold(&self) -> Option<PieceKind> {
        self.side(PlayerSide::Local).hold
    }

    fn local_preview(&self) -> PreviewState {
        self.side(PlayerSide::Local).preview
    }

    fn local_board(&self) -> &BoardSnapshot {
        &self.side(PlayerSide::Local).board
    }

    fn apply_enemy_mino(&mut self, state: MinoState) {
        self.remote_mut().mino = state;
    }

    fn apply_enemy_hold(&mut self, kind: Option<PieceKind>) {
        self.remote_mut().hold = kind;
    }

    fn apply_enemy_preview(&mut self, state: PreviewState) {
        self.remote_mut().preview = state;
    }

    fn apply_enemy_board(&mut self, board: BoardSnapshot) {
        self.remote_mut().board = board;
    }

    fn set_game_over(&mut self, side: PlayerSide) {
        self.sides[side.index()].game_over = true;
    }

    fn is_game_over(&self, side: PlayerSide) -> bool {
        self.sides[side.index()].game_over
    }
}
