//! In-match synchronization between a [`VersusLogic`] and the server.

use arrayvec::ArrayVec;
use tracing::{debug, info, warn};

use tetris_versus_core::VersusLogic;
use tetris_versus_net::{NetError, Session, Shutdown};
use tetris_versus_protocol::{Message, MessageKind};
use tetris_versus_types::{
    BoardSnapshot, GameOverInfo, MinoState, PlayerId, PlayerSide, PreviewState,
};

/// Most messages one [`MatchSync::sync_to_server`] call can produce.
pub const MAX_SYNC_BATCH: usize = 4;

pub struct MatchSync<L: VersusLogic> {
    logic: L,
    player_id: PlayerId,
    result: Option<GameOverInfo>,
    dead_reported: bool,
}

impl<L: VersusLogic> MatchSync<L> {
    pub fn new(logic: L, player_id: PlayerId) -> Self {
        Self {
            logic,
            player_id,
            result: None,
            dead_reported: false,
        }
    }

    pub fn logic(&self) -> &L {
        &self.logic
    }

    pub fn logic_mut(&mut self) -> &mut L {
        &mut self.logic
    }

    pub fn into_logic(self) -> L {
        self.logic
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Server verdict, once received.
    pub fn result(&self) -> Option<GameOverInfo> {
        self.result
    }

    /// Apply everything the server sent since the last call. Returns the
    /// number of messages handled.
    pub fn process_packets(&mut self, session: &mut Session) -> usize {
        let mut handled = 0;
        while let Some(message) = session.try_recv() {
            self.apply(session, &message);
            handled += 1;
        }
        handled
    }

    fn apply(&mut self, session: &Session, message: &Message) {
        match message.kind() {
            MessageKind::ServerPing => {
                let _ = session.send(&Message::client_pong());
            }
            MessageKind::CurMinoState => match message.read::<MinoState>() {
                Ok(state) => self.logic.apply_enemy_mino(state),
                Err(e) => warn!(error = %e, "bad enemy piece ignored"),
            },
            MessageKind::HoldMinoState => match message.read::<MinoState>() {
                Ok(state) => self.logic.apply_enemy_hold(state.kind()),
                Err(e) => warn!(error = %e, "bad enemy hold ignored"),
            },
            MessageKind::PreviewMinoState => match message.read::<PreviewState>() {
                Ok(state) => self.logic.apply_enemy_preview(state),
                Err(e) => warn!(error = %e, "bad enemy preview ignored"),
            },
            MessageKind::BoardState => match message.read::<BoardSnapshot>() {
                Ok(board) => self.logic.apply_enemy_board(board),
                Err(e) => warn!(error = %e, "bad enemy board ignored"),
            },
            MessageKind::GameOver => match message.read::<GameOverInfo>() {
                Ok(info) => {
                    let side = if info.winner_id == self.player_id {
                        PlayerSide::Remote
                    } else {
                        PlayerSide::Local
                    };
                    info!(winner = info.winner_id, loser = info.loser_id, "game over");
                    self.logic.set_game_over(side);
                    self.result = Some(info);
                }
                Err(e) => warn!(error = %e, "bad GameOver ignored"),
            },
            MessageKind::RoomPlayerLeft => debug!("opponent left the room"),
            MessageKind::ServerPong | MessageKind::UpdatePlayer => {}
            kind => warn!(?kind, "unexpected message during match ignored"),
        }
    }

    /// Messages for every raised sync flag, in piece, hold, preview, board
    /// order.
    pub fn pending_sync(&self) -> ArrayVec<Message, MAX_SYNC_BATCH> {
        let mut batch = ArrayVec::new();
        if self.logic.should_sync_cur_mino() {
            batch.push(Message::cur_mino(self.logic.local_mino()));
        }
        if self.logic.should_sync_hold() {
            batch.push(Message::hold_mino(MinoState::hold(self.logic.local_hold())));
        }
        if self.logic.should_sync_preview() {
            batch.push(Message::preview(self.logic.local_preview()));
        }
        if self.logic.should_sync_board() {
            batch.push(Message::board(self.logic.local_board()));
        }
        batch
    }

    /// Send whatever changed locally, then clear the flags. Returns the number
    /// of messages sent.
    pub fn sync_to_server(&mut self, session: &Session) -> usize {
        if !session.is_connected() {
            return 0;
        }
        let batch = self.pending_sync();
        for message in &batch {
            let _ = session.send(message);
        }
        self.logic.clear_sync_flags();
        batch.len()
    }

    /// Tell the server we topped out. Sent at most once per match.
    pub fn report_dead(&mut self, session: &Session) -> Result<(), NetError> {
        if self.dead_reported {
            return Ok(());
        }
        session.send(&Message::player_dead(self.player_id))?;
        self.dead_reported = true;
        Ok(())
    }

    /// Unregister and close after flushing. Wait on the handle before the
    /// process exits so the unregister is not lost.
    pub fn leave(&mut self, session: &mut Session) -> Option<Shutdown> {
        let _ = session.send(&Message::unregister(self.player_id));
        session.shutdown()
    }
}

impl<L: VersusLogic + std::fmt::Debug> std::fmt::Debug for MatchSync<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchSync")
            .field("player_id", &self.player_id)
            .field("result", &self.result)
            .field("logic", &self.logic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tetris_versus_core::VersusState;
    use tetris_versus_types::PieceKind;

    #[test]
    fn pending_sync_follows_flags() {
        let mut sync = MatchSync::new(VersusState::new(3), 10_000);
        assert!(sync.pending_sync().is_empty());

        sync.logic_mut().spawn_next();
        sync.logic_mut().set_local_hold(Some(PieceKind::O));
        let kinds: Vec<MessageKind> = sync.pending_sync().iter().map(Message::kind).collect();
        assert_eq!(
            kinds,
            vec![
                MessageKind::CurMinoState,
                MessageKind::HoldMinoState,
                MessageKind::PreviewMinoState
            ]
        );

        sync.logic_mut().set_local_board(BoardSnapshot::default());
        assert_eq!(sync.pending_sync().len(), MAX_SYNC_BATCH);
    }

    #[test]
    fn hold_message_carries_only_kind() {
        let mut sync = MatchSync::new(VersusState::new(3), 10_000);
        sync.logic_mut().set_local_hold(Some(PieceKind::L));
        let batch = sync.pending_sync();
        let state = batch[0].read::<MinoState>().unwrap();
        assert_eq!(state.kind(), Some(PieceKind::L));
        assert_eq!((state.x, state.y, state.rotation), (0, 0, 0));
    }
}
