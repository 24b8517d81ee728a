//! Game-state relay and end-of-game arbitration.
//!
//! Both are decisions over [`Room`] state; the server performs the sends.

use tetris_versus_protocol::MessageKind;
use tetris_versus_types::{GameOverInfo, PlayerId};

use crate::room::{Room, RoomPhase};

/// Where a relayable message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Forward unchanged to this member.
    Forward(PlayerId),
    Drop(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotRelayed,
    NotInMatch,
    NotMember,
    NoPeer,
}

/// Route a game-state message from `from`.
pub fn route(room: &Room, from: PlayerId, kind: MessageKind) -> Route {
    if !kind.is_relayed() {
        return Route::Drop(DropReason::NotRelayed);
    }
    if room.phase() != RoomPhase::Ready {
        return Route::Drop(DropReason::NotInMatch);
    }
    if !room.is_member(from) {
        return Route::Drop(DropReason::NotMember);
    }
    match room.other(from) {
        Some(peer) => Route::Forward(peer),
        None => Route::Drop(DropReason::NoPeer),
    }
}

/// Decide the match with `loser` losing.
///
/// Only a `Ready` room with `loser` as a member produces a result. The room
/// is released by the decision, so a match is decided at most once.
pub fn arbitrate(room: &mut Room, loser: PlayerId) -> Option<GameOverInfo> {
    if room.phase() != RoomPhase::Ready || !room.is_member(loser) {
        return None;
    }
    let winner = room.other(loser)?;
    room.conclude()?;
    Some(GameOverInfo {
        winner_id: winner,
        loser_id: loser,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_room() -> Room {
        let mut room = Room::new();
        room.join(10_000, || 1);
        room.join(10_001, || 1);
        room
    }

    #[test]
    fn forwards_state_to_other_member() {
        let room = ready_room();
        assert_eq!(
            route(&room, 10_000, MessageKind::BoardState),
            Route::Forward(10_001)
        );
        assert_eq!(
            route(&room, 10_001, MessageKind::CurMinoState),
            Route::Forward(10_000)
        );
    }

    #[test]
    fn drops_outside_match_and_from_strangers() {
        let mut room = Room::new();
        room.join(10_000, || 1);
        assert_eq!(
            route(&room, 10_000, MessageKind::HoldMinoState),
            Route::Drop(DropReason::NotInMatch)
        );

        let room = ready_room();
        assert_eq!(
            route(&room, 10_005, MessageKind::PreviewMinoState),
            Route::Drop(DropReason::NotMember)
        );
        assert_eq!(
            route(&room, 10_000, MessageKind::GameOver),
            Route::Drop(DropReason::NotRelayed)
        );
    }

    #[test]
    fn arbitration_happens_once() {
        let mut room = ready_room();
        assert_eq!(
            arbitrate(&mut room, 10_000),
            Some(GameOverInfo {
                winner_id: 10_001,
                loser_id: 10_000
            })
        );
        assert_eq!(room.phase(), RoomPhase::Empty);
        assert!(room.members().is_empty());
        assert_eq!(arbitrate(&mut room, 10_001), None);
        assert_eq!(
            route(&room, 10_001, MessageKind::BoardState),
            Route::Drop(DropReason::NotInMatch)
        );
    }

    #[test]
    fn no_arbitration_before_ready() {
        let mut room = Room::new();
        room.join(10_000, || 1);
        assert_eq!(arbitrate(&mut room, 10_000), None);
        assert_eq!(room.phase(), RoomPhase::WaitingForSecond);
    }
}
