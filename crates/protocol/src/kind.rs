//! Message kind tags.
//!
//! The numeric values are part of the wire contract shared by every client
//! and server build. New kinds go at the end; existing values never move.

use crate::error::CodecError;

/// Type tag carried in every frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum MessageKind {
    // Connection handshake
    Accepted = 0,
    AssignId = 1,
    RegisterWithServer = 2,
    UnregisterWithServer = 3,

    // Liveness
    ClientPing = 4,
    ServerPing = 5,
    ClientPong = 6,
    ServerPong = 7,

    // Room join flow
    RequestRoomJoin = 8,
    RoomJoinAccepted = 9,
    RoomJoinDenied = 10,
    RoomPlayerList = 11,
    RoomPlayerJoined = 12,
    RoomPlayerLeft = 13,

    // Ready / start
    Ready = 14,
    CancelReady = 15,
    AllPlayersReady = 16,

    // Game
    AddPlayer = 17,
    RemovePlayer = 18,
    UpdatePlayer = 19,
    GameStart = 20,
    SendBagSeed = 21,
    BoardState = 22,
    CurMinoState = 23,
    HoldMinoState = 24,
    PreviewMinoState = 25,
    PlayerDead = 26,
    GameOver = 27,
}

impl MessageKind {
    /// Every kind, in wire order.
    pub const ALL: [MessageKind; 28] = [
        MessageKind::Accepted,
        MessageKind::AssignId,
        MessageKind::RegisterWithServer,
        MessageKind::UnregisterWithServer,
        MessageKind::ClientPing,
        MessageKind::ServerPing,
        MessageKind::ClientPong,
        MessageKind::ServerPong,
        MessageKind::RequestRoomJoin,
        MessageKind::RoomJoinAccepted,
        MessageKind::RoomJoinDenied,
        MessageKind::RoomPlayerList,
        MessageKind::RoomPlayerJoined,
        MessageKind::RoomPlayerLeft,
        MessageKind::Ready,
        MessageKind::CancelReady,
        MessageKind::AllPlayersReady,
        MessageKind::AddPlayer,
        MessageKind::RemovePlayer,
        MessageKind::UpdatePlayer,
        MessageKind::GameStart,
        MessageKind::SendBagSeed,
        MessageKind::BoardState,
        MessageKind::CurMinoState,
        MessageKind::HoldMinoState,
        MessageKind::PreviewMinoState,
        MessageKind::PlayerDead,
        MessageKind::GameOver,
    ];

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Per-turn state that the server forwards between room members untouched.
    pub fn is_relayed(self) -> bool {
        matches!(
            self,
            MessageKind::CurMinoState
                | MessageKind::HoldMinoState
                | MessageKind::PreviewMinoState
                | MessageKind::BoardState
                | MessageKind::UpdatePlayer
        )
    }
}

impl TryFrom<u32> for MessageKind {
    type Error = CodecError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        MessageKind::ALL
            .get(value as usize)
            .copied()
            .ok_or(CodecError::UnknownType(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_in_wire_order() {
        for (i, kind) in MessageKind::ALL.iter().enumerate() {
            assert_eq!(kind.as_u32(), i as u32, "{kind:?} is out of place");
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(
            MessageKind::try_from(28),
            Err(CodecError::UnknownType(28))
        );
        assert_eq!(MessageKind::try_from(27), Ok(MessageKind::GameOver));
    }

    #[test]
    fn relayed_kinds() {
        assert!(MessageKind::BoardState.is_relayed());
        assert!(MessageKind::HoldMinoState.is_relayed());
        assert!(!MessageKind::PlayerDead.is_relayed());
        assert!(!MessageKind::ClientPong.is_relayed());
    }
}
