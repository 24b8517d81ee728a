use tetris_versus_types::{
    BoardSnapshot, GameOverInfo, MinoState, PlayerDescription, PlayerId, PreviewState,
};

use crate::error::CodecError;
use crate::kind::MessageKind;
use crate::payload::Payload;

/// One protocol message: a kind tag plus its serialized payload.
///
/// The frame's length field is always `payload.len()`, so it is derived rather
/// than stored. Messages are built once by the sender and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    payload: Vec<u8>,
}

impl Message {
    /// Message with an empty payload.
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            payload: Vec::new(),
        }
    }

    /// Message carrying `payload` encoded with its [`Payload`] impl.
    pub fn with_payload<P: Payload>(kind: MessageKind, payload: &P) -> Self {
        let mut bytes = Vec::new();
        payload.write_to(&mut bytes);
        Self {
            kind,
            payload: bytes,
        }
    }

    /// Message with already-serialized payload bytes (used by the relay and
    /// the frame decoder).
    pub fn from_raw(kind: MessageKind, payload: Vec<u8>) -> Self {
        Self { kind, payload }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Value of the frame's length field.
    pub fn len(&self) -> u32 {
        self.payload.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Decode the payload as `P`.
    pub fn read<P: Payload>(&self) -> Result<P, CodecError> {
        P::read_from(self.kind, &self.payload)
    }

    // Constructors for the fixed message vocabulary.

    pub fn accepted() -> Self {
        Self::new(MessageKind::Accepted)
    }

    pub fn assign_id(id: PlayerId) -> Self {
        Self::with_payload(MessageKind::AssignId, &id)
    }

    pub fn register(description: PlayerDescription) -> Self {
        Self::with_payload(MessageKind::RegisterWithServer, &description)
    }

    pub fn unregister(id: PlayerId) -> Self {
        Self::with_payload(MessageKind::UnregisterWithServer, &id)
    }

    pub fn server_ping() -> Self {
        Self::new(MessageKind::ServerPing)
    }

    pub fn client_ping() -> Self {
        Self::new(MessageKind::ClientPing)
    }

    pub fn client_pong() -> Self {
        Self::new(MessageKind::ClientPong)
    }

    pub fn server_pong() -> Self {
        Self::new(MessageKind::ServerPong)
    }

    pub fn request_room_join() -> Self {
        Self::new(MessageKind::RequestRoomJoin)
    }

    pub fn room_join_accepted() -> Self {
        Self::new(MessageKind::RoomJoinAccepted)
    }

    pub fn room_player_list(players: &[PlayerDescription]) -> Self {
        Self::with_payload(MessageKind::RoomPlayerList, &players.to_vec())
    }

    pub fn room_player_joined(player: PlayerDescription) -> Self {
        Self::with_payload(MessageKind::RoomPlayerJoined, &player)
    }

    pub fn room_player_left(id: PlayerId) -> Self {
        Self::with_payload(MessageKind::RoomPlayerLeft, &id)
    }

    pub fn all_players_ready() -> Self {
        Self::new(MessageKind::AllPlayersReady)
    }

    pub fn bag_seed(seed: u64) -> Self {
        Self::with_payload(MessageKind::SendBagSeed, &seed)
    }

    pub fn cur_mino(state: MinoState) -> Self {
        Self::with_payload(MessageKind::CurMinoState, &state)
    }

    pub fn hold_mino(state: MinoState) -> Self {
        Self::with_payload(MessageKind::HoldMinoState, &state)
    }

    pub fn preview(state: PreviewState) -> Self {
        Self::with_payload(MessageKind::PreviewMinoState, &state)
    }

    pub fn board(state: &BoardSnapshot) -> Self {
        Self::with_payload(MessageKind::BoardState, state)
    }

    pub fn player_dead(loser: PlayerId) -> Self {
        Self::with_payload(MessageKind::PlayerDead, &loser)
    }

    pub fn game_over(info: GameOverInfo) -> Self {
        Self::with_payload(MessageKind::GameOver, &info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_tracks_payload() {
        assert_eq!(Message::accepted().len(), 0);
        assert!(Message::accepted().is_empty());
        assert_eq!(Message::assign_id(10_000).len(), 4);
        assert_eq!(Message::bag_seed(7).len(), 8);
        assert_eq!(Message::board(&BoardSnapshot::default()).len(), 920);
    }

    #[test]
    fn typed_read_matches_constructor() {
        let info = GameOverInfo {
            winner_id: 10_001,
            loser_id: 10_000,
        };
        let msg = Message::game_over(info);
        assert_eq!(msg.kind(), MessageKind::GameOver);
        assert_eq!(msg.read::<GameOverInfo>().unwrap(), info);
        // u64 shares GameOverInfo's 8 bytes, so only a size mismatch fails
        assert!(matches!(
            msg.read::<u32>(),
            Err(CodecError::PayloadSize {
                expected: 4,
                actual: 8,
                ..
            })
        ));
    }
}
