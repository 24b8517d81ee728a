//! Wire protocol - binary framing between versus clients and the server
//!
//! # Frame Layout
//!
//! ```text
//! +------------+--------------+-------------------------+
//! | kind: u32  | length: u32  | payload: length bytes   |
//! +------------+--------------+-------------------------+
//! ```
//!
//! All integers are little-endian. `kind` is a [`MessageKind`] whose numeric
//! values are frozen; `length` is exactly the payload size. Payload structs
//! are fixed-width integers in field order (see [`payload`]).
//!
//! # Handshake Flow
//!
//! ```text
//! server -> client  Accepted
//! client -> server  RegisterWithServer(PlayerDescription)
//! server -> client  AssignId(u32)
//! client -> server  RequestRoomJoin
//! server -> client  RoomJoinAccepted
//! server -> both    SendBagSeed(u64), AllPlayersReady      (second join)
//! both   -> server  CurMinoState / HoldMinoState / PreviewMinoState / BoardState
//! server -> peer    (relayed verbatim)
//! client -> server  PlayerDead(u32)
//! server -> both    GameOver(GameOverInfo)
//! ```
//!
//! # Example
//!
//! ```
//! use tetris_versus_protocol::{decode, encode, FrameDecoder, Message, MessageKind};
//!
//! let msg = Message::bag_seed(0xC0FFEE);
//! let frame = encode(&msg);
//! assert_eq!(decode(&frame).unwrap(), msg);
//!
//! let mut decoder = FrameDecoder::new();
//! decoder.extend(&frame[..3]);
//! assert!(decoder.next_message().unwrap().is_none());
//! decoder.extend(&frame[3..]);
//! let out = decoder.next_message().unwrap().unwrap();
//! assert_eq!(out.kind(), MessageKind::SendBagSeed);
//! assert_eq!(out.read::<u64>().unwrap(), 0xC0FFEE);
//! ```

pub mod codec;
pub mod error;
pub mod kind;
pub mod message;
pub mod payload;

pub use codec::{decode, encode, encode_into, FrameDecoder, HEADER_LEN, MAX_PAYLOAD_LEN};
pub use error::CodecError;
pub use kind::MessageKind;
pub use message::Message;
pub use payload::Payload;
