//! Typed payload encoding.
//!
//! Every payload struct serializes its fields in declaration order as
//! fixed-width little-endian integers, with no padding and no length prefix of
//! its own (the frame header carries the length). The only variable-size
//! payload is the roster list, which leads with a `u32` entry count.

use tetris_versus_types::{
    BoardSnapshot, GameOverInfo, MinoState, PlayerDescription, PreviewState, BOARD_CELLS,
    PREVIEW_COUNT,
};

use crate::error::CodecError;
use crate::kind::MessageKind;

/// A value that can travel as a frame payload.
pub trait Payload: Sized {
    /// Append the encoded value to `out`.
    fn write_to(&self, out: &mut Vec<u8>);

    /// Decode from exactly `bytes`; `kind` is only used for error reporting.
    fn read_from(kind: MessageKind, bytes: &[u8]) -> Result<Self, CodecError>;
}

/// Little-endian cursor over a payload whose size was already checked.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Fails unless `bytes` is exactly `expected` long.
    fn exact(kind: MessageKind, bytes: &'a [u8], expected: usize) -> Result<Self, CodecError> {
        if bytes.len() != expected {
            return Err(CodecError::PayloadSize {
                kind,
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes, pos: 0 })
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        buf
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take())
    }
}

impl Payload for () {
    fn write_to(&self, _out: &mut Vec<u8>) {}

    fn read_from(kind: MessageKind, bytes: &[u8]) -> Result<Self, CodecError> {
        Reader::exact(kind, bytes, 0).map(|_| ())
    }
}

impl Payload for u32 {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_from(kind: MessageKind, bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(Reader::exact(kind, bytes, 4)?.u32())
    }
}

impl Payload for u64 {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_from(kind: MessageKind, bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(Reader::exact(kind, bytes, 8)?.u64())
    }
}

impl Payload for MinoState {
    fn write_to(&self, out: &mut Vec<u8>) {
        for v in [self.kind, self.x, self.y, self.rotation] {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn read_from(kind: MessageKind, bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::exact(kind, bytes, 16)?;
        Ok(MinoState {
            kind: r.i32(),
            x: r.i32(),
            y: r.i32(),
            rotation: r.i32(),
        })
    }
}

impl Payload for PreviewState {
    fn write_to(&self, out: &mut Vec<u8>) {
        for v in self.kinds {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn read_from(kind: MessageKind, bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::exact(kind, bytes, PREVIEW_COUNT * 4)?;
        let mut kinds = [0i32; PREVIEW_COUNT];
        for slot in kinds.iter_mut() {
            *slot = r.i32();
        }
        Ok(PreviewState { kinds })
    }
}

impl Payload for BoardSnapshot {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.reserve(BOARD_CELLS * 4);
        for v in self.cells {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn read_from(kind: MessageKind, bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::exact(kind, bytes, BOARD_CELLS * 4)?;
        let mut board = BoardSnapshot::default();
        for cell in board.cells.iter_mut() {
            *cell = r.i32();
        }
        Ok(board)
    }
}

impl Payload for GameOverInfo {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.winner_id.to_le_bytes());
        out.extend_from_slice(&self.loser_id.to_le_bytes());
    }

    fn read_from(kind: MessageKind, bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::exact(kind, bytes, 8)?;
        Ok(GameOverInfo {
            winner_id: r.u32(),
            loser_id: r.u32(),
        })
    }
}

impl Payload for PlayerDescription {
    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.unique_id.to_le_bytes());
        out.extend_from_slice(&self.avatar_id.to_le_bytes());
    }

    fn read_from(kind: MessageKind, bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::exact(kind, bytes, 8)?;
        Ok(PlayerDescription {
            unique_id: r.u32(),
            avatar_id: r.u32(),
        })
    }
}

/// Roster list: `u32` count followed by `count` descriptions.
impl Payload for Vec<PlayerDescription> {
    fn write_to(&self, out: &mut Vec<u8>) {
        (self.len() as u32).write_to(out);
        for player in self {
            player.write_to(out);
        }
    }

    fn read_from(kind: MessageKind, bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < 4 {
            return Err(CodecError::PayloadSize {
                kind,
                expected: 4,
                actual: bytes.len(),
            });
        }
        let count = u32::read_from(kind, &bytes[..4])? as usize;
        let body = &bytes[4..];
        let expected = count.saturating_mul(8);
        if body.len() != expected {
            return Err(CodecError::PayloadSize {
                kind,
                expected: 4 + expected,
                actual: bytes.len(),
            });
        }
        body.chunks_exact(8)
            .map(|chunk| PlayerDescription::read_from(kind, chunk))
            .collect()
    }
}
