//! Frame encoding and decoding.
//!
//! Frame format: `[kind: u32 LE][length: u32 LE][payload: length bytes]`.
//!
//! [`encode`] / [`decode`] work on whole frames. [`FrameDecoder`] is the
//! streaming side used by connections: bytes arrive in arbitrary chunks and
//! whole messages come out.

use crate::error::CodecError;
use crate::kind::MessageKind;
use crate::message::Message;

/// Size of the frame header in bytes.
pub const HEADER_LEN: usize = 8;

/// Largest payload a peer may declare (64 KiB). The biggest real payload is a
/// board snapshot at 920 bytes.
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024;

/// Encode a message into one frame.
pub fn encode(msg: &Message) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + msg.payload().len());
    encode_into(msg, &mut frame);
    frame
}

/// Append one frame to `out`.
pub fn encode_into(msg: &Message, out: &mut Vec<u8>) {
    out.extend_from_slice(&msg.kind().as_u32().to_le_bytes());
    out.extend_from_slice(&msg.len().to_le_bytes());
    out.extend_from_slice(msg.payload());
}

/// Decode exactly one frame.
///
/// `data` must hold the header plus exactly the declared payload; anything
/// shorter or longer is a [`CodecError::MalformedFrame`].
pub fn decode(data: &[u8]) -> Result<Message, CodecError> {
    let Some((raw_kind, declared)) = read_header(data) else {
        return Err(CodecError::MalformedFrame {
            declared: 0,
            available: data.len(),
        });
    };
    let available = data.len() - HEADER_LEN;
    if declared != available {
        return Err(CodecError::MalformedFrame {
            declared,
            available,
        });
    }
    let kind = MessageKind::try_from(raw_kind)?;
    Ok(Message::from_raw(kind, data[HEADER_LEN..].to_vec()))
}

fn read_header(data: &[u8]) -> Option<(u32, usize)> {
    let header = data.get(..HEADER_LEN)?;
    let kind = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    Some((kind, len))
}

/// Streaming frame decoder.
///
/// Partial frames stay buffered until the rest arrives, so feeding one frame
/// split across any number of chunks produces the same message as feeding it
/// whole.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes buffered but not yet returned as a message.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next whole message.
    ///
    /// Returns `Ok(None)` when more bytes are needed. An error means the
    /// stream can no longer be trusted and the connection should be closed.
    pub fn next_message(&mut self) -> Result<Option<Message>, CodecError> {
        let Some((raw_kind, declared)) = read_header(&self.buf) else {
            return Ok(None);
        };
        if declared > MAX_PAYLOAD_LEN {
            return Err(CodecError::FrameTooLarge(declared));
        }
        let kind = MessageKind::try_from(raw_kind)?;
        let total = HEADER_LEN + declared;
        if self.buf.len() < total {
            return Ok(None);
        }
        let payload = self.buf[HEADER_LEN..total].to_vec();
        self.buf.drain(..total);
        Ok(Some(Message::from_raw(kind, payload)))
    }
}
