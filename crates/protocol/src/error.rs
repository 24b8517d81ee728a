use thiserror::Error;

use crate::kind::MessageKind;

/// Per-message codec failure. None of these are fatal to the process; the
/// owner of the offending connection closes it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Declared payload length does not match the bytes available.
    #[error("malformed frame: header declares {declared} payload bytes, {available} available")]
    MalformedFrame { declared: usize, available: usize },

    /// The type tag is not a known [`MessageKind`].
    #[error("unknown message type {0}")]
    UnknownType(u32),

    /// Declared payload length exceeds [`crate::MAX_PAYLOAD_LEN`].
    #[error("frame too large: {0} payload bytes")]
    FrameTooLarge(usize),

    /// The payload does not have the size the requested struct needs.
    #[error("{kind:?} payload is {actual} bytes, expected {expected}")]
    PayloadSize {
        kind: MessageKind,
        expected: usize,
        actual: usize,
    },
}
