//! Protocol error types

use thiserror::Error;

use crate::constants::WireType;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("unsupported element type: {0}")]
    UnsupportedType(String),

    #[error("unhandled tensor data type: {0:?}")]
    UnhandledDataType(WireType),

    #[error("payload size mismatch: expected {expected} bytes, got {got}")]
    PayloadSizeMismatch { expected: usize, got: usize },

    #[error("buffer too short: need {need} bytes, have {have}")]
    BufferTooShort { need: usize, have: usize },

    #[error("offset out of bounds at byte {at}")]
    BadOffset { at: usize },

    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("unknown wire type code: 0x{0:02X}")]
    UnknownWireType(u8),

    #[error("unknown request kind: 0x{0:02X}")]
    UnknownRequestKind(u8),

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
