use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unexpected end of input at offset {offset}: need {needed} more byte(s)")]
    UnexpectedEnd { offset: usize, needed: usize },

    #[error("unknown type tag 0x{tag:02x} at offset {offset}")]
    UnknownType { tag: u8, offset: usize },

    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("negative count {count} at offset {offset}")]
    NegativeCount { count: i64, offset: usize },

    #[error("length {0} does not fit the wire length prefix")]
    LengthOverflow(usize),

    #[error("too many tags: {0} exceeds the 32767 tag limit")]
    TooManyTags(usize),

    #[error("event id ticks {id_ticks} do not match event timestamp {timestamp}")]
    IdTicksMismatch { id_ticks: i64, timestamp: i64 },

    #[error("no events remaining in batch")]
    Exhausted,
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
