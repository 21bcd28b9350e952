//! Protocol error types.

use std::io;
use thiserror::Error;

/// Errors that can occur while reading or writing protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("Negative length prefix: {0}")]
    NegativeLength(i32),

    #[error("String of {0} bytes exceeds the {max} byte limit", max = crate::MAX_STRING_BYTES)]
    StringTooLong(usize),

    #[error("UTF-16 string has an odd byte length: {0}")]
    OddStringLength(usize),

    #[error("Invalid board size: {0}")]
    InvalidBoardSize(i32),

    #[error("Invalid team id: {0}")]
    InvalidTeam(i32),

    #[error("Invalid custom color count: {0}")]
    InvalidColorCount(i32),

    #[error("Move ({x}, {y}) is outside the board")]
    OutOfBounds { x: i32, y: i32 },
}

impl ProtocolError {
    /// True when the peer went away (EOF, reset, broken pipe).
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProtocolError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// True when the bytes arrived but their content cannot be accepted.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, ProtocolError::Io(_))
    }
}
