//! Packet definitions for the Culture protocol.
//!
//! `guest` holds guest -> host messages, `host` holds host -> guest messages.
//! Each side builds with [`BinaryWriter`](crate::BinaryWriter) and reads with
//! the streaming readers in [`io`](crate::io).

mod guest;
mod host;

pub use guest::*;
pub use host::*;

/// First byte of the host's reply to a join request.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinReply {
    /// Bare denial, the connection is closed right after.
    Deny = 0x00,
    /// Accepted; an assignment and the palette follow.
    Accept = 0x01,
}

/// Error codes for a denial that carries a reason string.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyCode {
    /// The join request could not be decoded.
    Malformed = 0x02,
}

/// Opcodes the host sends while the lobby is open.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyOpcode {
    /// A newly joined peer was given a custom color (r, g, b follow).
    NewColor = 0x01,
    /// Lobby closed, the game begins.
    Start = 0x02,
}

/// Opcodes the host sends once the game is running.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOpcode {
    /// A move was applied (x, y, team, turn flag follow).
    Move = 0x02,
}

/// Host's answer to a guest-submitted move.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Rejected = 0x00,
    Accepted = 0x01,
}
