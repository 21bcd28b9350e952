//! Host -> Guest messages.

use tokio::io::{AsyncRead, AsyncReadExt};

use super::{DenyCode, GameOpcode, JoinReply, LobbyOpcode, Verdict};
use crate::io::WireRead;
use crate::{BinaryWriter, Color, MAX_BOARD_SIZE, MAX_CUSTOM_COLORS, ProtocolError, TeamId};

/// Build the one-byte accept/deny reply.
pub fn build_join_reply(accepted: bool) -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(1);
    let reply = if accepted { JoinReply::Accept } else { JoinReply::Deny };
    w.put_u8(reply as u8);
    w
}

/// Build a denial carrying an error code and a human-readable reason.
pub fn build_deny_with_reason(code: DenyCode, reason: &str) -> BinaryWriter {
    let mut w = BinaryWriter::new();
    w.put_u8(code as u8);
    w.put_string(reason);
    w
}

/// Guest-side view of the host's reply to a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Accepted,
    Denied { code: u8, reason: Option<String> },
}

impl JoinOutcome {
    pub async fn read<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, ProtocolError> {
        let code = reader.read_u8().await?;
        if code == JoinReply::Accept as u8 {
            Ok(JoinOutcome::Accepted)
        } else if code == JoinReply::Deny as u8 {
            Ok(JoinOutcome::Denied { code, reason: None })
        } else {
            let reason = reader.read_string().await?;
            Ok(JoinOutcome::Denied {
                code,
                reason: Some(reason),
            })
        }
    }
}

/// Team and board size handed to an accepted guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub team: TeamId,
    pub board_size: usize,
}

impl Assignment {
    pub fn build(self) -> BinaryWriter {
        let mut w = BinaryWriter::with_capacity(8);
        w.put_i32(self.team as i32);
        w.put_i32(self.board_size as i32);
        w
    }

    pub async fn read<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, ProtocolError> {
        let team = reader.read_i32().await?;
        let board_size = reader.read_i32().await?;
        // Team 1 is the host, so an assignment is always 2 or more.
        if team < 2 {
            return Err(ProtocolError::InvalidTeam(team));
        }
        if board_size < 1 || board_size as usize > MAX_BOARD_SIZE {
            return Err(ProtocolError::InvalidBoardSize(board_size));
        }
        Ok(Self {
            team: team as TeamId,
            board_size: board_size as usize,
        })
    }
}

/// Build the list of custom colors (everything past the built-in presets).
pub fn build_palette(custom: &[Color]) -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(4 + custom.len() * 3);
    w.put_i32(custom.len() as i32);
    for color in custom {
        w.put_color(*color);
    }
    w
}

pub async fn read_palette<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<Color>, ProtocolError> {
    let count = reader.read_i32().await?;
    if count < 0 || count as usize > MAX_CUSTOM_COLORS {
        return Err(ProtocolError::InvalidColorCount(count));
    }
    let mut colors = Vec::with_capacity(count as usize);
    for _ in 0..count {
        colors.push(reader.read_color().await?);
    }
    Ok(colors)
}

/// Build a NewColor lobby message (0x01).
pub fn build_new_color(color: Color) -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(4);
    w.put_u8(LobbyOpcode::NewColor as u8);
    w.put_color(color);
    w
}

/// Build a Start lobby message (0x02).
pub fn build_start() -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(1);
    w.put_u8(LobbyOpcode::Start as u8);
    w
}

/// One message received while waiting in the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyMessage {
    NewColor(Color),
    Start,
    /// A byte with no meaning in the lobby; callers discard it.
    Unknown(u8),
}

impl LobbyMessage {
    pub async fn read<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, ProtocolError> {
        let opcode = reader.read_u8().await?;
        if opcode == LobbyOpcode::NewColor as u8 {
            Ok(LobbyMessage::NewColor(reader.read_color().await?))
        } else if opcode == LobbyOpcode::Start as u8 {
            Ok(LobbyMessage::Start)
        } else {
            Ok(LobbyMessage::Unknown(opcode))
        }
    }
}

/// Build the accept/reject reply to a submitted move.
pub fn build_verdict(accepted: bool) -> BinaryWriter {
    let mut w = BinaryWriter::with_capacity(1);
    let verdict = if accepted { Verdict::Accepted } else { Verdict::Rejected };
    w.put_u8(verdict as u8);
    w
}

pub async fn read_verdict<R: AsyncRead + Unpin>(reader: &mut R) -> Result<bool, ProtocolError> {
    Ok(reader.read_u8().await? == Verdict::Accepted as u8)
}

/// An applied move as broadcast to one guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveBroadcast {
    pub x: i32,
    pub y: i32,
    pub team: TeamId,
    /// Whether the recipient moves next.
    pub your_turn: bool,
}

impl MoveBroadcast {
    pub fn build(self) -> BinaryWriter {
        let mut w = BinaryWriter::with_capacity(14);
        w.put_u8(GameOpcode::Move as u8);
        w.put_i32(self.x);
        w.put_i32(self.y);
        w.put_i32(self.team as i32);
        w.put_bool(self.your_turn);
        w
    }

    /// Read everything after the Move opcode.
    pub async fn read_body<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self, ProtocolError> {
        let x = reader.read_i32().await?;
        let y = reader.read_i32().await?;
        let team = reader.read_i32().await?;
        if team < 1 {
            return Err(ProtocolError::InvalidTeam(team));
        }
        let your_turn = reader.read_u8().await? == 0x01;
        Ok(Self {
            x,
            y,
            team: team as TeamId,
            your_turn,
        })
    }
}
