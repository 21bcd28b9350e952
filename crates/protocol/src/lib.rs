//! Shared protocol crate for Culture.
//!
//! This crate contains:
//! - Big-endian binary writing utilities
//! - Streaming readers for the fixed message sequence
//! - Packet definitions and builders
//! - Shared types (Color, TeamId)

mod binary;
mod error;
pub mod io;
pub mod packets;

pub use binary::BinaryWriter;
pub use error::ProtocolError;

/// Team identifier. `0` is unclaimed, `1` is always the host.
pub type TeamId = u32;

/// Owner of a cell nobody has played on.
pub const UNCLAIMED: TeamId = 0;

/// The host always plays as team 1.
pub const HOST_TEAM: TeamId = 1;

/// Maximum length in bytes of a UTF-16BE string on the wire.
pub const MAX_STRING_BYTES: usize = 4096;

/// Largest board a guest will agree to mirror.
pub const MAX_BOARD_SIZE: usize = 1024;

/// Largest number of custom colors a guest will accept in one palette.
pub const MAX_CUSTOM_COLORS: usize = 4096;

/// RGB color used for custom team colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}
