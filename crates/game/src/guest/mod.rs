//! Joining someone else's game and mirroring its board.

mod handshake;
mod session;

pub use handshake::GuestHandshake;
pub use session::{GuestLoop, GuestTurn};
