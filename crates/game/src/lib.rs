//! Culture: a host-authoritative, turn-based territory game.
//!
//! The [`board`] module holds the chain-reaction engine. [`host`] and
//! [`guest`] drive the two halves of the session protocol over any byte
//! stream, talking to the local player through an [`Operator`].

pub mod board;
pub mod colors;
pub mod config;
mod error;
pub mod guest;
pub mod host;
pub mod operator;
pub mod turn;

#[cfg(test)]
mod test_support;

pub use board::{Board, Cascade, Cell, Position};
pub use colors::{ColorRegistry, PaletteColor, Preset};
pub use config::Config;
pub use error::SessionError;
pub use guest::{GuestHandshake, GuestLoop, GuestTurn};
pub use host::{Admission, GameSession, JoinSession, TurnOutcome};
pub use operator::{JoinPrompt, Move, Notice, Operator};
pub use turn::TurnCursor;
