//! Hosting a game: lobby, roster and the authoritative turn loop.

mod game;
mod join;
mod roster;

pub use game::{GameSession, TurnOutcome};
pub use join::{Admission, JoinSession};
pub use roster::{Guest, Roster};
