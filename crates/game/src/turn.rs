//! Turn order over a closed roster.

use protocol::{HOST_TEAM, TeamId};

/// The team whose move is expected next. Teams are `1..=players`, the host
/// opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnCursor {
    current: TeamId,
    players: u32,
}

impl TurnCursor {
    pub fn new(players: u32) -> Self {
        Self {
            current: HOST_TEAM,
            players: players.max(1),
        }
    }

    pub fn current(&self) -> TeamId {
        self.current
    }

    pub fn players(&self) -> u32 {
        self.players
    }

    /// Team that follows the current one.
    pub fn peek_next(&self) -> TeamId {
        self.current % self.players + 1
    }

    /// Move to the next team and return it.
    pub fn advance(&mut self) -> TeamId {
        self.current = self.peek_next();
        self.current
    }
}
