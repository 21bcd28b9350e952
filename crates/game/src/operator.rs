//! The local human at this process's terminal.
//!
//! Sessions never touch stdin or stdout directly. They ask the operator for
//! decisions and moves, and tell it what happened so it can be shown.

use protocol::{Color, TeamId};

use crate::board::{Board, Position};
use crate::colors::ColorRegistry;

/// Join request as presented to the host operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPrompt {
    pub peer: String,
    pub message: Option<String>,
}

/// An applied move, as every peer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub position: Position,
    pub team: TeamId,
}

/// Things worth telling the operator about besides board changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Host: a guest was admitted as `team`.
    GuestAdmitted { team: TeamId, peer: String },
    /// Host: a join request was refused.
    GuestDenied { peer: String },
    /// A team was given a custom color.
    ColorAssigned { team: TeamId, color: Color },
    /// The lobby closed. The host knows the player count, guests do not.
    Started { players: Option<u32> },
    /// Guest: the host accepted us.
    Joined { team: TeamId, board_size: usize },
    /// A submitted move was refused.
    MoveRejected { team: TeamId, x: i32, y: i32 },
    /// Someone else moves next. Only the host knows who.
    Waiting { next: Option<TeamId> },
}

/// Input and display collaborator for a session.
#[allow(async_fn_in_trait)]
pub trait Operator {
    /// Accept or refuse an incoming guest.
    async fn confirm_join(&mut self, prompt: &JoinPrompt) -> anyhow::Result<bool>;

    /// Pick a color for `team` by hand, or `None` to have one generated.
    async fn pick_color(&mut self, team: TeamId) -> anyhow::Result<Option<Color>>;

    /// Close the lobby now? `guests` have joined so far.
    async fn confirm_start(&mut self, guests: usize) -> anyhow::Result<bool>;

    /// Where `team` plays next. Should already satisfy
    /// [`Board::is_valid_move`]; sessions ask again if it does not.
    async fn choose_move(&mut self, board: &Board, team: TeamId) -> anyhow::Result<Position>;

    /// A move was applied to `board`.
    fn render_move(&mut self, _mv: Move, _board: &Board, _colors: &ColorRegistry) {}

    fn notice(&mut self, _notice: Notice) {}
}
