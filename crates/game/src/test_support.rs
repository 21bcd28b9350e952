//! Scripted operator and session fixtures for unit tests.

use anyhow::Context;
use protocol::io::write_packet;
use protocol::packets::{Assignment, JoinOutcome, JoinRequest, LobbyMessage, read_palette};
use protocol::{Color, TeamId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::VecDeque;
use tokio::io::{DuplexStream, duplex};

use crate::board::{Board, Position};
use crate::colors::ColorRegistry;
use crate::config::PaletteConfig;
use crate::host::{Admission, GameSession, JoinSession};
use crate::operator::{JoinPrompt, Move, Notice, Operator};

/// Operator that answers from queues and records everything it is shown.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    pub joins: VecDeque<bool>,
    /// Empty means "generate one".
    pub colors: VecDeque<Option<Color>>,
    pub starts: VecDeque<bool>,
    pub moves: VecDeque<Position>,
    pub prompts: Vec<JoinPrompt>,
    pub rendered: Vec<Move>,
    pub notices: Vec<Notice>,
}

impl ScriptedOperator {
    /// Accept the next `n` join requests.
    pub fn accepting(mut self, n: usize) -> Self {
        self.joins.extend(std::iter::repeat_n(true, n));
        self
    }
}

impl Operator for ScriptedOperator {
    async fn confirm_join(&mut self, prompt: &JoinPrompt) -> anyhow::Result<bool> {
        self.prompts.push(prompt.clone());
        self.joins.pop_front().context("join script ran out")
    }

    async fn pick_color(&mut self, _team: TeamId) -> anyhow::Result<Option<Color>> {
        Ok(self.colors.pop_front().flatten())
    }

    async fn confirm_start(&mut self, _guests: usize) -> anyhow::Result<bool> {
        self.starts.pop_front().context("start script ran out")
    }

    async fn choose_move(&mut self, _board: &Board, _team: TeamId) -> anyhow::Result<Position> {
        self.moves.pop_front().context("move script ran out")
    }

    fn render_move(&mut self, mv: Move, _board: &Board, _colors: &ColorRegistry) {
        self.rendered.push(mv);
    }

    fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

/// An open lobby over in-memory streams with a fixed seed.
pub fn lobby(board_size: usize) -> JoinSession<DuplexStream> {
    JoinSession::with_rng(board_size, &PaletteConfig::default(), StdRng::seed_from_u64(42))
}

/// A started game with `guests` admitted guests. Returns the guests' ends of
/// their connections with everything up to and including Start consumed.
pub async fn admit(board_size: usize, guests: usize) -> (GameSession<DuplexStream>, Vec<DuplexStream>) {
    let mut session = lobby(board_size);
    let mut operator = ScriptedOperator::default().accepting(guests);
    let mut ends = Vec::with_capacity(guests);

    for n in 0..guests {
        let (mut guest, host) = duplex(4096);
        write_packet(&mut guest, JoinRequest::new(None).build())
            .await
            .unwrap();
        let admission = session
            .negotiate(host, format!("guest-{n}"), &mut operator)
            .await
            .unwrap();
        assert!(matches!(admission, Admission::Admitted(_)));
        assert_eq!(JoinOutcome::read(&mut guest).await.unwrap(), JoinOutcome::Accepted);
        Assignment::read(&mut guest).await.unwrap();
        read_palette(&mut guest).await.unwrap();
        ends.push(guest);
    }

    let game = session.start(&mut operator).await.unwrap();
    for guest in &mut ends {
        while LobbyMessage::read(guest).await.unwrap() != LobbyMessage::Start {}
    }
    (game, ends)
}
