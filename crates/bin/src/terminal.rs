//! Operator backed by the terminal.
//!
//! Stdin is read on its own thread and handed over line by line, so a
//! pending prompt never blocks ctrl-c.

use anyhow::Context;
use game::{Board, ColorRegistry, JoinPrompt, Move, Notice, Operator, Position};
use protocol::{Color, TeamId};
use regex::Regex;
use std::io::Write;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::render;

/// Patterns for the answers the operator types.
pub struct Grammar {
    affirmative: Regex,
    separator: Regex,
    digits: Regex,
}

impl Grammar {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            affirmative: Regex::new(r"(?i)^\s*(ok|yes|sure|okay|y|allow|accept)\s*$")?,
            separator: Regex::new(r",\s*")?,
            digits: Regex::new(r"^\d+$")?,
        })
    }

    pub fn is_affirmative(&self, answer: &str) -> bool {
        self.affirmative.is_match(answer)
    }

    /// Split `a, b, c` into exactly `N` decimal numbers.
    fn numbers<const N: usize>(&self, line: &str) -> Result<[u64; N], InputError> {
        let parts: Vec<&str> = self.separator.split(line.trim()).collect();
        if parts.len() != N {
            return Err(InputError::Format);
        }
        let mut numbers = [0u64; N];
        for (slot, part) in numbers.iter_mut().zip(parts) {
            if !self.digits.is_match(part) {
                return Err(InputError::NotANumber);
            }
            *slot = part.parse().map_err(|_| InputError::NotANumber)?;
        }
        Ok(numbers)
    }

    /// `x, y` naming a cell `team` may play.
    pub fn position(&self, line: &str, board: &Board, team: TeamId) -> Result<Position, InputError> {
        let [x, y] = self.numbers::<2>(line)?;
        let pos = Position::new(
            usize::try_from(x).map_err(|_| InputError::Position)?,
            usize::try_from(y).map_err(|_| InputError::Position)?,
        );
        if board.is_valid_move(pos, team) {
            Ok(pos)
        } else {
            Err(InputError::Position)
        }
    }

    /// `r, g, b` with every channel in `0..=255`.
    pub fn color(&self, line: &str) -> Result<Color, InputError> {
        let [r, g, b] = self.numbers::<3>(line)?;
        let channel = |v: u64| u8::try_from(v).map_err(|_| InputError::Color);
        Ok(Color::new(channel(r)?, channel(g)?, channel(b)?))
    }
}

/// Why a typed line was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid format")]
    Format,

    #[error("at least one entry was not a number")]
    NotANumber,

    #[error("invalid position")]
    Position,

    #[error("invalid color")]
    Color,
}

pub struct TerminalOperator {
    lines: mpsc::Receiver<String>,
    grammar: Grammar,
}

impl TerminalOperator {
    /// Start the stdin reader.
    pub fn spawn() -> anyhow::Result<Self> {
        let grammar = Grammar::new()?;
        let (tx, rx) = mpsc::channel(16);
        // Blocking stdin reads cannot be cancelled, keep them off the runtime.
        std::thread::spawn(move || {
            for line in std::io::stdin().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "Stdin read failed");
                        break;
                    }
                }
            }
        });
        Ok(Self { lines: rx, grammar })
    }

    async fn ask(&mut self, prompt: &str) -> anyhow::Result<String> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        self.lines.recv().await.context("stdin closed")
    }

    async fn ask_yes_no(&mut self, prompt: &str) -> anyhow::Result<bool> {
        let answer = self.ask(prompt).await?;
        Ok(self.grammar.is_affirmative(&answer))
    }
}

impl Operator for TerminalOperator {
    async fn confirm_join(&mut self, prompt: &JoinPrompt) -> anyhow::Result<bool> {
        let message = match &prompt.message {
            Some(message) => format!("({message})"),
            None => "(NO MESSAGE)".to_string(),
        };
        self.ask_yes_no(&format!(
            "incoming join request from \"{}\" {}\nACCEPT (y/N) ",
            prompt.peer, message
        ))
        .await
    }

    async fn pick_color(&mut self, team: TeamId) -> anyhow::Result<Option<Color>> {
        let manual = self
            .ask_yes_no(&format!(
                "preset colors are all in use, would you like to input a color for team {team}? (y/N) "
            ))
            .await?;
        if !manual {
            return Ok(None);
        }
        loop {
            let line = self.ask("enter color: ").await?;
            match self.grammar.color(&line) {
                Ok(color) => return Ok(Some(color)),
                Err(e) => println!("{e}"),
            }
        }
    }

    async fn confirm_start(&mut self, guests: usize) -> anyhow::Result<bool> {
        self.ask_yes_no(&format!(
            "{guests} other players present, would you like to start now? (y/N) "
        ))
        .await
    }

    async fn choose_move(&mut self, board: &Board, team: TeamId) -> anyhow::Result<Position> {
        loop {
            let line = self.ask("enter position: ").await?;
            match self.grammar.position(&line, board, team) {
                Ok(pos) => return Ok(pos),
                Err(e) => println!("{e}"),
            }
        }
    }

    fn render_move(&mut self, mv: Move, board: &Board, colors: &ColorRegistry) {
        println!("{}", render::move_line(mv, colors));
        print!("{}", render::board(board, colors));
    }

    fn notice(&mut self, notice: Notice) {
        match notice {
            Notice::GuestAdmitted { team, peer } => println!("{peer} joined as team {team}"),
            Notice::GuestDenied { peer } => println!("denied {peer}"),
            Notice::ColorAssigned { .. } => {}
            Notice::Started { players: Some(players) } => {
                println!("game started with {players} players")
            }
            Notice::Started { players: None } => println!("game started"),
            Notice::Joined { team, board_size } => {
                println!("joined as team {team} on a {board_size}x{board_size} board, waiting for the host")
            }
            Notice::MoveRejected { x, y, .. } => println!("move {x}, {y} was rejected"),
            Notice::Waiting { .. } => println!("please wait for other player(s)"),
        }
    }
}
