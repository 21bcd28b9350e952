//! Guest side of the turn loop.
//!
//! The guest never decides anything about the board. Its own moves are only
//! applied once the host broadcasts them back, like everyone else's.

use protocol::io::write_packet;
use protocol::packets::{GameOpcode, MoveBroadcast, MoveRequest, read_verdict};
use protocol::{ProtocolError, TeamId, UNCLAIMED};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, BufStream};
use tracing::{debug, info, trace};

use crate::SessionError;
use crate::board::{Board, Position};
use crate::colors::ColorRegistry;
use crate::operator::{Move, Notice, Operator};

/// What one call to [`GuestLoop::play_turn`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestTurn {
    /// We sent a move and the host answered.
    Submitted { position: Position, accepted: bool },
    /// A broadcast move was applied to the mirror.
    Mirrored(Move),
}

/// A guest in a started game, holding a replica of the host's board.
pub struct GuestLoop<S> {
    stream: BufStream<S>,
    team: TeamId,
    board: Board,
    colors: ColorRegistry,
    my_turn: bool,
}

impl<S: AsyncRead + AsyncWrite + Unpin> GuestLoop<S> {
    pub(crate) fn new(stream: BufStream<S>, team: TeamId, board: Board, colors: ColorRegistry) -> Self {
        Self {
            stream,
            team,
            board,
            colors,
            // The host always opens.
            my_turn: false,
        }
    }

    pub fn team(&self) -> TeamId {
        self.team
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn colors(&self) -> &ColorRegistry {
        &self.colors
    }

    pub fn is_my_turn(&self) -> bool {
        self.my_turn
    }

    /// Play until the host goes away or the operator fails.
    pub async fn run<O: Operator>(mut self, operator: &mut O) -> Result<(), SessionError> {
        loop {
            self.play_turn(operator).await?;
        }
    }

    /// Submit a move if it is our turn, otherwise wait for the next
    /// broadcast.
    pub async fn play_turn<O: Operator>(&mut self, operator: &mut O) -> Result<GuestTurn, SessionError> {
        if self.my_turn {
            self.submit(operator).await
        } else {
            self.mirror(operator).await
        }
    }

    async fn submit<O: Operator>(&mut self, operator: &mut O) -> Result<GuestTurn, SessionError> {
        let position = loop {
            let position = operator.choose_move(&self.board, self.team).await?;
            if self.board.is_valid_move(position, self.team) {
                break position;
            }
            debug!(?position, "Operator picked an illegal cell, asking again");
        };

        let request = MoveRequest::new(position.x as i32, position.y as i32);
        write_packet(&mut self.stream, request.build())
            .await
            .map_err(SessionError::host)?;
        let accepted = read_verdict(&mut self.stream).await.map_err(SessionError::host)?;

        if accepted {
            self.my_turn = false;
        } else {
            info!(?position, "Host rejected our move");
            operator.notice(Notice::MoveRejected {
                team: self.team,
                x: request.x,
                y: request.y,
            });
        }
        Ok(GuestTurn::Submitted { position, accepted })
    }

    async fn mirror<O: Operator>(&mut self, operator: &mut O) -> Result<GuestTurn, SessionError> {
        loop {
            let opcode = self.stream.read_u8().await.map_err(|e| SessionError::host(e.into()))?;
            if opcode == GameOpcode::Move as u8 {
                break;
            }
            trace!(opcode, "Skipping byte while waiting for a move");
        }

        let broadcast = MoveBroadcast::read_body(&mut self.stream)
            .await
            .map_err(SessionError::host)?;
        let position = Position::from_wire(broadcast.x, broadcast.y)
            .filter(|pos| self.board.in_bounds(*pos))
            .ok_or_else(|| {
                SessionError::host(ProtocolError::OutOfBounds {
                    x: broadcast.x,
                    y: broadcast.y,
                })
            })?;
        // Every team in play has a palette entry, handed out at join time.
        if broadcast.team == UNCLAIMED || !self.colors.covers(broadcast.team) {
            return Err(SessionError::host(ProtocolError::InvalidTeam(
                broadcast.team as i32,
            )));
        }

        let cascade = self.board.apply_move(position, broadcast.team);
        self.my_turn = broadcast.your_turn;
        debug!(
            team = broadcast.team,
            x = position.x,
            y = position.y,
            overflows = cascade.overflows,
            my_turn = self.my_turn,
            "Mirrored move"
        );

        let mv = Move {
            position,
            team: broadcast.team,
        };
        operator.render_move(mv, &self.board, &self.colors);
        if !self.my_turn {
            operator.notice(Notice::Waiting { next: None });
        }
        Ok(GuestTurn::Mirrored(mv))
    }
}
