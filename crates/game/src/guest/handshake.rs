//! Guest side of the join handshake and the lobby wait.

use protocol::io::write_packet;
use protocol::packets::{Assignment, JoinOutcome, JoinRequest, LobbyMessage, read_palette};
use protocol::TeamId;
use tokio::io::{AsyncRead, AsyncWrite, BufStream};
use tracing::{debug, info};

use super::session::GuestLoop;
use crate::SessionError;
use crate::board::Board;
use crate::colors::ColorRegistry;
use crate::operator::{Notice, Operator};

/// A guest the host has accepted, still waiting in the lobby.
pub struct GuestHandshake<S> {
    stream: BufStream<S>,
    team: TeamId,
    board: Board,
    colors: ColorRegistry,
}

impl<S: AsyncRead + AsyncWrite + Unpin> GuestHandshake<S> {
    /// Send the join request and read the host's answer.
    ///
    /// A refusal comes back as [`SessionError::Denied`].
    pub async fn join(stream: S, message: Option<&str>) -> Result<Self, SessionError> {
        let mut stream = BufStream::new(stream);
        write_packet(&mut stream, JoinRequest::new(message).build())
            .await
            .map_err(SessionError::host)?;

        match JoinOutcome::read(&mut stream).await.map_err(SessionError::host)? {
            JoinOutcome::Accepted => {}
            JoinOutcome::Denied { code, reason } => {
                info!(code, ?reason, "Join denied");
                return Err(SessionError::Denied { code, reason });
            }
        }

        let assignment = Assignment::read(&mut stream).await.map_err(SessionError::host)?;
        let mut colors = ColorRegistry::initial_defaults();
        for color in read_palette(&mut stream).await.map_err(SessionError::host)? {
            colors.append(color);
        }
        info!(
            team = assignment.team,
            board_size = assignment.board_size,
            colors = colors.len(),
            "Joined"
        );

        Ok(Self {
            stream,
            team: assignment.team,
            board: Board::new(assignment.board_size),
            colors,
        })
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

    /// Track lobby messages until the host starts the game.
    pub async fn wait_for_start<O: Operator>(mut self, operator: &mut O) -> Result<GuestLoop<S>, SessionError> {
        operator.notice(Notice::Joined {
            team: self.team,
            board_size: self.board.size(),
        });

        loop {
            match LobbyMessage::read(&mut self.stream)
                .await
                .map_err(SessionError::host)?
            {
                LobbyMessage::NewColor(color) => {
                    let index = self.colors.append(color);
                    debug!(index, ?color, "New team color");
                    operator.notice(Notice::ColorAssigned {
                        team: index as TeamId,
                        color,
                    });
                }
                LobbyMessage::Start => break,
                LobbyMessage::Unknown(opcode) => {
                    debug!(opcode, "Ignoring lobby byte");
                }
            }
        }

        info!(team = self.team, "Game started");
        operator.notice(Notice::Started { players: None });
        Ok(GuestLoop::new(self.stream, self.team, self.board, self.colors))
    }
}
