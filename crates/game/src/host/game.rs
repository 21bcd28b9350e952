//! Host side of the turn loop.
//!
//! The host owns the authoritative board. Every move, local or remote, is
//! checked here, applied here and then broadcast to every guest.

use protocol::packets::{MoveBroadcast, MoveRequest, build_verdict};
use protocol::{HOST_TEAM, TeamId};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use super::roster::Roster;
use crate::SessionError;
use crate::board::{Board, Position};
use crate::colors::ColorRegistry;
use crate::operator::{Move, Notice, Operator};
use crate::turn::TurnCursor;

/// What one call to [`GameSession::play_turn`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Applied(Move),
    /// A guest sent an illegal move. It keeps the turn.
    Rejected { team: TeamId, x: i32, y: i32 },
}

/// A started game with a frozen roster.
pub struct GameSession<S> {
    board: Board,
    colors: ColorRegistry,
    roster: Roster<S>,
    cursor: TurnCursor,
}

impl<S: AsyncRead + AsyncWrite + Unpin> GameSession<S> {
    pub(crate) fn new(board: Board, colors: ColorRegistry, roster: Roster<S>) -> Self {
        let cursor = TurnCursor::new(roster.player_count());
        Self {
            board,
            colors,
            roster,
            cursor,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn colors(&self) -> &ColorRegistry {
        &self.colors
    }

    pub fn roster(&self) -> &Roster<S> {
        &self.roster
    }

    pub fn cursor(&self) -> &TurnCursor {
        &self.cursor
    }

    /// Play turns until a connection or the operator fails.
    pub async fn run<O: Operator>(mut self, operator: &mut O) -> Result<(), SessionError> {
        loop {
            self.play_turn(operator).await?;
        }
    }

    /// Play whoever's turn it is once.
    pub async fn play_turn<O: Operator>(&mut self, operator: &mut O) -> Result<TurnOutcome, SessionError> {
        let team = self.cursor.current();
        if team == HOST_TEAM {
            let position = self.choose_local_move(operator).await?;
            let mv = self.apply_and_broadcast(position, team, operator).await?;
            return Ok(TurnOutcome::Applied(mv));
        }

        let guest = self
            .roster
            .get_mut(team)
            .ok_or(SessionError::MissingGuest(team))?;
        let request = MoveRequest::read(&mut guest.stream)
            .await
            .map_err(SessionError::guest(team))?;

        let position = Position::from_wire(request.x, request.y)
            .filter(|pos| self.board.is_valid_move(*pos, team));
        let Some(position) = position else {
            warn!(team, x = request.x, y = request.y, "Rejected move");
            guest.send(build_verdict(false)).await?;
            operator.notice(Notice::MoveRejected {
                team,
                x: request.x,
                y: request.y,
            });
            return Ok(TurnOutcome::Rejected {
                team,
                x: request.x,
                y: request.y,
            });
        };

        guest.send(build_verdict(true)).await?;
        let mv = self.apply_and_broadcast(position, team, operator).await?;
        Ok(TurnOutcome::Applied(mv))
    }

    async fn choose_local_move<O: Operator>(&mut self, operator: &mut O) -> Result<Position, SessionError> {
        loop {
            let position = operator.choose_move(&self.board, HOST_TEAM).await?;
            if self.board.is_valid_move(position, HOST_TEAM) {
                return Ok(position);
            }
            debug!(?position, "Operator picked an illegal cell, asking again");
        }
    }

    async fn apply_and_broadcast<O: Operator>(
        &mut self,
        position: Position,
        team: TeamId,
        operator: &mut O,
    ) -> Result<Move, SessionError> {
        let cascade = self.board.apply_move(position, team);
        let next = self.cursor.advance();
        info!(
            team,
            x = position.x,
            y = position.y,
            overflows = cascade.overflows,
            next,
            "Move applied"
        );
        if cascade.conquered {
            info!(team, "Team owns the whole board");
        }

        let broadcast = MoveBroadcast {
            x: position.x as i32,
            y: position.y as i32,
            team,
            your_turn: false,
        };
        self.roster
            .broadcast(|guest| {
                MoveBroadcast {
                    your_turn: guest.team == next,
                    ..broadcast
                }
                .build()
            })
            .await?;

        let mv = Move { position, team };
        operator.render_move(mv, &self.board, &self.colors);
        if next != HOST_TEAM {
            operator.notice(Notice::Waiting { next: Some(next) });
        }
        Ok(mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedOperator, admit};
    use protocol::io::write_packet;
    use protocol::packets::read_verdict;
    use tokio::io::{AsyncReadExt, DuplexStream};

    async fn read_broadcast(guest: &mut DuplexStream) -> MoveBroadcast {
        assert_eq!(guest.read_u8().await.unwrap(), 0x02);
        MoveBroadcast::read_body(guest).await.unwrap()
    }

    #[tokio::test]
    async fn test_host_corner_overflow_flips_neighbours_and_broadcasts() {
        let (mut game, mut guests) = admit(3, 1).await;
        game.board.seed(Position::new(0, 0), HOST_TEAM, 2);
        let mut operator = ScriptedOperator::default();
        operator.moves.push_back(Position::new(0, 0));

        let outcome = game.play_turn(&mut operator).await.unwrap();

        let mv = Move { position: Position::new(0, 0), team: 1 };
        assert_eq!(outcome, TurnOutcome::Applied(mv));
        for pos in [Position::new(1, 0), Position::new(0, 1)] {
            let cell = game.board().cell(pos).unwrap();
            assert_eq!((cell.owner, cell.count), (1, 2));
        }
        assert_eq!(game.board().cell(Position::new(0, 0)).unwrap().count, 1);
        assert_eq!(
            read_broadcast(&mut guests[0]).await,
            MoveBroadcast { x: 0, y: 0, team: 1, your_turn: true }
        );
        assert_eq!(game.cursor().current(), 2);
        assert_eq!(operator.rendered, vec![mv]);
        assert!(operator.notices.contains(&Notice::Waiting { next: Some(2) }));
    }

    #[tokio::test]
    async fn test_host_is_asked_again_after_illegal_pick() {
        let (mut game, _guests) = admit(3, 1).await;
        game.board.seed(Position::new(1, 1), 2, 1);
        let mut operator = ScriptedOperator::default();
        operator
            .moves
            .extend([Position::new(1, 1), Position::new(7, 0), Position::new(2, 2)]);

        let outcome = game.play_turn(&mut operator).await.unwrap();

        assert_eq!(
            outcome,
            TurnOutcome::Applied(Move { position: Position::new(2, 2), team: 1 })
        );
        assert!(operator.moves.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_guest_move_changes_nothing() {
        let (mut game, mut guests) = admit(3, 1).await;
        let mut operator = ScriptedOperator::default();
        operator.moves.push_back(Position::new(0, 0));
        game.play_turn(&mut operator).await.unwrap();
        read_broadcast(&mut guests[0]).await;

        let before = game.board().clone();
        for (x, y) in [(0, 0), (3, 0), (0, -1)] {
            write_packet(&mut guests[0], MoveRequest::new(x, y).build())
                .await
                .unwrap();
            let outcome = game.play_turn(&mut operator).await.unwrap();
            assert_eq!(outcome, TurnOutcome::Rejected { team: 2, x, y });
            assert!(!read_verdict(&mut guests[0]).await.unwrap());
            assert_eq!(game.board(), &before);
            assert_eq!(game.cursor().current(), 2);
        }

        write_packet(&mut guests[0], MoveRequest::new(2, 1).build())
            .await
            .unwrap();
        let outcome = game.play_turn(&mut operator).await.unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Applied(Move { position: Position::new(2, 1), team: 2 })
        );
        assert!(read_verdict(&mut guests[0]).await.unwrap());
        assert_eq!(
            read_broadcast(&mut guests[0]).await,
            MoveBroadcast { x: 2, y: 1, team: 2, your_turn: false }
        );
        assert_eq!(game.cursor().current(), 1);
    }

    #[tokio::test]
    async fn test_each_guest_learns_whether_it_is_next() {
        let (mut game, mut guests) = admit(4, 2).await;
        let mut operator = ScriptedOperator::default();
        operator.moves.push_back(Position::new(1, 1));
        game.play_turn(&mut operator).await.unwrap();

        assert!(read_broadcast(&mut guests[0]).await.your_turn);
        assert!(!read_broadcast(&mut guests[1]).await.your_turn);

        write_packet(&mut guests[0], MoveRequest::new(3, 3).build())
            .await
            .unwrap();
        game.play_turn(&mut operator).await.unwrap();
        assert!(read_verdict(&mut guests[0]).await.unwrap());
        assert!(!read_broadcast(&mut guests[0]).await.your_turn);
        let seen = read_broadcast(&mut guests[1]).await;
        assert_eq!((seen.x, seen.y, seen.team, seen.your_turn), (3, 3, 2, true));
        assert_eq!(game.cursor().current(), 3);
    }

    #[tokio::test]
    async fn test_guest_disconnect_is_fatal() {
        let (mut game, mut guests) = admit(3, 1).await;
        let mut operator = ScriptedOperator::default();
        operator.moves.push_back(Position::new(0, 0));
        game.play_turn(&mut operator).await.unwrap();
        drop(guests.remove(0));

        let err = game.play_turn(&mut operator).await.unwrap_err();
        assert!(matches!(err, SessionError::Guest { team: 2, ref source } if source.is_disconnect()));
    }
}
