//! Host side of the join handshake.
//!
//! Connections are handled one at a time: a guest is fully accepted or
//! denied before the next connection is read from. Once the operator starts
//! the game the listener is dropped and the roster is frozen.

use protocol::io::write_packet;
use protocol::packets::{
    Assignment, DenyCode, JoinRequest, build_deny_with_reason, build_join_reply, build_new_color,
    build_palette, build_start,
};
use protocol::{ProtocolError, TeamId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::ops::Range;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use super::game::GameSession;
use super::roster::{Guest, Roster};
use crate::SessionError;
use crate::board::Board;
use crate::colors::{ColorRegistry, random_color};
use crate::config::PaletteConfig;
use crate::operator::{JoinPrompt, Notice, Operator};

/// Result of negotiating with one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted(TeamId),
    Denied,
}

/// The open lobby: board size is fixed, roster and palette are growing.
pub struct JoinSession<S> {
    board_size: usize,
    colors: ColorRegistry,
    roster: Roster<S>,
    channel_range: Range<u8>,
    rng: StdRng,
}

impl<S: AsyncRead + AsyncWrite + Unpin> JoinSession<S> {
    pub fn new(board_size: usize, palette: &PaletteConfig) -> Self {
        Self::with_rng(board_size, palette, StdRng::from_os_rng())
    }

    pub fn with_rng(board_size: usize, palette: &PaletteConfig, rng: StdRng) -> Self {
        Self {
            board_size,
            colors: ColorRegistry::initial_defaults(),
            roster: Roster::new(),
            channel_range: palette.channel_range(),
            rng,
        }
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn colors(&self) -> &ColorRegistry {
        &self.colors
    }

    pub fn roster(&self) -> &Roster<S> {
        &self.roster
    }

    /// Run the join handshake with one new connection.
    ///
    /// Errors on the new connection come back as
    /// [`SessionError::Handshake`]; errors writing to guests already on the
    /// roster are fatal and come back as [`SessionError::Guest`].
    pub async fn negotiate<O: Operator>(
        &mut self,
        stream: S,
        peer: String,
        operator: &mut O,
    ) -> Result<Admission, SessionError> {
        let mut stream = BufStream::new(stream);

        let request = match JoinRequest::read(&mut stream).await {
            Ok(request) => request,
            Err(source) if source.is_malformed() => {
                warn!(%peer, error = %source, "Malformed join request");
                let reply = build_deny_with_reason(DenyCode::Malformed, &source.to_string());
                if let Err(e) = write_packet(&mut stream, reply).await {
                    debug!(%peer, error = %e, "Could not deliver denial");
                }
                operator.notice(Notice::GuestDenied { peer });
                return Ok(Admission::Denied);
            }
            Err(source) => return Err(SessionError::Handshake { peer, source }),
        };

        let prompt = JoinPrompt {
            peer: peer.clone(),
            message: request.message,
        };
        if !operator.confirm_join(&prompt).await? {
            info!(%peer, "Join request denied");
            write_packet(&mut stream, build_join_reply(false))
                .await
                .map_err(SessionError::handshake(&peer))?;
            if let Err(e) = stream.shutdown().await {
                debug!(%peer, error = %e, "Shutdown after denial failed");
            }
            operator.notice(Notice::GuestDenied { peer });
            return Ok(Admission::Denied);
        }

        let team = self.roster.next_team();
        let mut reply = build_join_reply(true);
        let assignment = Assignment {
            team,
            board_size: self.board_size,
        };
        reply.put_slice(assignment.build().as_slice());
        write_packet(&mut stream, reply)
            .await
            .map_err(SessionError::handshake(&peer))?;

        if !self.colors.covers(team) {
            let color = match operator.pick_color(team).await? {
                Some(color) => color,
                None => random_color(&mut self.rng, self.channel_range.clone()),
            };
            let index = self.colors.append(color);
            debug_assert_eq!(index, team as usize);
            info!(team, ?color, "Assigned custom color");
            // The newcomer gets it with the full palette below.
            self.roster.broadcast(|_| build_new_color(color)).await?;
            operator.notice(Notice::ColorAssigned { team, color });
        }

        write_packet(&mut stream, build_palette(&self.colors.custom()))
            .await
            .map_err(SessionError::handshake(&peer))?;

        info!(team, %peer, "Guest admitted");
        self.roster.push(Guest::new(team, peer.clone(), stream));
        operator.notice(Notice::GuestAdmitted { team, peer });
        Ok(Admission::Admitted(team))
    }

    /// Close the lobby: tell every guest the game starts and hand over to
    /// the turn loop.
    pub async fn start<O: Operator>(mut self, operator: &mut O) -> Result<GameSession<S>, SessionError> {
        self.roster.broadcast(|_| build_start()).await?;
        let players = self.roster.player_count();
        info!(players, board_size = self.board_size, "Game started");
        operator.notice(Notice::Started {
            players: Some(players),
        });
        Ok(GameSession::new(
            Board::new(self.board_size),
            self.colors,
            self.roster,
        ))
    }
}

impl JoinSession<TcpStream> {
    /// Accept guests from `listener` until the operator starts the game.
    ///
    /// The listener is dropped before the start broadcast, so late
    /// connections are refused by the OS.
    pub async fn accept_until_start<O: Operator>(
        mut self,
        listener: TcpListener,
        operator: &mut O,
    ) -> Result<GameSession<TcpStream>, SessionError> {
        loop {
            let (stream, addr) = listener.accept().await.map_err(ProtocolError::from)?;
            debug!(%addr, "Incoming connection");
            if let Err(e) = stream.set_nodelay(true) {
                debug!(%addr, error = %e, "Could not disable Nagle");
            }

            match self.negotiate(stream, addr.to_string(), operator).await {
                Ok(Admission::Admitted(_)) => {
                    if operator.confirm_start(self.roster.len()).await? {
                        break;
                    }
                }
                Ok(Admission::Denied) => {}
                Err(SessionError::Handshake { peer, source }) => {
                    warn!(%peer, error = %source, "Dropping connection");
                }
                Err(e) => return Err(e),
            }
        }
        drop(listener);
        self.start(operator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::PRESET_COUNT;
    use crate::guest::GuestHandshake;
    use crate::test_support::{ScriptedOperator, lobby};
    use protocol::Color;
    use protocol::packets::{JoinOutcome, LobbyMessage, read_palette};
    use tokio::io::{AsyncReadExt, DuplexStream, duplex};

    /// Guest end of a connection whose join request is already written.
    async fn connect(message: Option<&str>) -> (DuplexStream, DuplexStream) {
        let (mut guest, host) = duplex(1024);
        write_packet(&mut guest, JoinRequest::new(message).build())
            .await
            .unwrap();
        (guest, host)
    }

    #[tokio::test]
    async fn test_first_guest_is_team_two_with_preset_palette() {
        let mut session = lobby(8);
        let mut operator = ScriptedOperator::default().accepting(1);
        let (mut guest, host) = connect(Some("let me in")).await;

        let admission = session
            .negotiate(host, "peer-a".into(), &mut operator)
            .await
            .unwrap();

        assert_eq!(admission, Admission::Admitted(2));
        assert_eq!(operator.prompts[0].message.as_deref(), Some("let me in"));
        assert_eq!(JoinOutcome::read(&mut guest).await.unwrap(), JoinOutcome::Accepted);
        let assignment = Assignment::read(&mut guest).await.unwrap();
        assert_eq!(assignment, Assignment { team: 2, board_size: 8 });
        assert!(read_palette(&mut guest).await.unwrap().is_empty());
        assert_eq!(session.roster().len(), 1);
        assert_eq!(session.colors().len(), PRESET_COUNT);
    }

    #[tokio::test]
    async fn test_denied_guest_gets_bare_deny_and_eof() {
        let mut session = lobby(8);
        let mut operator = ScriptedOperator::default();
        operator.joins.push_back(false);
        let (mut guest, host) = connect(None).await;

        let admission = session
            .negotiate(host, "peer-b".into(), &mut operator)
            .await
            .unwrap();

        assert_eq!(admission, Admission::Denied);
        assert_eq!(operator.prompts[0].message, None);
        let mut rest = Vec::new();
        guest.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, vec![0x00]);
        assert!(session.roster().is_empty());
        assert_eq!(session.roster().next_team(), 2);
    }

    #[tokio::test]
    async fn test_oversized_join_message_gets_reasoned_denial() {
        let mut session = lobby(8);
        let mut operator = ScriptedOperator::default();
        let (mut guest, host) = duplex(1024);
        guest.write_all(&[1, 0x7F, 0, 0, 0]).await.unwrap();

        let admission = session
            .negotiate(host, "peer-c".into(), &mut operator)
            .await
            .unwrap();

        assert_eq!(admission, Admission::Denied);
        assert!(operator.prompts.is_empty());
        match JoinOutcome::read(&mut guest).await.unwrap() {
            JoinOutcome::Denied { code, reason } => {
                assert_eq!(code, DenyCode::Malformed as u8);
                assert!(reason.unwrap().contains("exceeds"));
            }
            other => panic!("expected denial, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_guest_vanishing_mid_handshake_is_a_handshake_error() {
        let mut session = lobby(8);
        let mut operator = ScriptedOperator::default();
        let (guest, host) = duplex(64);
        drop(guest);

        let err = session
            .negotiate(host, "peer-d".into(), &mut operator)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Handshake { ref peer, .. } if peer == "peer-d"));
    }

    #[tokio::test]
    async fn test_eighth_team_gets_custom_color_broadcast_to_earlier_guests() {
        let mut session = lobby(5);
        let mut operator = ScriptedOperator::default().accepting(7);
        let picked = Color::new(10, 20, 30);
        operator.colors.push_back(Some(picked));

        let mut guests = Vec::new();
        for n in 0..7 {
            let (mut guest, host) = connect(None).await;
            let admission = session
                .negotiate(host, format!("peer-{n}"), &mut operator)
                .await
                .unwrap();
            assert_eq!(admission, Admission::Admitted(n + 2));
            // Drain each guest's handshake so later lobby bytes line up.
            assert_eq!(JoinOutcome::read(&mut guest).await.unwrap(), JoinOutcome::Accepted);
            Assignment::read(&mut guest).await.unwrap();
            let custom = read_palette(&mut guest).await.unwrap();
            if n + 2 < 8 {
                assert!(custom.is_empty());
            } else {
                assert_eq!(custom, vec![picked]);
            }
            guests.push(guest);
        }

        assert_eq!(session.colors().len(), PRESET_COUNT + 1);
        assert_eq!(session.colors().custom(), vec![picked]);
        for guest in guests.iter_mut().take(6) {
            assert_eq!(
                LobbyMessage::read(guest).await.unwrap(),
                LobbyMessage::NewColor(picked)
            );
        }
        assert!(operator.notices.contains(&Notice::ColorAssigned { team: 8, color: picked }));
    }

    #[tokio::test]
    async fn test_generated_colors_come_from_configured_range() {
        let mut session = lobby(5);
        let mut operator = ScriptedOperator::default().accepting(8);
        for n in 0..8 {
            let (mut guest, host) = connect(None).await;
            session
                .negotiate(host, format!("peer-{n}"), &mut operator)
                .await
                .unwrap();
            let mut header = [0u8; 9];
            guest.read_exact(&mut header).await.unwrap();
            read_palette(&mut guest).await.unwrap();
        }
        let custom = session.colors().custom();
        assert_eq!(custom.len(), 2);
        for color in custom {
            for channel in [color.r, color.g, color.b] {
                assert!((150..200).contains(&channel));
            }
        }
    }

    #[tokio::test]
    async fn test_start_broadcasts_start_to_every_guest() {
        let mut session = lobby(6);
        let mut operator = ScriptedOperator::default().accepting(2);
        let mut guests = Vec::new();
        for n in 0..2 {
            let (mut guest, host) = connect(None).await;
            session
                .negotiate(host, format!("peer-{n}"), &mut operator)
                .await
                .unwrap();
            let mut handshake = [0u8; 13];
            guest.read_exact(&mut handshake).await.unwrap();
            guests.push(guest);
        }

        let game = session.start(&mut operator).await.unwrap();

        assert_eq!(game.cursor().players(), 3);
        assert_eq!(game.board().size(), 6);
        for guest in &mut guests {
            assert_eq!(guest.read_u8().await.unwrap(), 0x02);
        }
        assert!(operator.notices.contains(&Notice::Started { players: Some(3) }));
    }

    #[tokio::test]
    async fn test_guest_mirror_matches_fresh_eight_by_eight_board() {
        let mut session = lobby(8);
        let mut operator = ScriptedOperator::default().accepting(1);
        let (guest_end, host_end) = duplex(1024);

        let (admission, handshake) = tokio::join!(
            session.negotiate(host_end, "peer-e".into(), &mut operator),
            GuestHandshake::join(guest_end, Some("hello")),
        );
        let handshake = handshake.unwrap();

        assert_eq!(admission.unwrap(), Admission::Admitted(2));
        assert_eq!(handshake.team(), 2);
        let board = handshake.board();
        assert_eq!(board.size(), 8);
        assert_eq!(board, &Board::new(8));
        assert_eq!(board.rows().count(), 8);
        for row in board.rows() {
            assert_eq!(row.len(), 8);
            assert!(row.iter().all(|cell| cell.owner == 0 && cell.count == 1));
        }
        assert_eq!(handshake.colors().len(), 8);
        assert_eq!(handshake.colors(), session.colors());
    }

    #[tokio::test]
    async fn test_accept_until_start_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let session = JoinSession::with_rng(4, &PaletteConfig::default(), StdRng::seed_from_u64(1));
        let mut operator = ScriptedOperator::default();
        operator.joins.extend([false, true]);
        operator.starts.push_back(true);

        let guests = tokio::spawn(async move {
            // First one is turned away.
            let mut denied = TcpStream::connect(addr).await.unwrap();
            write_packet(&mut denied, JoinRequest::new(None).build()).await.unwrap();
            assert_eq!(denied.read_u8().await.unwrap(), 0x00);

            let mut guest = TcpStream::connect(addr).await.unwrap();
            write_packet(&mut guest, JoinRequest::new(Some("second")).build())
                .await
                .unwrap();
            assert_eq!(guest.read_u8().await.unwrap(), 0x01);
            let assignment = Assignment::read(&mut guest).await.unwrap();
            assert!(read_palette(&mut guest).await.unwrap().is_empty());
            assert_eq!(guest.read_u8().await.unwrap(), 0x02);
            assignment
        });

        let game = session
            .accept_until_start(listener, &mut operator)
            .await
            .unwrap();
        let assignment = guests.await.unwrap();

        assert_eq!(assignment, Assignment { team: 2, board_size: 4 });
        assert_eq!(game.cursor().players(), 2);
        assert_eq!(operator.prompts.len(), 2);
        assert!(TcpStream::connect(addr).await.is_err());
    }
}
