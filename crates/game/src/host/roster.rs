//! Connected guests.

use futures_util::future::try_join_all;
use protocol::io::write_packet;
use protocol::{BinaryWriter, HOST_TEAM, TeamId};
use tokio::io::{AsyncRead, AsyncWrite, BufStream};

use crate::SessionError;

/// One admitted guest and its connection.
#[derive(Debug)]
pub struct Guest<S> {
    /// Team this guest plays, 2 or more.
    pub team: TeamId,
    /// Remote address, for prompts and logs.
    pub peer: String,
    pub(crate) stream: BufStream<S>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Guest<S> {
    pub(crate) fn new(team: TeamId, peer: String, stream: BufStream<S>) -> Self {
        Self {
            team,
            peer,
            stream,
        }
    }

    /// Send one message; failures are fatal for this guest's team.
    pub async fn send(&mut self, packet: BinaryWriter) -> Result<(), SessionError> {
        write_packet(&mut self.stream, packet)
            .await
            .map_err(SessionError::guest(self.team))
    }
}

/// Guests in join order. Guest `i` plays team `i + 2`.
#[derive(Debug)]
pub struct Roster<S> {
    guests: Vec<Guest<S>>,
}

impl<S> Default for Roster<S> {
    fn default() -> Self {
        Self { guests: Vec::new() }
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Roster<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.guests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guests.is_empty()
    }

    /// Players including the host.
    pub fn player_count(&self) -> u32 {
        self.guests.len() as u32 + 1
    }

    /// Team the next admitted guest will play.
    pub fn next_team(&self) -> TeamId {
        HOST_TEAM + self.player_count()
    }

    pub(crate) fn push(&mut self, guest: Guest<S>) {
        debug_assert_eq!(guest.team, self.next_team());
        self.guests.push(guest);
    }

    pub fn get_mut(&mut self, team: TeamId) -> Option<&mut Guest<S>> {
        let index = (team as usize).checked_sub(2)?;
        self.guests.get_mut(index)
    }

    /// Send every guest the packet `build` makes for it.
    pub async fn broadcast<F>(&mut self, build: F) -> Result<(), SessionError>
    where
        F: Fn(&Guest<S>) -> BinaryWriter,
    {
        let sends = self.guests.iter_mut().map(|guest| {
            let packet = build(guest);
            guest.send(packet)
        });
        try_join_all(sends).await?;
        Ok(())
    }
}
