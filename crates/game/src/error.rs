//! Session error types.

use protocol::{ProtocolError, TeamId};
use thiserror::Error;

/// Errors raised while negotiating or playing a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A connection that has not joined yet failed; the host drops it and
    /// keeps accepting.
    #[error("Handshake with {peer} failed: {source}")]
    Handshake {
        peer: String,
        #[source]
        source: ProtocolError,
    },

    /// A rostered guest failed. The session cannot continue without it.
    #[error("Lost team {team}: {source}")]
    Guest {
        team: TeamId,
        #[source]
        source: ProtocolError,
    },

    /// Guest side: the connection to the host failed.
    #[error("Lost the host: {source}")]
    Host {
        #[source]
        source: ProtocolError,
    },

    #[error("Join denied (code {code:#04x}){}", reason_suffix(.reason))]
    Denied { code: u8, reason: Option<String> },

    #[error("No guest plays team {0}")]
    MissingGuest(TeamId),

    #[error("Board size {size} is outside {min}..={max}")]
    InvalidBoardSize { size: usize, min: usize, max: usize },

    #[error(transparent)]
    Operator(#[from] anyhow::Error),
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default()
}

impl SessionError {
    pub(crate) fn guest(team: TeamId) -> impl FnOnce(ProtocolError) -> SessionError {
        move |source| SessionError::Guest { team, source }
    }

    pub(crate) fn handshake(peer: &str) -> impl FnOnce(ProtocolError) -> SessionError + use<> {
        let peer = peer.to_owned();
        move |source| SessionError::Handshake { peer, source }
    }

    pub(crate) fn host(source: ProtocolError) -> SessionError {
        SessionError::Host { source }
    }
}
