//! Error types for the game layer.

use wordforge_oracle::OracleError;
use wordforge_protocol::{GameMode, PlayerId, SessionId};
use wordforge_store::StoreError;

use crate::IdError;

/// Errors returned by sessions and the registry.
///
/// Every variant is a value the caller can turn into a player-facing
/// message; none of them means the process is in trouble.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The player is not a member of this session.
    #[error("player {0} is not in session {1}")]
    NotAMember(PlayerId, SessionId),

    /// The session already ended; nothing more can be played.
    #[error("session {0} is finished")]
    SessionFinished(SessionId),

    /// Race sessions must be started by the host first.
    #[error("session {0} has not started")]
    SessionNotStarted(SessionId),

    /// The race was already started, or the session no longer accepts
    /// joins because it has.
    #[error("session {0} has already started")]
    AlreadyStarted(SessionId),

    /// The player already found the answer in this competitive session.
    #[error("player {0} already completed session {1}")]
    AlreadyCompleted(PlayerId, SessionId),

    /// The player has a guess still being evaluated.
    #[error("player {0} already has a guess in flight")]
    AlreadyPending(PlayerId),

    /// Another submission won the race first; this guess was discarded.
    #[error("the race in session {0} was already decided")]
    RaceLost(SessionId),

    /// Another player already used this word (or its lemma).
    #[error("`{0}` was already used")]
    WordAlreadyUsed(String),

    /// The distance oracle could not be reached.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// No session with this id exists, in memory or in the store.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The session is at its player cap.
    #[error("session {0} is full")]
    Full(SessionId),

    /// The player is already in a session.
    #[error("player {0} is already in session {1}")]
    AlreadyInSession(PlayerId, SessionId),

    /// The player is not in any session.
    #[error("player {0} is not in a session")]
    NotInSession(PlayerId),

    /// Only the host (first member) may do this.
    #[error("player {0} is not the host of session {1}")]
    NotHost(PlayerId, SessionId),

    /// The session has no players.
    #[error("session {0} has no players")]
    NoPlayers(SessionId),

    /// Tips are turned off for this session or mode.
    #[error("tips are disabled in session {0}")]
    TipsDisabled(SessionId),

    /// No suitable tip word could be found.
    #[error("no unused tip available")]
    NoTipAvailable,

    /// Giving up is turned off for this session.
    #[error("giving up is disabled in session {0}")]
    GiveUpDisabled(SessionId),

    /// Cooperative sessions can only be abandoned by a lone player.
    #[error("giving up in session {0} requires being the only player")]
    GiveUpRequiresSolo(SessionId),

    /// The operation does not exist in this mode.
    #[error("{operation} is not available in {mode} sessions")]
    Unsupported {
        operation: &'static str,
        mode: GameMode,
    },

    /// The requested date or round can't be played.
    #[error("invalid round: {0}")]
    InvalidRound(String),

    /// A session id could not be allocated.
    #[error(transparent)]
    Id(#[from] IdError),

    /// A forced save failed after all retries.
    #[error(transparent)]
    Persistence(#[from] StoreError),
}
