//! Identity types and the game-mode tag.
//!
//! Every id here is a "newtype wrapper" around a primitive, so a
//! `SessionId` can never be passed where a `PlayerId` is expected even
//! though both are `u64` underneath. `#[serde(transparent)]` keeps them as
//! plain numbers in JSON and in database columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Chat platforms hand out 64-bit user ids, so the transport layer can
/// wrap them directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a session (one room playing one round).
///
/// Allocated by the registry as a snowflake, so ids sort by creation time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// The daily puzzle a session plays.
///
/// Round numbers count days from a fixed epoch; every session playing the
/// same round shares the same hidden answer and the same distance cache.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoundId(pub u32);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// GameMode
// ---------------------------------------------------------------------------

/// Which rule set a session follows.
///
/// - **Cooperative**: one shared guess list, finished by the first exact
///   guess.
/// - **Competitive**: independent guess lists; players complete
///   individually and are ranked on a leaderboard.
/// - **RaceToAnswer**: explicit start; the first correct guess ends the
///   round for everyone.
/// - **ExclusiveWordRace**: a race where every word can be used by only one
///   player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Cooperative,
    Competitive,
    RaceToAnswer,
    ExclusiveWordRace,
}

impl GameMode {
    /// All modes, in declaration order.
    pub const ALL: [GameMode; 4] = [
        Self::Cooperative,
        Self::Competitive,
        Self::RaceToAnswer,
        Self::ExclusiveWordRace,
    ];

    /// Returns `true` for modes where the first exact guess ends the round
    /// for everyone and which need an explicit start.
    pub fn is_race(self) -> bool {
        matches!(self, Self::RaceToAnswer | Self::ExclusiveWordRace)
    }

    /// Stable name used in storage columns and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cooperative => "cooperative",
            Self::Competitive => "competitive",
            Self::RaceToAnswer => "race_to_answer",
            Self::ExclusiveWordRace => "exclusive_word_race",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ProtocolError::InvalidValue(format!("unknown game mode `{s}`")))
    }
}
