//! Per-mode rules.
//!
//! Every session runs the same skeleton (validate, look up, commit); the
//! four modes only differ in a handful of hooks, collected in the
//! [`Rules`] trait. [`Variant`] is the closed set of implementations, so
//! mode-specific queries can `match` on it exhaustively.

mod competitive;
mod cooperative;
mod exclusive;
mod race;

use wordforge_protocol::{CacheEntry, GameMode, Guess, ModeRecord, PlayerId};

use crate::GameError;
use crate::state::{Core, Scope, Ticket};

pub(crate) use competitive::Competitive;
pub(crate) use cooperative::Cooperative;
pub(crate) use exclusive::ExclusiveWordRace;
pub(crate) use race::RaceToAnswer;

/// Hooks a mode plugs into the shared session skeleton.
///
/// Every hook runs under the session lock, so none of them may block or
/// await.
pub(crate) trait Rules: Send {
    fn mode(&self) -> GameMode;

    /// Whose guesses count as `player`'s history.
    fn scope(&self, player: PlayerId) -> Scope {
        Scope::Player(player)
    }

    /// Extra conditions for joining.
    fn check_join(&self, _core: &Core, _player: PlayerId) -> Result<(), GameError> {
        Ok(())
    }

    /// Whether `player` may still play (guess or ask for tips).
    fn check_active(&self, _core: &Core, _player: PlayerId) -> Result<(), GameError> {
        Ok(())
    }

    /// Checks a normalized word before it is looked up.
    fn check_word(&self, _core: &Core, _player: PlayerId, _word: &str) -> Result<(), GameError> {
        Ok(())
    }

    /// Checks a scored result after the lookup, before anything is recorded.
    fn check_result(&self, _core: &Core, _entry: &CacheEntry) -> Result<(), GameError> {
        Ok(())
    }

    /// Records a scored guess and applies the win condition.
    ///
    /// Returns whether the guess solved the round. An error means nothing
    /// was recorded.
    fn commit(&mut self, core: &mut Core, guess: Guess, ticket: &Ticket) -> Result<bool, GameError>;

    /// Whether a tip word may be shown.
    fn accepts_tip(&self, _entry: &CacheEntry) -> bool {
        true
    }

    /// Called after `player` was removed from `core.players`.
    fn on_leave(&mut self, _core: &mut Core, _player: PlayerId) {}

    /// Mode state to persist.
    fn to_record(&self) -> ModeRecord;
}

/// One of the four rule sets.
pub(crate) enum Variant {
    Cooperative(Cooperative),
    Competitive(Competitive),
    RaceToAnswer(RaceToAnswer),
    ExclusiveWordRace(ExclusiveWordRace),
}

impl Variant {
    pub fn new(mode: GameMode) -> Self {
        Self::restore(mode, &ModeRecord::default(), &[])
    }

    /// Rebuilds mode state from a saved record.
    pub fn restore(mode: GameMode, record: &ModeRecord, guesses: &[Guess]) -> Self {
        match mode {
            GameMode::Cooperative => Self::Cooperative(Cooperative::restore(record)),
            GameMode::Competitive => Self::Competitive(Competitive::restore(record)),
            GameMode::RaceToAnswer => Self::RaceToAnswer(RaceToAnswer::restore(record)),
            GameMode::ExclusiveWordRace => {
                Self::ExclusiveWordRace(ExclusiveWordRace::restore(record, guesses))
            }
        }
    }

    pub fn rules(&self) -> &dyn Rules {
        match self {
            Self::Cooperative(v) => v,
            Self::Competitive(v) => v,
            Self::RaceToAnswer(v) => v,
            Self::ExclusiveWordRace(v) => v,
        }
    }

    pub fn rules_mut(&mut self) -> &mut dyn Rules {
        match self {
            Self::Cooperative(v) => v,
            Self::Competitive(v) => v,
            Self::RaceToAnswer(v) => v,
            Self::ExclusiveWordRace(v) => v,
        }
    }
}
