use wordforge_protocol::{GameMode, Guess, ModeRecord, PlayerId};

use super::Rules;
use crate::GameError;
use crate::state::{Core, Scope, Ticket};

/// Everyone shares one guess list; the first exact guess ends the round.
#[derive(Debug, Default)]
pub(crate) struct Cooperative {
    last_guesser: Option<PlayerId>,
}

impl Cooperative {
    pub fn restore(record: &ModeRecord) -> Self {
        Self {
            last_guesser: record.last_guesser,
        }
    }

    /// The player who made the most recent recorded guess.
    pub fn last_guesser(&self) -> Option<PlayerId> {
        self.last_guesser
    }
}

impl Rules for Cooperative {
    fn mode(&self) -> GameMode {
        GameMode::Cooperative
    }

    fn scope(&self, _player: PlayerId) -> Scope {
        Scope::Shared
    }

    fn commit(&mut self, core: &mut Core, guess: Guess, _ticket: &Ticket) -> Result<bool, GameError> {
        let solved = guess.is_exact();
        self.last_guesser = Some(guess.submitted_by);
        core.guesses.push(guess);
        if solved {
            core.finished = true;
            tracing::info!(session_id = %core.id, "cooperative round solved");
        }
        Ok(solved)
    }

    fn on_leave(&mut self, core: &mut Core, _player: PlayerId) {
        if core.players.is_empty() && !core.finished {
            core.finished = true;
            tracing::info!(session_id = %core.id, "last player left, cooperative round over");
        }
    }

    fn to_record(&self) -> ModeRecord {
        ModeRecord {
            last_guesser: self.last_guesser,
            ..ModeRecord::default()
        }
    }
}
