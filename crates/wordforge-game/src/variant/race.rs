use wordforge_protocol::{GameMode, Guess, ModeRecord, WinnerRecord};

use super::Rules;
use crate::GameError;
use crate::state::{Core, Scope, Ticket};

/// Winner bookkeeping shared by both race modes.
///
/// The winner is set at most once, and setting it is what finishes the
/// session.
#[derive(Debug, Default)]
pub(crate) struct RaceState {
    winner: Option<WinnerRecord>,
}

impl RaceState {
    pub fn restore(record: &ModeRecord) -> Self {
        Self {
            winner: record.winner.clone(),
        }
    }

    pub fn winner(&self) -> Option<&WinnerRecord> {
        self.winner.as_ref()
    }

    /// Records `guess`, or rejects it if it can't fairly claim the win.
    ///
    /// Runs under the session lock with the submitter's own ticket already
    /// released. An exact guess only wins if no older submission is still
    /// in flight: that one might be exact too, and it came first.
    pub fn commit(&mut self, core: &mut Core, guess: Guess, ticket: &Ticket) -> Result<bool, GameError> {
        if self.winner.is_some() {
            return Err(GameError::RaceLost(core.id));
        }

        if !guess.is_exact() {
            core.guesses.push(guess);
            return Ok(false);
        }

        if core.has_earlier_pending(ticket.seq) {
            tracing::info!(
                session_id = %core.id,
                player = %guess.submitted_by,
                seq = ticket.seq,
                "exact guess yields to an older submission"
            );
            return Err(GameError::RaceLost(core.id));
        }

        let player = guess.submitted_by;
        core.guesses.push(guess);
        let guess_count = core.count(Scope::Player(player));
        self.winner = Some(WinnerRecord {
            player_id: player,
            guess_count,
            completed_at: ticket.submitted_at,
        });
        core.finished = true;
        tracing::info!(session_id = %core.id, %player, guess_count, "race won");
        Ok(true)
    }

    pub fn to_record(&self) -> ModeRecord {
        ModeRecord {
            winner: self.winner.clone(),
            ..ModeRecord::default()
        }
    }
}

/// First correct guess wins; needs an explicit start.
#[derive(Debug, Default)]
pub(crate) struct RaceToAnswer {
    pub race: RaceState,
}

impl RaceToAnswer {
    pub fn restore(record: &ModeRecord) -> Self {
        Self {
            race: RaceState::restore(record),
        }
    }
}

impl Rules for RaceToAnswer {
    fn mode(&self) -> GameMode {
        GameMode::RaceToAnswer
    }

    fn commit(&mut self, core: &mut Core, guess: Guess, ticket: &Ticket) -> Result<bool, GameError> {
        self.race.commit(core, guess, ticket)
    }

    fn to_record(&self) -> ModeRecord {
        self.race.to_record()
    }
}

#[cfg(test)]
mod tests {
    use wordforge_protocol::{CacheEntry, PlayerId, RoundId, SessionId};

    use super::*;

    fn started_core() -> Core {
        let mut core = Core::new(SessionId(5), RoundId(1), false, true);
        core.players = vec![PlayerId(1), PlayerId(2)];
        core.started = true;
        core
    }

    fn exact(player: u64) -> Guess {
        Guess::from_entry(&CacheEntry::scored("lar", Some("lar"), 0), PlayerId(player))
    }

    #[test]
    fn test_exact_guess_without_rivals_wins() {
        let mut core = started_core();
        let mut race = RaceState::default();
        let ticket = core.issue_ticket(PlayerId(1), "lar");
        core.release_ticket(PlayerId(1), ticket.seq);

        assert!(race.commit(&mut core, exact(1), &ticket).unwrap());
        assert!(core.finished);
        assert_eq!(race.winner().unwrap().player_id, PlayerId(1));
        assert_eq!(race.winner().unwrap().guess_count, 1);
    }

    #[test]
    fn test_exact_guess_yields_to_older_pending() {
        let mut core = started_core();
        let mut race = RaceState::default();
        let _older = core.issue_ticket(PlayerId(1), "lar");
        let newer = core.issue_ticket(PlayerId(2), "lar");
        core.release_ticket(PlayerId(2), newer.seq);

        let result = race.commit(&mut core, exact(2), &newer);

        assert!(matches!(result, Err(GameError::RaceLost(_))));
        assert!(core.guesses.is_empty());
        assert!(!core.finished);
    }

    #[test]
    fn test_second_winner_is_rejected() {
        let mut core = started_core();
        let mut race = RaceState::default();
        let first = core.issue_ticket(PlayerId(1), "lar");
        core.release_ticket(PlayerId(1), first.seq);
        race.commit(&mut core, exact(1), &first).unwrap();

        let second = core.issue_ticket(PlayerId(2), "lar");
        core.release_ticket(PlayerId(2), second.seq);
        let result = race.commit(&mut core, exact(2), &second);

        assert!(matches!(result, Err(GameError::RaceLost(_))));
        assert_eq!(race.winner().unwrap().player_id, PlayerId(1));
        assert_eq!(core.guesses.len(), 1);
    }
}
