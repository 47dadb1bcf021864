use wordforge_protocol::{GameMode, Guess, ModeRecord, PlayerCompletion, PlayerId};

use super::Rules;
use crate::GameError;
use crate::state::{Core, Scope, Ticket};

/// Independent guess lists; players complete one by one and are ranked.
///
/// The session itself never finishes while players remain.
#[derive(Debug, Default)]
pub(crate) struct Competitive {
    completions: Vec<PlayerCompletion>,
}

impl Competitive {
    pub fn restore(record: &ModeRecord) -> Self {
        Self {
            completions: record.completions.clone(),
        }
    }

    pub fn completion(&self, player: PlayerId) -> Option<&PlayerCompletion> {
        self.completions.iter().find(|c| c.player_id == player)
    }

    /// Completions, best first.
    pub fn leaderboard(&self) -> Vec<PlayerCompletion> {
        let mut ranked = self.completions.clone();
        rank_completions(&mut ranked);
        ranked
    }
}

/// Sorts by fewest guesses, then earliest completion.
pub(crate) fn rank_completions(completions: &mut [PlayerCompletion]) {
    completions.sort_by(|a, b| {
        a.guess_count
            .cmp(&b.guess_count)
            .then(a.completed_at.cmp(&b.completed_at))
    });
}

impl Rules for Competitive {
    fn mode(&self) -> GameMode {
        GameMode::Competitive
    }

    fn check_join(&self, core: &Core, player: PlayerId) -> Result<(), GameError> {
        self.check_active(core, player)
    }

    fn check_active(&self, core: &Core, player: PlayerId) -> Result<(), GameError> {
        match self.completion(player) {
            Some(_) => Err(GameError::AlreadyCompleted(player, core.id)),
            None => Ok(()),
        }
    }

    fn commit(&mut self, core: &mut Core, guess: Guess, ticket: &Ticket) -> Result<bool, GameError> {
        let player = guess.submitted_by;
        // Re-checked here: the lookup ran without the lock.
        self.check_active(core, player)?;

        let solved = guess.is_exact();
        core.guesses.push(guess);
        if solved {
            let guess_count = core.count(Scope::Player(player));
            self.completions.push(PlayerCompletion {
                player_id: player,
                guess_count,
                completed_at: ticket.submitted_at,
            });
            tracing::info!(session_id = %core.id, %player, guess_count, "player completed");
        }
        Ok(solved)
    }

    fn to_record(&self) -> ModeRecord {
        ModeRecord {
            completions: self.completions.clone(),
            ..ModeRecord::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn completion(player: u64, guess_count: u32, second: u32) -> PlayerCompletion {
        PlayerCompletion {
            player_id: PlayerId(player),
            guess_count,
            completed_at: Utc.with_ymd_and_hms(2027, 3, 1, 12, 0, second).unwrap(),
        }
    }

    #[test]
    fn test_rank_completions_by_count_then_time() {
        let mut completions = vec![completion(1, 5, 2), completion(2, 3, 1), completion(3, 3, 0)];

        rank_completions(&mut completions);

        let order: Vec<u64> = completions.iter().map(|c| c.player_id.0).collect();
        assert_eq!(order, [3, 2, 1]);
    }
}
