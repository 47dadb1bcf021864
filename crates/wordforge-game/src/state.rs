//! Mode-independent session state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use wordforge_protocol::{Guess, PlayerId, RoundId, SessionId};

use crate::GameError;

/// A submission that passed validation and is waiting on its lookup.
///
/// `seq` is handed out under the session lock, so it totally orders every
/// submission of a session. Races are decided by `seq`; `submitted_at` is
/// only recorded.
#[derive(Debug, Clone)]
pub(crate) struct Ticket {
    pub seq: u64,
    pub word: String,
    pub submitted_at: DateTime<Utc>,
}

/// Whose guesses a per-player question looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Every guess in the session (cooperative play).
    Shared,
    /// Only this player's own guesses.
    Player(PlayerId),
}

impl Scope {
    pub fn includes(self, guess: &Guess) -> bool {
        match self {
            Self::Shared => true,
            Self::Player(player) => guess.submitted_by == player,
        }
    }
}

/// The part of a session every mode shares.
pub(crate) struct Core {
    pub id: SessionId,
    pub round: RoundId,
    /// Join order; the first player is the host.
    pub players: Vec<PlayerId>,
    pub started: bool,
    pub finished: bool,
    pub allow_tips: bool,
    pub allow_give_up: bool,
    /// Recorded (scored) guesses of every player, in creation order.
    pub guesses: Vec<Guess>,
    /// At most one in-flight submission per player.
    pub pending: HashMap<PlayerId, Ticket>,
    next_seq: u64,
}

impl Core {
    pub fn new(id: SessionId, round: RoundId, allow_tips: bool, allow_give_up: bool) -> Self {
        Self {
            id,
            round,
            players: Vec::new(),
            started: false,
            finished: false,
            allow_tips,
            allow_give_up,
            guesses: Vec::new(),
            pending: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    pub fn ensure_member(&self, player: PlayerId) -> Result<(), GameError> {
        if self.is_member(player) {
            Ok(())
        } else {
            Err(GameError::NotAMember(player, self.id))
        }
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.players.first().copied()
    }

    pub fn history(&self, scope: Scope) -> impl Iterator<Item = &Guess> + '_ {
        self.guesses.iter().filter(move |guess| scope.includes(guess))
    }

    pub fn count(&self, scope: Scope) -> u32 {
        u32::try_from(self.history(scope).count()).unwrap_or(u32::MAX)
    }

    /// Closest guess in scope; the earliest wins a tie.
    pub fn best(&self, scope: Scope) -> Option<&Guess> {
        self.history(scope)
            .filter(|guess| guess.distance().is_some())
            .min_by_key(|guess| guess.distance())
    }

    /// An earlier guess in scope whose word or lemma is any of `words`.
    pub fn find_repeat(&self, scope: Scope, words: &[&str]) -> Option<&Guess> {
        self.history(scope)
            .find(|guess| words.iter().any(|word| guess.matches(word)))
    }

    /// Registers an in-flight submission for `player`.
    pub fn issue_ticket(&mut self, player: PlayerId, word: &str) -> Ticket {
        self.next_seq += 1;
        let ticket = Ticket {
            seq: self.next_seq,
            word: word.to_owned(),
            submitted_at: Utc::now(),
        };
        self.pending.insert(player, ticket.clone());
        ticket
    }

    /// Removes `player`'s pending entry if it is still the one for `seq`.
    pub fn release_ticket(&mut self, player: PlayerId, seq: u64) {
        if self.pending.get(&player).is_some_and(|t| t.seq == seq) {
            self.pending.remove(&player);
        }
    }

    /// Whether another submission older than `seq` is still in flight.
    pub fn has_earlier_pending(&self, seq: u64) -> bool {
        self.pending.values().any(|ticket| ticket.seq < seq)
    }

    /// Drops a member and anything they had in flight.
    ///
    /// Returns `false` if they weren't a member.
    pub fn remove_player(&mut self, player: PlayerId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| *p != player);
        self.pending.remove(&player);
        self.players.len() != before
    }
}

#[cfg(test)]
mod tests {
    use wordforge_protocol::CacheEntry;

    use super::*;

    fn core_with_guesses() -> Core {
        let mut core = Core::new(SessionId(1), RoundId(1), true, true);
        core.players = vec![PlayerId(1), PlayerId(2)];
        core.guesses = vec![
            Guess::from_entry(&CacheEntry::scored("mar", Some("mar"), 800), PlayerId(1)),
            Guess::from_entry(&CacheEntry::scored("casas", Some("casa"), 200), PlayerId(2)),
            Guess::from_entry(&CacheEntry::scored("lares", Some("lar"), 200), PlayerId(1)),
        ];
        core
    }

    #[test]
    fn test_best_prefers_earliest_on_tie() {
        let core = core_with_guesses();
        assert_eq!(core.best(Scope::Shared).unwrap().word, "casas");
        assert_eq!(core.best(Scope::Player(PlayerId(1))).unwrap().word, "lares");
    }

    #[test]
    fn test_count_by_scope() {
        let core = core_with_guesses();
        assert_eq!(core.count(Scope::Shared), 3);
        assert_eq!(core.count(Scope::Player(PlayerId(2))), 1);
        assert_eq!(core.count(Scope::Player(PlayerId(9))), 0);
    }

    #[test]
    fn test_find_repeat_matches_lemma() {
        let core = core_with_guesses();
        assert!(core.find_repeat(Scope::Shared, &["casa"]).is_some());
        assert!(core.find_repeat(Scope::Player(PlayerId(1)), &["casa"]).is_none());
    }

    #[test]
    fn test_tickets_are_ordered_and_released_by_seq() {
        let mut core = core_with_guesses();
        let first = core.issue_ticket(PlayerId(1), "sol");
        let second = core.issue_ticket(PlayerId(2), "lua");

        assert!(first.seq < second.seq);
        assert!(core.has_earlier_pending(second.seq));
        assert!(!core.has_earlier_pending(first.seq));

        core.release_ticket(PlayerId(1), second.seq);
        assert!(core.pending.contains_key(&PlayerId(1)));
        core.release_ticket(PlayerId(1), first.seq);
        assert!(!core.has_earlier_pending(second.seq));
    }

    #[test]
    fn test_remove_player_drops_pending() {
        let mut core = core_with_guesses();
        core.issue_ticket(PlayerId(2), "lua");

        assert!(core.remove_player(PlayerId(2)));
        assert!(!core.remove_player(PlayerId(2)));
        assert!(core.pending.is_empty());
        assert_eq!(core.host(), Some(PlayerId(1)));
    }
}
