use std::collections::BTreeSet;

use wordforge_protocol::{CacheEntry, GameMode, Guess, ModeRecord, PlayerId};

use super::Rules;
use super::race::RaceState;
use crate::GameError;
use crate::state::{Core, Ticket};

/// A race where each word (and lemma) can be used by only one player.
#[derive(Debug, Default)]
pub(crate) struct ExclusiveWordRace {
    pub race: RaceState,
    used: BTreeSet<String>,
}

impl ExclusiveWordRace {
    pub fn restore(record: &ModeRecord, guesses: &[Guess]) -> Self {
        let mut used: BTreeSet<String> = record.used_words.iter().cloned().collect();
        for guess in guesses {
            used.extend(used_forms(guess));
        }
        Self {
            race: RaceState::restore(record),
            used,
        }
    }

    pub fn used_word_count(&self) -> usize {
        self.used.len()
    }

    fn is_used(&self, word: &str) -> bool {
        self.used.contains(word)
    }
}

/// The word and lemma a scored guess consumes.
fn used_forms(guess: &Guess) -> impl Iterator<Item = String> + '_ {
    std::iter::once(guess.word.clone())
        .chain(guess.lemma().map(str::to_owned))
        .filter(|word| !word.is_empty())
}

impl Rules for ExclusiveWordRace {
    fn mode(&self) -> GameMode {
        GameMode::ExclusiveWordRace
    }

    fn check_word(&self, _core: &Core, _player: PlayerId, word: &str) -> Result<(), GameError> {
        if self.is_used(word) {
            return Err(GameError::WordAlreadyUsed(word.to_owned()));
        }
        Ok(())
    }

    fn check_result(&self, _core: &Core, entry: &CacheEntry) -> Result<(), GameError> {
        if self.is_used(&entry.word) {
            return Err(GameError::WordAlreadyUsed(entry.word.clone()));
        }
        if let Some(lemma) = entry.evaluation.lemma() {
            if self.is_used(lemma) {
                return Err(GameError::WordAlreadyUsed(lemma.to_owned()));
            }
        }
        Ok(())
    }

    fn commit(&mut self, core: &mut Core, guess: Guess, ticket: &Ticket) -> Result<bool, GameError> {
        let forms: Vec<String> = used_forms(&guess).collect();
        let solved = self.race.commit(core, guess, ticket)?;
        self.used.extend(forms);
        Ok(solved)
    }

    fn accepts_tip(&self, entry: &CacheEntry) -> bool {
        !self.is_used(&entry.word) && !entry.evaluation.lemma().is_some_and(|l| self.is_used(l))
    }

    fn to_record(&self) -> ModeRecord {
        ModeRecord {
            used_words: self.used.iter().cloned().collect(),
            ..self.race.to_record()
        }
    }
}
