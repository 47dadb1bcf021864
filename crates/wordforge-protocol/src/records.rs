//! Guesses, cache entries, and the durable session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{GameMode, PlayerId, RoundId, SessionId};

/// Canonical form of a submitted word: trimmed and lower-cased.
///
/// Every cache key, duplicate check, and exclusivity check compares
/// normalized words, so "Casa " and "casa" are the same guess.
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// What the distance oracle said about a word.
///
/// A word is either scored (it has a distance, and usually a lemma) or
/// rejected with a message, never both.
///
/// `#[serde(tag = "status")]` produces internally tagged JSON:
///   `{ "status": "scored", "lemma": "casa", "distance": 120 }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Evaluation {
    /// The word is known; `distance` 0 is the hidden answer.
    Scored {
        #[serde(default)]
        lemma: Option<String>,
        distance: u32,
    },

    /// The oracle refused the word (unknown word, too short, ...).
    Rejected { message: String },
}

impl Evaluation {
    /// The distance, if the word was scored.
    pub fn distance(&self) -> Option<u32> {
        match self {
            Self::Scored { distance, .. } => Some(*distance),
            Self::Rejected { .. } => None,
        }
    }

    /// The lemma, if the word was scored and the oracle reported one.
    pub fn lemma(&self) -> Option<&str> {
        match self {
            Self::Scored { lemma, .. } => lemma.as_deref(),
            Self::Rejected { .. } => None,
        }
    }

    /// Returns `true` if the oracle scored the word.
    pub fn is_scored(&self) -> bool {
        matches!(self, Self::Scored { .. })
    }

    /// Returns `true` if this is the hidden answer.
    pub fn is_exact(&self) -> bool {
        self.distance() == Some(0)
    }
}

// ---------------------------------------------------------------------------
// CacheEntry
// ---------------------------------------------------------------------------

/// One cached oracle result for a `(round, word)` pair.
///
/// The round lives in the cache key, not in the entry. `word` is always
/// normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub word: String,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

impl CacheEntry {
    /// A scored entry. The word (and lemma) are normalized.
    pub fn scored(word: &str, lemma: Option<&str>, distance: u32) -> Self {
        Self {
            word: normalize_word(word),
            evaluation: Evaluation::Scored {
                lemma: lemma.map(normalize_word),
                distance,
            },
        }
    }

    /// A rejected entry carrying the oracle's message.
    pub fn rejected(word: &str, message: impl Into<String>) -> Self {
        Self {
            word: normalize_word(word),
            evaluation: Evaluation::Rejected {
                message: message.into(),
            },
        }
    }

    /// Combines a stored entry with a newer write for the same key.
    ///
    /// A scored entry never changes its distance; a later write may only
    /// fill in a lemma it was missing. A rejected entry is replaced by
    /// whatever comes next.
    pub fn merge(self, incoming: CacheEntry) -> CacheEntry {
        match (self.evaluation, incoming.evaluation) {
            (
                Evaluation::Scored { lemma, distance },
                Evaluation::Scored {
                    lemma: new_lemma, ..
                },
            ) => CacheEntry {
                word: self.word,
                evaluation: Evaluation::Scored {
                    lemma: lemma.or(new_lemma),
                    distance,
                },
            },
            (scored @ Evaluation::Scored { .. }, Evaluation::Rejected { .. }) => CacheEntry {
                word: self.word,
                evaluation: scored,
            },
            (Evaluation::Rejected { .. }, evaluation) => CacheEntry {
                word: self.word,
                evaluation,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Guess
// ---------------------------------------------------------------------------

/// One word a player submitted, together with its evaluation.
///
/// Guess histories are append-only: once recorded, a guess is never
/// changed or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guess {
    /// The normalized word. Empty when the guess is [`redacted`](Self::redacted).
    pub word: String,
    pub evaluation: Evaluation,
    pub submitted_by: PlayerId,
    /// Set on copies shown to other players in race modes.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

impl Guess {
    /// Builds a guess from a cache entry.
    pub fn from_entry(entry: &CacheEntry, submitted_by: PlayerId) -> Self {
        Self {
            word: entry.word.clone(),
            evaluation: entry.evaluation.clone(),
            submitted_by,
            hidden: false,
        }
    }

    pub fn distance(&self) -> Option<u32> {
        self.evaluation.distance()
    }

    pub fn lemma(&self) -> Option<&str> {
        self.evaluation.lemma()
    }

    pub fn is_exact(&self) -> bool {
        self.evaluation.is_exact()
    }

    /// Returns `true` if `normalized` is this guess's word or lemma.
    pub fn matches(&self, normalized: &str) -> bool {
        self.word == normalized || self.lemma() == Some(normalized)
    }

    /// A copy that keeps the distance but hides the word.
    pub fn redacted(&self) -> Guess {
        let evaluation = match &self.evaluation {
            Evaluation::Scored { distance, .. } => Evaluation::Scored {
                lemma: None,
                distance: *distance,
            },
            rejected => rejected.clone(),
        };
        Guess {
            word: String::new(),
            evaluation,
            submitted_by: self.submitted_by,
            hidden: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Completion records
// ---------------------------------------------------------------------------

/// A player reaching the answer in a competitive session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCompletion {
    pub player_id: PlayerId,
    /// The player's own guess count, including the winning guess.
    pub guess_count: u32,
    pub completed_at: DateTime<Utc>,
}

/// The single winner of a race session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub player_id: PlayerId,
    pub guess_count: u32,
    /// When the winning guess was submitted (not when it resolved).
    pub completed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Durable session record
// ---------------------------------------------------------------------------

/// Mode-specific state that is saved alongside a session.
///
/// Each mode uses only the fields it needs; the rest stay at their
/// defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeRecord {
    #[serde(default)]
    pub last_guesser: Option<PlayerId>,
    #[serde(default)]
    pub completions: Vec<PlayerCompletion>,
    #[serde(default)]
    pub winner: Option<WinnerRecord>,
    #[serde(default)]
    pub used_words: Vec<String>,
}

/// Everything needed to rebuild a session after it left memory.
///
/// `guesses` are in creation order across all players; replaying them in
/// that order rebuilds every player's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub round_id: RoundId,
    pub mode: GameMode,
    pub started: bool,
    pub finished: bool,
    pub allow_tips: bool,
    pub allow_give_up: bool,
    /// Members in join order; the first one is the host.
    pub players: Vec<PlayerId>,
    pub guesses: Vec<Guess>,
    #[serde(default)]
    pub mode_state: ModeRecord,
}
