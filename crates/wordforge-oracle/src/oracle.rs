//! The contract for the external word-distance service.
//!
//! Wordforge never computes semantic distances itself. The service that
//! does (a remote API, a local embedding model, a fixture table in tests)
//! is plugged in through the [`DistanceOracle`] trait, and the rest of the
//! engine only ever talks to it through a
//! [`CachedOracle`](crate::CachedOracle).

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use wordforge_protocol::{CacheEntry, RoundId, normalize_word};

use crate::OracleError;

/// Scores words against a round's hidden answer.
///
/// # Trait bounds
///
/// - `Send + Sync` → one oracle is shared by every session, and guesses
///   from different sessions may be evaluated on different threads.
/// - `'static` → it lives as long as the registry that owns it.
///
/// Implementations are addressed per round; anything else the service
/// needs (locale, API key, base URL) belongs to the implementing type.
///
/// # Example
///
/// ```rust
/// use wordforge_oracle::{DistanceOracle, OracleError};
/// use wordforge_protocol::{CacheEntry, RoundId};
///
/// /// Every round's answer is "lar"; everything else is far away.
/// struct OneWordOracle;
///
/// impl DistanceOracle for OneWordOracle {
///     async fn play(&self, _round: RoundId, word: &str) -> Result<CacheEntry, OracleError> {
///         let distance = if word == "lar" { 0 } else { 5000 };
///         Ok(CacheEntry::scored(word, Some(word), distance))
///     }
///
///     async fn tip(&self, _round: RoundId, _distance: u32) -> Result<CacheEntry, OracleError> {
///         Err(OracleError::Rejected("no tips here".into()))
///     }
///
///     async fn give_up(&self, _round: RoundId) -> Result<CacheEntry, OracleError> {
///         Ok(CacheEntry::scored("lar", Some("lar"), 0))
///     }
/// }
/// ```
pub trait DistanceOracle: Send + Sync + 'static {
    /// Scores one normalized word.
    ///
    /// # Returns
    /// - `Ok(entry)`: a scored entry (distance 0 is the answer)
    /// - `Err(OracleError::Rejected)`: the word is invalid for this round;
    ///   the caller caches the rejection
    /// - `Err(OracleError::Unavailable)`: try again later
    fn play(
        &self,
        round: RoundId,
        word: &str,
    ) -> impl Future<Output = Result<CacheEntry, OracleError>> + Send;

    /// Returns some word whose distance is exactly `distance`.
    fn tip(
        &self,
        round: RoundId,
        distance: u32,
    ) -> impl Future<Output = Result<CacheEntry, OracleError>> + Send;

    /// Reveals the round's answer.
    fn give_up(
        &self,
        round: RoundId,
    ) -> impl Future<Output = Result<CacheEntry, OracleError>> + Send;
}

// ---------------------------------------------------------------------------
// StaticOracle
// ---------------------------------------------------------------------------

/// An oracle backed by a fixed table of words.
///
/// Handy for local play, demos, and tests. It counts every call so tests
/// can assert that the cache kept a lookup away from the oracle.
///
/// ```rust
/// use wordforge_oracle::StaticOracle;
/// use wordforge_protocol::RoundId;
///
/// let oracle = StaticOracle::new()
///     .with_word(RoundId(1830), "lar", None, 0)
///     .with_word(RoundId(1830), "casa", Some("casa"), 200);
/// assert_eq!(oracle.calls(), 0);
/// ```
#[derive(Debug, Default)]
pub struct StaticOracle {
    rounds: HashMap<RoundId, HashMap<String, CacheEntry>>,
    calls: AtomicUsize,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scored word to a round's table.
    pub fn with_word(
        mut self,
        round: RoundId,
        word: &str,
        lemma: Option<&str>,
        distance: u32,
    ) -> Self {
        let entry = CacheEntry::scored(word, lemma, distance);
        self.rounds
            .entry(round)
            .or_default()
            .insert(entry.word.clone(), entry);
        self
    }

    /// How many times any oracle method has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn table(&self, round: RoundId) -> Result<&HashMap<String, CacheEntry>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rounds
            .get(&round)
            .ok_or_else(|| OracleError::Unavailable(format!("round {round} is not loaded")))
    }

    /// Lowest word at exactly `distance`, so answers are deterministic.
    fn word_at(
        table: &HashMap<String, CacheEntry>,
        distance: u32,
    ) -> Option<&CacheEntry> {
        table
            .values()
            .filter(|entry| entry.evaluation.distance() == Some(distance))
            .min_by(|a, b| a.word.cmp(&b.word))
    }
}

impl DistanceOracle for StaticOracle {
    async fn play(&self, round: RoundId, word: &str) -> Result<CacheEntry, OracleError> {
        let word = normalize_word(word);
        self.table(round)?
            .get(&word)
            .cloned()
            .ok_or_else(|| OracleError::Rejected(format!("unknown word `{word}`")))
    }

    async fn tip(&self, round: RoundId, distance: u32) -> Result<CacheEntry, OracleError> {
        Self::word_at(self.table(round)?, distance)
            .cloned()
            .ok_or_else(|| OracleError::Rejected(format!("no word at distance {distance}")))
    }

    async fn give_up(&self, round: RoundId) -> Result<CacheEntry, OracleError> {
        Self::word_at(self.table(round)?, 0)
            .cloned()
            .ok_or_else(|| OracleError::Unavailable(format!("round {round} has no answer")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle() -> StaticOracle {
        StaticOracle::new()
            .with_word(RoundId(1), "lar", Some("lar"), 0)
            .with_word(RoundId(1), "Casas", Some("casa"), 200)
    }

    #[tokio::test]
    async fn test_play_normalizes_and_scores() {
        let entry = oracle().play(RoundId(1), " CASAS ").await.unwrap();
        assert_eq!(entry, CacheEntry::scored("casas", Some("casa"), 200));
    }

    #[tokio::test]
    async fn test_play_unknown_word_is_rejected() {
        let result = oracle().play(RoundId(1), "xyzzy").await;
        assert!(matches!(result, Err(OracleError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_play_unknown_round_is_unavailable() {
        let result = oracle().play(RoundId(2), "lar").await;
        assert!(matches!(result, Err(OracleError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_give_up_returns_answer_and_counts_calls() {
        let oracle = oracle();
        let answer = oracle.give_up(RoundId(1)).await.unwrap();
        let tip = oracle.tip(RoundId(1), 200).await.unwrap();

        assert_eq!(answer.word, "lar");
        assert_eq!(tip.word, "casas");
        assert_eq!(oracle.calls(), 2);
    }
}
