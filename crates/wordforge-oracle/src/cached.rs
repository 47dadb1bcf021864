//! Cache-first access to the oracle.

use std::sync::Arc;

use wordforge_protocol::{CacheEntry, RoundId, normalize_word};
use wordforge_store::Store;

use crate::{DistanceCache, DistanceOracle, OracleError};

/// A [`DistanceOracle`] behind a [`DistanceCache`].
///
/// Every lookup the game needs goes through here:
///
/// - [`evaluate`](Self::evaluate): score a submitted word
/// - [`tip_at`](Self::tip_at): find a word at a target distance
/// - [`answer`](Self::answer): reveal the answer (distance 0)
///
/// The oracle is only called on a cache miss, and whatever it says is
/// written back so no other session playing the same round has to ask.
pub struct CachedOracle<O, S> {
    oracle: O,
    cache: DistanceCache<S>,
}

impl<O: DistanceOracle, S: Store> CachedOracle<O, S> {
    pub fn new(oracle: O, store: Arc<S>) -> Self {
        Self {
            oracle,
            cache: DistanceCache::new(store),
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn cache(&self) -> &DistanceCache<S> {
        &self.cache
    }

    /// Scores a word for `round`.
    ///
    /// # Returns
    /// - `Ok(entry)` with a scored evaluation
    /// - `Ok(entry)` with a rejected evaluation: the oracle refused the
    ///   word, now or on an earlier call; the rejection is cached
    /// - `Err(OracleError::Unavailable)`: nothing was cached
    pub async fn evaluate(&self, round: RoundId, word: &str) -> Result<CacheEntry, OracleError> {
        let word = normalize_word(word);
        if let Some(entry) = self.cache.get(round, &word).await {
            return Ok(entry);
        }

        let entry = match self.oracle.play(round, &word).await {
            // Key by the submitted word, even if the oracle spells it differently.
            Ok(scored) => CacheEntry {
                word: word.clone(),
                evaluation: scored.evaluation,
            },
            Err(OracleError::Rejected(message)) => CacheEntry::rejected(&word, message),
            Err(e @ OracleError::Unavailable(_)) => {
                tracing::warn!(round = %round, %word, error = %e, "oracle unavailable");
                return Err(e);
            }
        };

        self.cache.put(round, entry.clone()).await;
        Ok(entry)
    }

    /// Finds a word at exactly `distance`, preferring one already cached.
    pub async fn tip_at(&self, round: RoundId, distance: u32) -> Result<CacheEntry, OracleError> {
        if let Some(entry) = self.cache.get_by_distance(round, distance).await {
            return Ok(entry);
        }

        let entry = self.oracle.tip(round, distance).await?;
        self.cache.put(round, entry.clone()).await;
        Ok(entry)
    }

    /// Reveals the round's answer.
    pub async fn answer(&self, round: RoundId) -> Result<CacheEntry, OracleError> {
        if let Some(entry) = self.cache.get_by_distance(round, 0).await {
            return Ok(entry);
        }

        let revealed = self.oracle.give_up(round).await?;
        let entry = CacheEntry::scored(&revealed.word, revealed.evaluation.lemma(), 0);
        self.cache.put(round, entry.clone()).await;
        Ok(entry)
    }
}
