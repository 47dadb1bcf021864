//! The two-tier distance cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use wordforge_protocol::{CacheEntry, RoundId, normalize_word};
use wordforge_store::Store;

/// In-process map in front of the durable store.
///
/// A round's distances never change, so every answer the oracle gives is
/// worth keeping forever and sharing with every session that plays the
/// same round, including rejections (an invalid word stays invalid).
///
/// ```text
/// get(round, word)
///   ├── memory hit ──────────────────────────→ entry
///   └── miss → store.find_cache_entry
///                ├── found → copy into memory → entry
///                └── not found / store error → None
/// ```
///
/// Store failures are logged and treated as misses: the caller falls back
/// to the oracle, and gameplay never fails because the database hiccupped.
pub struct DistanceCache<S> {
    memory: RwLock<HashMap<(RoundId, String), CacheEntry>>,
    store: Arc<S>,
}

impl<S: Store> DistanceCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// The durable tier.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Number of entries in the in-memory tier.
    pub fn memory_len(&self) -> usize {
        self.memory.read().len()
    }

    /// Looks up a word, memory first, then the store.
    pub async fn get(&self, round: RoundId, word: &str) -> Option<CacheEntry> {
        let word = normalize_word(word);
        let key = (round, word);

        let hit = self.memory.read().get(&key).cloned();
        if hit.is_some() {
            tracing::debug!(round = %round, word = %key.1, "cache hit (memory)");
            return hit;
        }

        match self.store.find_cache_entry(round, &key.1).await {
            Ok(Some(entry)) => {
                tracing::debug!(round = %round, word = %key.1, "cache hit (store)");
                self.remember(round, entry.clone());
                Some(entry)
            }
            Ok(None) => {
                tracing::debug!(round = %round, word = %key.1, "cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(round = %round, word = %key.1, error = %e, "cache store read failed");
                None
            }
        }
    }

    /// Records an oracle answer in both tiers.
    ///
    /// The memory tier is written first and unconditionally, so even if the
    /// store write fails this process won't ask the oracle again.
    pub async fn put(&self, round: RoundId, entry: CacheEntry) {
        let entry = CacheEntry {
            word: normalize_word(&entry.word),
            ..entry
        };
        self.remember(round, entry.clone());

        if let Err(e) = self.store.upsert_cache_entry(round, &entry).await {
            tracing::warn!(round = %round, word = %entry.word, error = %e, "cache store write failed");
        }
    }

    /// Finds any known word at exactly `distance`.
    ///
    /// Only the store is consulted: it is the one tier that is complete
    /// across processes and indexed by distance. A hit is copied into the
    /// memory tier.
    pub async fn get_by_distance(&self, round: RoundId, distance: u32) -> Option<CacheEntry> {
        match self.store.find_cache_entry_by_distance(round, distance).await {
            Ok(Some(entry)) => {
                tracing::debug!(round = %round, distance, word = %entry.word, "cache hit by distance");
                self.remember(round, entry.clone());
                Some(entry)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(round = %round, distance, error = %e, "cache store lookup by distance failed");
                None
            }
        }
    }

    fn remember(&self, round: RoundId, entry: CacheEntry) {
        let mut memory = self.memory.write();
        let key = (round, entry.word.clone());
        let merged = match memory.remove(&key) {
            Some(existing) => existing.merge(entry),
            None => entry,
        };
        memory.insert(key, merged);
    }
}
