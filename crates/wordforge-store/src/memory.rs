//! In-process [`Store`] implementation.

use std::collections::HashMap;
use std::future::{Future, ready};

use parking_lot::RwLock;
use wordforge_protocol::{CacheEntry, RoundId, SessionId, SessionRecord};

use crate::{Store, StoreError};

/// A [`Store`] that keeps everything in hash maps.
///
/// Nothing survives a restart. Useful for tests and for single-process
/// deployments that only need eviction and lazy restore, not durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
    cache: RwLock<HashMap<(RoundId, String), CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saved sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Number of cached `(round, word)` entries.
    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }
}

impl Store for MemoryStore {
    fn save_session(
        &self,
        record: &SessionRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.sessions.write().insert(record.id, record.clone());
        ready(Ok(()))
    }

    fn load_session(
        &self,
        id: SessionId,
    ) -> impl Future<Output = Result<Option<SessionRecord>, StoreError>> + Send {
        ready(Ok(self.sessions.read().get(&id).cloned()))
    }

    fn upsert_cache_entry(
        &self,
        round: RoundId,
        entry: &CacheEntry,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let mut cache = self.cache.write();
        let key = (round, entry.word.clone());
        let merged = match cache.remove(&key) {
            Some(existing) => existing.merge(entry.clone()),
            None => entry.clone(),
        };
        cache.insert(key, merged);
        ready(Ok(()))
    }

    fn find_cache_entry(
        &self,
        round: RoundId,
        word: &str,
    ) -> impl Future<Output = Result<Option<CacheEntry>, StoreError>> + Send {
        ready(Ok(self.cache.read().get(&(round, word.to_owned())).cloned()))
    }

    fn find_cache_entry_by_distance(
        &self,
        round: RoundId,
        distance: u32,
    ) -> impl Future<Output = Result<Option<CacheEntry>, StoreError>> + Send {
        // Lowest word wins so repeated lookups are stable.
        let found = self
            .cache
            .read()
            .iter()
            .filter(|((r, _), entry)| {
                *r == round && entry.evaluation.distance() == Some(distance)
            })
            .map(|(_, entry)| entry)
            .min_by(|a, b| a.word.cmp(&b.word))
            .cloned();
        ready(Ok(found))
    }
}

#[cfg(test)]
mod tests {
    use wordforge_protocol::{GameMode, ModeRecord, PlayerId};

    use super::*;

    fn round() -> RoundId {
        RoundId(1830)
    }

    #[tokio::test]
    async fn test_upsert_then_find_returns_entry() {
        let store = MemoryStore::new();
        store
            .upsert_cache_entry(round(), &CacheEntry::scored("casa", Some("casa"), 120))
            .await
            .unwrap();

        let found = store.find_cache_entry(round(), "casa").await.unwrap();

        assert_eq!(found.unwrap().evaluation.distance(), Some(120));
    }

    #[tokio::test]
    async fn test_upsert_keeps_first_distance() {
        let store = MemoryStore::new();
        store
            .upsert_cache_entry(round(), &CacheEntry::scored("casa", None, 120))
            .await
            .unwrap();
        store
            .upsert_cache_entry(round(), &CacheEntry::scored("casa", Some("casa"), 7))
            .await
            .unwrap();

        let found = store.find_cache_entry(round(), "casa").await.unwrap().unwrap();

        assert_eq!(found.evaluation.distance(), Some(120));
        assert_eq!(found.evaluation.lemma(), Some("casa"));
        assert_eq!(store.cache_len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_distance_is_scoped_to_round() {
        let store = MemoryStore::new();
        store
            .upsert_cache_entry(RoundId(1), &CacheEntry::scored("lar", None, 0))
            .await
            .unwrap();

        assert!(store.find_cache_entry_by_distance(RoundId(2), 0).await.unwrap().is_none());
        let answer = store.find_cache_entry_by_distance(RoundId(1), 0).await.unwrap();
        assert_eq!(answer.unwrap().word, "lar");
    }

    #[tokio::test]
    async fn test_find_by_distance_skips_rejected_entries() {
        let store = MemoryStore::new();
        store
            .upsert_cache_entry(round(), &CacheEntry::rejected("xyz", "unknown"))
            .await
            .unwrap();

        assert!(store.find_cache_entry_by_distance(round(), 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_session() {
        let store = MemoryStore::new();
        let record = SessionRecord {
            id: SessionId(9),
            round_id: round(),
            mode: GameMode::Competitive,
            started: true,
            finished: false,
            allow_tips: true,
            allow_give_up: true,
            players: vec![PlayerId(1)],
            guesses: Vec::new(),
            mode_state: ModeRecord::default(),
        };

        store.save_session(&record).await.unwrap();

        assert_eq!(store.load_session(SessionId(9)).await.unwrap(), Some(record));
        assert_eq!(store.load_session(SessionId(10)).await.unwrap(), None);
        assert_eq!(store.session_count(), 1);
    }
}
