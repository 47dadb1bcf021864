//! Durable storage abstraction for Wordforge.
//!
//! Provides the [`Store`] trait that abstracts over where sessions and
//! cached oracle results are kept, plus two implementations.
//!
//! # Feature Flags
//!
//! - `sqlite` (default): [`SqliteStore`], backed by `rusqlite`

#![allow(async_fn_in_trait)]

mod error;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use std::future::Future;

use wordforge_protocol::{CacheEntry, RoundId, SessionId, SessionRecord};

/// Durable copy of sessions and of the per-round distance cache.
///
/// Implementations may be shared by many sessions at once, so every
/// method takes `&self`. Cache writes are upserts: two sessions racing to
/// insert the same `(round, word)` must both succeed, and a scored entry
/// must keep its distance (see [`CacheEntry::merge`]).
///
/// Words passed in are already normalized.
pub trait Store: Send + Sync + 'static {
    /// Writes (or overwrites) the durable copy of a session.
    ///
    /// Guesses are append-only; a store may skip guesses it already holds.
    fn save_session(
        &self,
        record: &SessionRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Reads a session back, guesses in creation order.
    ///
    /// Returns `Ok(None)` if no session with this id was ever saved.
    fn load_session(
        &self,
        id: SessionId,
    ) -> impl Future<Output = Result<Option<SessionRecord>, StoreError>> + Send;

    /// Inserts a cache entry, or merges it into the existing one.
    fn upsert_cache_entry(
        &self,
        round: RoundId,
        entry: &CacheEntry,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Point lookup by normalized word.
    fn find_cache_entry(
        &self,
        round: RoundId,
        word: &str,
    ) -> impl Future<Output = Result<Option<CacheEntry>, StoreError>> + Send;

    /// Finds any scored word at exactly `distance` for this round.
    fn find_cache_entry_by_distance(
        &self,
        round: RoundId,
        distance: u32,
    ) -> impl Future<Output = Result<Option<CacheEntry>, StoreError>> + Send;
}
