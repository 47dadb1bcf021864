//! Session persistence scheduling for Wordforge.
//!
//! Sessions change on every join, leave, and guess. Writing each change to
//! the store immediately would put a database round-trip on the gameplay
//! path, so saves are scheduled instead:
//!
//! - **Debounce**: every mutation resets a per-session timer; the save
//!   runs once the session has been quiet for
//!   [`PersistConfig::inactivity_delay`].
//! - **Threshold**: under continuous activity the timer never fires, so
//!   every [`PersistConfig::force_save_every`] guesses the caller saves
//!   right away. This bounds how much a crash can lose.
//! - **Forced**: when a session empties or the process shuts down, the
//!   caller cancels the timer and awaits the save directly.
//!
//! Failed saves are retried with exponential backoff and logged; they never
//! surface to players.
//!
//! # Integration
//!
//! ```ignore
//! let session = session.clone();
//! scheduler.schedule_inactivity_save(id, Arc::new(move || {
//!     let session = session.clone();
//!     Box::pin(async move { session.save().await })
//! }));
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use wordforge_protocol::SessionId;
use wordforge_store::StoreError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the persistence scheduler.
///
/// Durations are written as milliseconds in config files:
///
/// ```json
/// { "inactivity_delay": 5000, "force_save_every": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Quiet period after the last mutation before a debounced save runs.
    #[serde(with = "millis")]
    pub inactivity_delay: Duration,
    /// Save immediately every N guesses. Default: 10.
    pub force_save_every: u32,
    /// Extra attempts after a failed save. Default: 3.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    #[serde(with = "millis")]
    pub retry_backoff: Duration,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            inactivity_delay: Duration::from_secs(5),
            force_save_every: 10,
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl PersistConfig {
    /// Upper bound on retries so a dead store can't keep a task alive forever.
    pub const MAX_RETRIES: u32 = 10;

    /// Fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`PersistenceScheduler::new`]. Rules:
    /// - `force_save_every` of 0 becomes 1 (save on every guess).
    /// - `max_retries` capped to [`Self::MAX_RETRIES`].
    pub fn validated(mut self) -> Self {
        if self.force_save_every == 0 {
            warn!("force_save_every is 0, saving on every guess");
            self.force_save_every = 1;
        }
        if self.max_retries > Self::MAX_RETRIES {
            warn!(
                retries = self.max_retries,
                max = Self::MAX_RETRIES,
                "max_retries exceeds maximum, clamping"
            );
            self.max_retries = Self::MAX_RETRIES;
        }
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// Save callbacks
// ---------------------------------------------------------------------------

/// The future a save callback returns.
pub type SaveFuture = BoxFuture<'static, Result<(), StoreError>>;

/// A save callback.
///
/// Called once per attempt, so it must build a fresh future each time and
/// snapshot the session when the future runs, not when the callback was
/// registered.
pub type SaveFn = Arc<dyn Fn() -> SaveFuture + Send + Sync>;

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Debounces and forces session saves.
///
/// Cheap to clone; all clones share the same timers and counters. Timers
/// are Tokio tasks, so [`schedule_inactivity_save`](Self::schedule_inactivity_save)
/// must be called from inside a runtime.
#[derive(Clone)]
pub struct PersistenceScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    config: PersistConfig,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    timers: HashMap<SessionId, Timer>,
    guess_counts: HashMap<SessionId, u32>,
    next_generation: u64,
}

/// A pending debounced save.
///
/// `generation` tells a firing timer whether it is still the current one
/// for its session, so it only removes its own map entry.
struct Timer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl PersistenceScheduler {
    pub fn new(config: PersistConfig) -> Self {
        let config = config.validated();
        debug!(
            delay_ms = config.inactivity_delay.as_millis() as u64,
            force_save_every = config.force_save_every,
            max_retries = config.max_retries,
            "persistence scheduler created"
        );
        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn config(&self) -> &PersistConfig {
        &self.inner.config
    }

    /// (Re)starts the inactivity timer for a session.
    ///
    /// Any timer already pending for the session is cancelled, so only the
    /// last of a burst of mutations leads to a save. Once the timer fires
    /// the save is detached from the timer slot: a later reschedule starts
    /// a new timer but does not cancel a save already in flight.
    pub fn schedule_inactivity_save(&self, session_id: SessionId, save: SaveFn) {
        let inner = Arc::clone(&self.inner);
        let delay = self.inner.config.inactivity_delay;

        let mut state = self.inner.state.lock();
        state.next_generation += 1;
        let generation = state.next_generation;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.release_timer(session_id, generation);
            debug!(%session_id, "inactivity timer fired");
            // Failures are logged inside; nobody is waiting on this task.
            let _ = inner.save_with_retry(session_id, &save).await;
        });

        if let Some(previous) = state.timers.insert(session_id, Timer { generation, handle }) {
            previous.handle.abort();
            debug!(%session_id, "inactivity timer reset");
        }
    }

    /// Counts one guess and reports whether it crossed the save threshold.
    ///
    /// Returns `true` on every `force_save_every`-th call for a session.
    pub fn should_force_save_on_guess_count(&self, session_id: SessionId) -> bool {
        let every = self.inner.config.force_save_every;
        let mut state = self.inner.state.lock();
        let count = state.guess_counts.entry(session_id).or_insert(0);
        *count += 1;
        *count % every == 0
    }

    /// Cancels the pending timer, clears counters, and awaits the save.
    ///
    /// # Errors
    /// Returns the last store error if every attempt failed.
    pub async fn force_save_and_cleanup(
        &self,
        session_id: SessionId,
        save: SaveFn,
    ) -> Result<(), StoreError> {
        self.cancel(session_id);
        self.inner.save_with_retry(session_id, &save).await
    }

    /// Drops the timer and counter for a session without saving.
    pub fn cancel(&self, session_id: SessionId) {
        let mut state = self.inner.state.lock();
        if let Some(timer) = state.timers.remove(&session_id) {
            timer.handle.abort();
        }
        state.guess_counts.remove(&session_id);
    }

    /// Whether a debounced save is waiting for this session.
    pub fn is_pending(&self, session_id: SessionId) -> bool {
        self.inner.state.lock().timers.contains_key(&session_id)
    }

    /// Number of sessions with a debounced save waiting.
    pub fn pending_count(&self) -> usize {
        self.inner.state.lock().timers.len()
    }
}

impl Inner {
    fn release_timer(&self, session_id: SessionId, generation: u64) {
        let mut state = self.state.lock();
        if state
            .timers
            .get(&session_id)
            .is_some_and(|timer| timer.generation == generation)
        {
            state.timers.remove(&session_id);
        }
    }

    async fn save_with_retry(&self, session_id: SessionId, save: &SaveFn) -> Result<(), StoreError> {
        let mut backoff = self.config.retry_backoff;
        let mut attempt = 0;
        loop {
            match save().await {
                Ok(()) => {
                    debug!(%session_id, attempt, "session saved");
                    return Ok(());
                }
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(%session_id, attempt, error = %e, "session save failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => {
                    error!(%session_id, attempts = attempt + 1, error = %e, "session save failed, giving up");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_zero_threshold_becomes_one() {
        let cfg = PersistConfig {
            force_save_every: 0,
            ..PersistConfig::default()
        }
        .validated();
        assert_eq!(cfg.force_save_every, 1);
    }

    #[test]
    fn test_validated_clamps_retries() {
        let cfg = PersistConfig {
            max_retries: 1_000,
            ..PersistConfig::default()
        }
        .validated();
        assert_eq!(cfg.max_retries, PersistConfig::MAX_RETRIES);
    }

    #[test]
    fn test_config_reads_durations_as_millis() {
        let cfg: PersistConfig =
            serde_json::from_str(r#"{ "inactivity_delay": 250, "max_retries": 1 }"#).unwrap();
        assert_eq!(cfg.inactivity_delay, Duration::from_millis(250));
        assert_eq!(cfg.max_retries, 1);
        assert_eq!(cfg.force_save_every, 10);
    }
}
