//! Session registry: creates, tracks, restores, and evicts sessions.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use wordforge_oracle::{CachedOracle, DistanceOracle};
use wordforge_persist::{PersistConfig, PersistenceScheduler};
use wordforge_protocol::{GameMode, Guess, PlayerId, SessionId};
use wordforge_store::Store;

use crate::session::GameContext;
use crate::{
    GameConfig, GameError, GameSession, GiveUp, GuessOutcome, RoundSelector, SnowflakeGenerator,
    Tip,
};

/// In-memory tables, always updated together under one lock.
struct Tables<O, S> {
    /// Live sessions, keyed by id.
    sessions: HashMap<SessionId, GameSession<O, S>>,

    /// Maps each player to the session they're currently in.
    /// A player is in at most ONE session at a time (key invariant).
    player_sessions: HashMap<PlayerId, SessionId>,
}

impl<O: DistanceOracle, S: Store> Tables<O, S> {
    /// The player's session, dropping the mapping if it went stale.
    fn current(&mut self, player: PlayerId) -> Option<GameSession<O, S>> {
        let id = *self.player_sessions.get(&player)?;
        match self.sessions.get(&id) {
            Some(session) if session.contains(player) => Some(session.clone()),
            _ => {
                self.player_sessions.remove(&player);
                None
            }
        }
    }
}

/// Entry point for everything a transport (bot command, HTTP route,
/// socket handler) does with sessions.
///
/// ## Lifecycle
///
/// ```text
/// create_session() ──→ join / guess / start ──→ last player leaves
///        │                      │                      │
///        ▼                      ▼                      ▼
///   [in memory] ←── lookup_session() ←── [in store] ←── forced save, evict
/// ```
///
/// The tables lock is never held across an `.await`; sessions are
/// cloned out (cheap handles) before any async work.
pub struct SessionRegistry<O, S> {
    ctx: Arc<GameContext<O, S>>,
    ids: SnowflakeGenerator,
    tables: Mutex<Tables<O, S>>,
}

impl<O: DistanceOracle, S: Store> SessionRegistry<O, S> {
    /// Creates an empty registry.
    ///
    /// # Errors
    /// [`GameError::Id`] if `config.machine_id` is out of range.
    pub fn new(
        oracle: O,
        store: Arc<S>,
        config: GameConfig,
        persistence: PersistConfig,
    ) -> Result<Self, GameError> {
        let config = config.validated();
        let ids = SnowflakeGenerator::new(config.machine_id)?;
        tracing::info!(machine_id = config.machine_id, "session registry created");
        Ok(Self {
            ctx: Arc::new(GameContext {
                oracle: CachedOracle::new(oracle, Arc::clone(&store)),
                store,
                scheduler: PersistenceScheduler::new(persistence),
                config,
            }),
            ids,
            tables: Mutex::new(Tables {
                sessions: HashMap::new(),
                player_sessions: HashMap::new(),
            }),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.ctx.config
    }

    /// The cache-fronted oracle shared by every session.
    pub fn oracle(&self) -> &CachedOracle<O, S> {
        &self.ctx.oracle
    }

    pub fn store(&self) -> &Arc<S> {
        &self.ctx.store
    }

    pub fn scheduler(&self) -> &PersistenceScheduler {
        &self.ctx.scheduler
    }

    // -- Sessions -----------------------------------------------------------

    /// Creates a session with `player` as its host and only member.
    ///
    /// `round` may be a [`RoundId`](wordforge_protocol::RoundId), a
    /// `NaiveDate`, `None`, or a [`RoundSelector`]; the default is today's
    /// round.
    ///
    /// # Errors
    /// - [`GameError::AlreadyInSession`]: leave the current session first
    /// - [`GameError::InvalidRound`]: date before the calendar's epoch
    pub fn create_session(
        &self,
        player: PlayerId,
        mode: GameMode,
        round: impl Into<RoundSelector>,
    ) -> Result<GameSession<O, S>, GameError> {
        let round = round.into();
        let mut tables = self.tables.lock();
        if let Some(current) = tables.current(player) {
            return Err(GameError::AlreadyInSession(player, current.id()));
        }
        self.create_locked(&mut tables, player, mode, round)
    }

    fn create_locked(
        &self,
        tables: &mut Tables<O, S>,
        player: PlayerId,
        mode: GameMode,
        round: RoundSelector,
    ) -> Result<GameSession<O, S>, GameError> {
        let round = self.ctx.config.calendar.resolve(round)?;
        let id = self.ids.next_id()?;
        let session = GameSession::create(id, round, mode, player, Arc::clone(&self.ctx));
        tables.sessions.insert(id, session.clone());
        tables.player_sessions.insert(player, id);
        Ok(session)
    }

    /// The session `player` is in, if any.
    pub fn get_current_session(&self, player: PlayerId) -> Option<GameSession<O, S>> {
        self.tables.lock().current(player)
    }

    /// The player's current session, or a new one.
    ///
    /// Returns `(session, created)`.
    pub fn get_or_create_session(
        &self,
        player: PlayerId,
        mode: GameMode,
        round: impl Into<RoundSelector>,
    ) -> Result<(GameSession<O, S>, bool), GameError> {
        let round = round.into();
        let mut tables = self.tables.lock();
        if let Some(current) = tables.current(player) {
            return Ok((current, false));
        }
        let session = self.create_locked(&mut tables, player, mode, round)?;
        Ok((session, true))
    }

    /// Adds `player` to an existing session, restoring it from the store if
    /// it isn't in memory.
    ///
    /// # Errors
    /// - [`GameError::AlreadyInSession`]: the player is in a session
    /// - [`GameError::NotFound`]: no such session anywhere
    /// - anything [`GameSession::add_player`] rejects
    pub async fn join_session(
        &self,
        player: PlayerId,
        id: SessionId,
    ) -> Result<GameSession<O, S>, GameError> {
        if let Some(current) = self.get_current_session(player) {
            return Err(GameError::AlreadyInSession(player, current.id()));
        }

        let session = self.lookup_session(id).await.ok_or(GameError::NotFound(id))?;
        session.add_player(player)?;

        let mut tables = self.tables.lock();
        if let Some(&other) = tables.player_sessions.get(&player) {
            // A concurrent call placed the player somewhere else first.
            if other != id && tables.current(player).is_some() {
                if let Err(e) = session.undo_join(player) {
                    tracing::warn!(session_id = %id, %player, error = %e, "join rollback failed");
                }
                return Err(GameError::AlreadyInSession(player, other));
            }
        }
        // Re-register in case the session was evicted while we joined.
        tables.sessions.entry(id).or_insert_with(|| session.clone());
        tables.player_sessions.insert(player, id);
        Ok(session)
    }

    /// Removes `player` from their session.
    ///
    /// When the last player leaves, the session is saved right away and
    /// evicted from memory. If that save fails (after retries) the session
    /// stays in memory so [`shutdown`](Self::shutdown) can try again.
    pub async fn leave_session(&self, player: PlayerId) -> Result<(), GameError> {
        let session = {
            let mut tables = self.tables.lock();
            let id = tables
                .player_sessions
                .remove(&player)
                .ok_or(GameError::NotInSession(player))?;
            tables.sessions.get(&id).cloned()
        };
        let Some(session) = session else {
            return Ok(());
        };

        let remaining = match session.remove_player(player) {
            Ok(remaining) => remaining,
            Err(GameError::NotAMember(..)) => session.player_count(),
            Err(e) => return Err(e),
        };
        if remaining == 0 {
            self.flush_and_evict(&session).await;
        }
        Ok(())
    }

    async fn flush_and_evict(&self, session: &GameSession<O, S>) {
        let id = session.id();
        if let Err(e) = self
            .ctx
            .scheduler
            .force_save_and_cleanup(id, session.save_fn())
            .await
        {
            tracing::error!(session_id = %id, error = %e, "could not save empty session, keeping it in memory");
            return;
        }

        let mut tables = self.tables.lock();
        // Someone may have joined while we were saving.
        if session.player_count() == 0 {
            tables.sessions.remove(&id);
            tracing::info!(session_id = %id, "session evicted");
        }
    }

    /// Finds a session by id, in memory or in the store.
    ///
    /// A session loaded from the store is registered in memory again, and
    /// its members are mapped back to it unless they are already elsewhere.
    pub async fn lookup_session(&self, id: SessionId) -> Option<GameSession<O, S>> {
        let cached = self.tables.lock().sessions.get(&id).cloned();
        if cached.is_some() {
            return cached;
        }

        let record = match self.ctx.store.load_session(id).await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "session restore failed");
                return None;
            }
        };
        let restored = GameSession::from_record(record, Arc::clone(&self.ctx));

        let mut tables = self.tables.lock();
        // Another caller may have restored it while we were loading.
        let session = tables.sessions.entry(id).or_insert(restored).clone();
        for player in session.players() {
            tables.player_sessions.entry(player).or_insert(id);
        }
        Some(session)
    }

    // -- Player shortcuts ---------------------------------------------------

    fn require_session(&self, player: PlayerId) -> Result<GameSession<O, S>, GameError> {
        self.get_current_session(player)
            .ok_or(GameError::NotInSession(player))
    }

    /// Submits a word in the player's current session.
    pub async fn submit_guess(&self, player: PlayerId, word: &str) -> Result<GuessOutcome, GameError> {
        self.require_session(player)?.submit_guess(player, word).await
    }

    /// Plays a word, creating a session for today's round in the configured
    /// default mode if the player has none.
    ///
    /// A player still sitting in a finished session is moved to a new one.
    pub async fn play(&self, player: PlayerId, word: &str) -> Result<GuessOutcome, GameError> {
        let mode = self.ctx.config.default_mode;
        let session = match self.get_current_session(player) {
            Some(session) if !session.is_finished() => session,
            Some(_) => {
                self.leave_session(player).await?;
                self.create_session(player, mode, RoundSelector::Today)?
            }
            None => self.get_or_create_session(player, mode, RoundSelector::Today)?.0,
        };
        session.submit_guess(player, word).await
    }

    /// Starts the player's race session (host only).
    pub fn start_session(&self, player: PlayerId) -> Result<(), GameError> {
        self.require_session(player)?.start(player)
    }

    pub async fn request_tip(&self, player: PlayerId) -> Result<Tip, GameError> {
        self.require_session(player)?.request_tip(player).await
    }

    pub fn closest_guesses(&self, player: PlayerId, limit: usize) -> Result<Vec<Guess>, GameError> {
        self.require_session(player)?.closest_guesses(player, limit)
    }

    /// Gives up in the player's session, keeping the player index in sync
    /// when the player is removed.
    pub async fn give_up(&self, player: PlayerId) -> Result<GiveUp, GameError> {
        let session = self.require_session(player)?;
        let outcome = session.give_up(player).await?;

        if outcome.left_session {
            {
                let mut tables = self.tables.lock();
                if tables.player_sessions.get(&player) == Some(&session.id()) {
                    tables.player_sessions.remove(&player);
                }
            }
            if session.player_count() == 0 {
                self.flush_and_evict(&session).await;
            }
        }
        Ok(outcome)
    }

    // -- Registry -----------------------------------------------------------

    /// Number of sessions in memory.
    pub fn session_count(&self) -> usize {
        self.tables.lock().sessions.len()
    }

    /// Id of the session the player is in.
    pub fn player_session(&self, player: PlayerId) -> Option<SessionId> {
        self.get_current_session(player).map(|session| session.id())
    }

    /// Saves every in-memory session and clears the tables.
    ///
    /// Sessions whose save fails stay registered.
    ///
    /// # Errors
    /// The first save error, after every session was attempted.
    pub async fn shutdown(&self) -> Result<(), GameError> {
        let sessions: Vec<GameSession<O, S>> =
            self.tables.lock().sessions.values().cloned().collect();
        let total = sessions.len();
        let mut first_error = None;

        for session in sessions {
            let id = session.id();
            match self
                .ctx
                .scheduler
                .force_save_and_cleanup(id, session.save_fn())
                .await
            {
                Ok(()) => {
                    let mut tables = self.tables.lock();
                    tables.sessions.remove(&id);
                    tables.player_sessions.retain(|_, sid| *sid != id);
                }
                Err(e) => {
                    tracing::error!(session_id = %id, error = %e, "session lost its final save");
                    first_error.get_or_insert(e);
                }
            }
        }

        tracing::info!(sessions = total, failed = first_error.is_some(), "session registry shut down");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
