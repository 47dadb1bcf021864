//! A single game session: one room playing one round.
//!
//! [`GameSession`] is a cheap-to-clone handle. All mutable state sits
//! behind one `parking_lot::Mutex` per session, and every method holds it
//! only for a synchronous stretch of code. The slow part of a guess, the
//! cache/oracle lookup, runs with the lock released:
//!
//! ```text
//! submit_guess(player, word)
//!   ├── lock ── validate, take a ticket (seq + timestamp) ── unlock
//!   ├── cache / oracle lookup            (other guesses may run here)
//!   └── lock ── release ticket, decide, record ────────────── unlock
//! ```
//!
//! The pending-ticket check and the winner compare-and-set happen in the
//! same critical section, so two exact guesses can never both win.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use wordforge_oracle::{CachedOracle, DistanceOracle, OracleError};
use wordforge_persist::{PersistenceScheduler, SaveFn};
use wordforge_protocol::{
    CacheEntry, GameMode, Guess, PlayerId, RoundId, SessionId, SessionRecord, WinnerRecord,
    normalize_word,
};
use wordforge_store::{Store, StoreError};

use crate::state::{Core, Scope, Ticket};
use crate::variant::Variant;
use crate::{GameConfig, GameError, TipConfig};

// ---------------------------------------------------------------------------
// Shared context
// ---------------------------------------------------------------------------

/// Collaborators every session of a registry shares.
pub(crate) struct GameContext<O, S> {
    pub oracle: CachedOracle<O, S>,
    pub store: Arc<S>,
    pub scheduler: PersistenceScheduler,
    pub config: GameConfig,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What happened to a submitted word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    /// The evaluated guess. A rejected evaluation means the oracle refused
    /// the word; such guesses are never recorded.
    pub guess: Guess,
    /// The word (or its lemma) was already in the player's history; `guess`
    /// is the earlier entry and nothing new was recorded.
    pub repeated: bool,
    /// This guess found the answer.
    pub solved: bool,
}

impl GuessOutcome {
    fn fresh(guess: Guess, solved: bool) -> Self {
        Self {
            guess,
            repeated: false,
            solved,
        }
    }

    fn repeat(guess: Guess) -> Self {
        Self {
            guess,
            repeated: true,
            solved: false,
        }
    }

    /// Whether this call added a guess to the history.
    pub fn is_recorded(&self) -> bool {
        !self.repeated && self.guess.evaluation.is_scored()
    }
}

/// A hint: some word at a known distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tip {
    pub word: String,
    pub distance: u32,
}

/// The answer revealed to a player who gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiveUp {
    pub answer: String,
    /// The player was removed from the session (every mode but cooperative).
    pub left_session: bool,
}

/// One row of a leaderboard or live standings table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub player_id: PlayerId,
    pub guess_count: u32,
    pub best_distance: Option<u32>,
    /// Set for players who found the answer.
    pub completed_at: Option<DateTime<Utc>>,
}

/// A member's progress as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProgress {
    pub player_id: PlayerId,
    pub guess_count: u32,
    /// Redacted for other players in race modes.
    pub best: Option<Guess>,
}

enum Admission {
    Repeat(Guess),
    Ticket(Ticket),
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

pub(crate) struct SessionState {
    pub core: Core,
    pub variant: Variant,
}

struct SessionInner<O, S> {
    id: SessionId,
    round: RoundId,
    mode: GameMode,
    ctx: Arc<GameContext<O, S>>,
    state: Mutex<SessionState>,
}

/// Handle to a live session.
///
/// Cheap to clone; every clone refers to the same session. Methods that
/// change the session schedule a debounced save on their own.
pub struct GameSession<O, S> {
    inner: Arc<SessionInner<O, S>>,
}

impl<O, S> Clone for GameSession<O, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O, S> std::fmt::Debug for GameSession<O, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.inner.id)
            .field("round", &self.inner.round)
            .field("mode", &self.inner.mode)
            .finish_non_exhaustive()
    }
}

/// Drops a pending ticket on every exit path of a submission, including
/// errors and a cancelled future.
struct PendingGuard<'a> {
    state: &'a Mutex<SessionState>,
    player: PlayerId,
    seq: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().core.release_ticket(self.player, self.seq);
    }
}

impl<O: DistanceOracle, S: Store> GameSession<O, S> {
    /// A new session with `host` as its only member.
    ///
    /// Cooperative and competitive sessions are playable right away; race
    /// sessions wait for the host to [`start`](Self::start) them.
    pub(crate) fn create(
        id: SessionId,
        round: RoundId,
        mode: GameMode,
        host: PlayerId,
        ctx: Arc<GameContext<O, S>>,
    ) -> Self {
        let mut core = Core::new(id, round, ctx.config.allow_tips, ctx.config.allow_give_up);
        core.players.push(host);
        core.started = !mode.is_race();
        let session = Self::with_state(core, mode, Variant::new(mode), ctx);
        tracing::info!(session_id = %id, round = %round, %mode, %host, "session created");
        session.touch();
        session
    }

    /// Rebuilds a session from its durable record.
    pub(crate) fn from_record(record: SessionRecord, ctx: Arc<GameContext<O, S>>) -> Self {
        let variant = Variant::restore(record.mode, &record.mode_state, &record.guesses);
        let mut core = Core::new(record.id, record.round_id, record.allow_tips, record.allow_give_up);
        core.players = record.players;
        core.started = record.started;
        core.finished = record.finished || record.mode_state.winner.is_some();
        core.guesses = record
            .guesses
            .into_iter()
            .filter(|guess| guess.evaluation.is_scored())
            .collect();
        tracing::info!(
            session_id = %record.id,
            round = %record.round_id,
            mode = %record.mode,
            guesses = core.guesses.len(),
            "session restored"
        );
        Self::with_state(core, record.mode, variant, ctx)
    }

    fn with_state(core: Core, mode: GameMode, variant: Variant, ctx: Arc<GameContext<O, S>>) -> Self {
        debug_assert_eq!(variant.rules().mode(), mode);
        Self {
            inner: Arc::new(SessionInner {
                id: core.id,
                round: core.round,
                mode,
                ctx,
                state: Mutex::new(SessionState { core, variant }),
            }),
        }
    }

    // -- Info ---------------------------------------------------------------

    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    pub fn round(&self) -> RoundId {
        self.inner.round
    }

    pub fn mode(&self) -> GameMode {
        self.inner.mode
    }

    /// Members in join order.
    pub fn players(&self) -> Vec<PlayerId> {
        self.inner.state.lock().core.players.clone()
    }

    pub fn player_count(&self) -> usize {
        self.inner.state.lock().core.players.len()
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.inner.state.lock().core.is_member(player)
    }

    /// The host is the earliest member still in the session.
    pub fn is_host(&self, player: PlayerId) -> bool {
        self.inner.state.lock().core.host() == Some(player)
    }

    pub fn is_started(&self) -> bool {
        self.inner.state.lock().core.started
    }

    pub fn is_finished(&self) -> bool {
        self.inner.state.lock().core.finished
    }

    pub fn allow_tips(&self) -> bool {
        self.inner.state.lock().core.allow_tips
    }

    pub fn allow_give_up(&self) -> bool {
        self.inner.state.lock().core.allow_give_up
    }

    // -- Membership ---------------------------------------------------------

    /// Adds a member.
    ///
    /// # Errors
    /// - [`GameError::AlreadyInSession`]: already a member
    /// - [`GameError::SessionFinished`]: nothing left to play
    /// - [`GameError::AlreadyStarted`]: race sessions close once started
    /// - [`GameError::Full`]: at the mode's player cap
    /// - [`GameError::AlreadyCompleted`]: competitive player who already
    ///   finished this round
    pub fn add_player(&self, player: PlayerId) -> Result<(), GameError> {
        let cap = self.inner.ctx.config.limits.for_mode(self.inner.mode);
        {
            let mut state = self.inner.state.lock();
            let SessionState { core, variant } = &mut *state;
            if core.is_member(player) {
                return Err(GameError::AlreadyInSession(player, core.id));
            }
            if core.finished {
                return Err(GameError::SessionFinished(core.id));
            }
            if self.inner.mode.is_race() && core.started {
                return Err(GameError::AlreadyStarted(core.id));
            }
            if core.players.len() >= cap {
                return Err(GameError::Full(core.id));
            }
            variant.rules().check_join(core, player)?;
            core.players.push(player);
        }
        tracing::info!(session_id = %self.inner.id, %player, "player joined session");
        self.touch();
        Ok(())
    }

    /// Removes a member and returns how many remain.
    pub fn remove_player(&self, player: PlayerId) -> Result<usize, GameError> {
        let remaining = self.detach(player)?;
        tracing::info!(session_id = %self.inner.id, %player, remaining, "player left session");
        self.touch();
        Ok(remaining)
    }

    /// Takes back an [`add_player`](Self::add_player) that lost a race
    /// against another join. Nothing observable changed, so no save is
    /// scheduled.
    pub(crate) fn undo_join(&self, player: PlayerId) -> Result<usize, GameError> {
        self.detach(player)
    }

    fn detach(&self, player: PlayerId) -> Result<usize, GameError> {
        let mut state = self.inner.state.lock();
        let SessionState { core, variant } = &mut *state;
        if !core.remove_player(player) {
            return Err(GameError::NotAMember(player, core.id));
        }
        variant.rules_mut().on_leave(core, player);
        Ok(core.players.len())
    }

    /// Starts a race. Only the host may do this, and only once.
    pub fn start(&self, player: PlayerId) -> Result<(), GameError> {
        {
            let mut state = self.inner.state.lock();
            let core = &mut state.core;
            if !self.inner.mode.is_race() {
                return Err(self.unsupported("start"));
            }
            if core.started {
                return Err(GameError::AlreadyStarted(core.id));
            }
            if core.players.is_empty() {
                return Err(GameError::NoPlayers(core.id));
            }
            core.ensure_member(player)?;
            if core.host() != Some(player) {
                return Err(GameError::NotHost(player, core.id));
            }
            core.started = true;
        }
        tracing::info!(session_id = %self.inner.id, host = %player, "race started");
        self.touch();
        Ok(())
    }

    // -- Guessing -----------------------------------------------------------

    /// Submits a word for `player`.
    ///
    /// # Returns
    /// - a fresh scored guess, recorded (and possibly solving the round)
    /// - the earlier guess with `repeated` set, if the word or its lemma
    ///   was already in the player's history (never in exclusive races,
    ///   where a used word is [`GameError::WordAlreadyUsed`] for everyone)
    /// - an unrecorded guess with a rejected evaluation, if the oracle
    ///   refused the word
    ///
    /// # Errors
    /// Validation failures, [`GameError::RaceLost`] when another
    /// submission decided the race first, and [`GameError::Oracle`] when
    /// the oracle is unreachable. None of these record anything.
    pub async fn submit_guess(&self, player: PlayerId, word: &str) -> Result<GuessOutcome, GameError> {
        let word = normalize_word(word);
        let ticket = match self.admit(player, &word)? {
            Admission::Repeat(guess) => return Ok(GuessOutcome::repeat(guess)),
            Admission::Ticket(ticket) => ticket,
        };
        let _pending = PendingGuard {
            state: &self.inner.state,
            player,
            seq: ticket.seq,
        };

        let entry = self
            .inner
            .ctx
            .oracle
            .evaluate(self.inner.round, &ticket.word)
            .await?;

        let outcome = self.resolve(player, &ticket, entry)?;
        if outcome.is_recorded() {
            self.note_guess();
        }
        Ok(outcome)
    }

    /// First critical section: validate and take a ticket.
    fn admit(&self, player: PlayerId, word: &str) -> Result<Admission, GameError> {
        let mut state = self.inner.state.lock();
        let SessionState { core, variant } = &mut *state;
        let rules = variant.rules();

        core.ensure_member(player)?;
        if core.finished {
            return Err(GameError::SessionFinished(core.id));
        }
        if !core.started {
            return Err(GameError::SessionNotStarted(core.id));
        }
        rules.check_active(core, player)?;
        rules.check_word(core, player, word)?;

        if let Some(earlier) = core.find_repeat(rules.scope(player), &[word]) {
            return Ok(Admission::Repeat(earlier.clone()));
        }
        if core.pending.contains_key(&player) {
            return Err(GameError::AlreadyPending(player));
        }
        Ok(Admission::Ticket(core.issue_ticket(player, word)))
    }

    /// Second critical section: decide and record.
    fn resolve(&self, player: PlayerId, ticket: &Ticket, entry: CacheEntry) -> Result<GuessOutcome, GameError> {
        let mut state = self.inner.state.lock();
        let SessionState { core, variant } = &mut *state;
        core.release_ticket(player, ticket.seq);

        core.ensure_member(player)?;
        if core.finished {
            return Err(if self.inner.mode.is_race() {
                GameError::RaceLost(core.id)
            } else {
                GameError::SessionFinished(core.id)
            });
        }

        let guess = Guess::from_entry(&entry, player);
        if !entry.evaluation.is_scored() {
            tracing::debug!(session_id = %core.id, %player, word = %entry.word, "word rejected");
            return Ok(GuessOutcome::fresh(guess, false));
        }

        let rules = variant.rules_mut();
        rules.check_result(core, &entry)?;
        let mut forms = vec![entry.word.as_str()];
        forms.extend(entry.evaluation.lemma());
        if let Some(earlier) = core.find_repeat(rules.scope(player), &forms) {
            return Ok(GuessOutcome::repeat(earlier.clone()));
        }

        let solved = rules.commit(core, guess.clone(), ticket)?;
        tracing::debug!(
            session_id = %core.id,
            %player,
            word = %guess.word,
            distance = ?guess.distance(),
            seq = ticket.seq,
            "guess recorded"
        );
        Ok(GuessOutcome::fresh(guess, solved))
    }

    /// Closest recorded guesses in `player`'s history, nearest first.
    pub fn closest_guesses(&self, player: PlayerId, limit: usize) -> Result<Vec<Guess>, GameError> {
        let state = self.inner.state.lock();
        state.core.ensure_member(player)?;
        let mut guesses: Vec<Guess> = state
            .core
            .history(state.variant.rules().scope(player))
            .cloned()
            .collect();
        // Stable: equal distances keep creation order.
        guesses.sort_by_key(|guess| guess.distance());
        guesses.truncate(limit);
        Ok(guesses)
    }

    /// Recorded guesses: the whole session's with `None`, otherwise those
    /// in the player's history (the shared list in cooperative play).
    pub fn guess_count(&self, player: Option<PlayerId>) -> u32 {
        let state = self.inner.state.lock();
        let scope = player.map_or(Scope::Shared, |p| state.variant.rules().scope(p));
        state.core.count(scope)
    }

    // -- Tips and giving up -------------------------------------------------

    /// Suggests a word closer than anything the player has found.
    ///
    /// Tips are never recorded as guesses. Exclusive-word sessions skip
    /// words already used and search outward over up to
    /// `tips.max_attempts` distances.
    pub async fn request_tip(&self, player: PlayerId) -> Result<Tip, GameError> {
        let tips = &self.inner.ctx.config.tips;
        let (target, attempts) = {
            let state = self.inner.state.lock();
            let SessionState { core, variant } = &*state;
            core.ensure_member(player)?;
            if !core.allow_tips || self.inner.mode == GameMode::RaceToAnswer {
                return Err(GameError::TipsDisabled(core.id));
            }
            if core.finished {
                return Err(GameError::SessionFinished(core.id));
            }
            if !core.started {
                return Err(GameError::SessionNotStarted(core.id));
            }
            let rules = variant.rules();
            rules.check_active(core, player)?;
            let target = tip_target(core.history(rules.scope(player)), tips);
            let attempts = match self.inner.mode {
                GameMode::ExclusiveWordRace => tips.max_attempts,
                _ => 1,
            };
            (target, attempts)
        };

        for step in 0..attempts {
            let Some(distance) = target.checked_add(step) else {
                break;
            };
            let entry = match self.inner.ctx.oracle.tip_at(self.inner.round, distance).await {
                Ok(entry) => entry,
                Err(OracleError::Rejected(reason)) => {
                    tracing::debug!(session_id = %self.inner.id, distance, %reason, "no tip at distance");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let Some(distance) = entry.evaluation.distance() else {
                continue;
            };
            if self.inner.state.lock().variant.rules().accepts_tip(&entry) {
                tracing::debug!(session_id = %self.inner.id, %player, distance, "tip given");
                return Ok(Tip {
                    word: entry.word,
                    distance,
                });
            }
        }
        Err(GameError::NoTipAvailable)
    }

    /// Reveals the answer to `player`.
    ///
    /// Cooperative sessions allow this only to a lone player and finish the
    /// round. In every other mode the answer goes to the quitter alone and
    /// they are removed from the session.
    pub async fn give_up(&self, player: PlayerId) -> Result<GiveUp, GameError> {
        let cooperative = self.inner.mode == GameMode::Cooperative;
        self.check_give_up(player, cooperative)?;

        let answer = self.inner.ctx.oracle.answer(self.inner.round).await?;

        let left_session = {
            let mut state = self.inner.state.lock();
            let SessionState { core, variant } = &mut *state;
            if cooperative {
                // Someone may have joined while the answer was fetched.
                if core.players.len() != 1 {
                    return Err(GameError::GiveUpRequiresSolo(core.id));
                }
                core.finished = true;
                false
            } else {
                if core.remove_player(player) {
                    variant.rules_mut().on_leave(core, player);
                }
                true
            }
        };
        tracing::info!(session_id = %self.inner.id, %player, left_session, "player gave up");
        self.touch();
        Ok(GiveUp {
            answer: answer.word,
            left_session,
        })
    }

    fn check_give_up(&self, player: PlayerId, cooperative: bool) -> Result<(), GameError> {
        let state = self.inner.state.lock();
        let core = &state.core;
        core.ensure_member(player)?;
        if !core.allow_give_up {
            return Err(GameError::GiveUpDisabled(core.id));
        }
        if cooperative && core.players.len() != 1 {
            return Err(GameError::GiveUpRequiresSolo(core.id));
        }
        Ok(())
    }

    // -- Mode-specific views ------------------------------------------------

    /// Final rankings.
    ///
    /// - Competitive: completed players by guess count, then completion time.
    /// - Race modes: everyone who played by closest distance, regardless of
    ///   who won.
    pub fn leaderboard(&self) -> Result<Vec<Standing>, GameError> {
        let state = self.inner.state.lock();
        let core = &state.core;
        match &state.variant {
            Variant::Competitive(competitive) => Ok(competitive
                .leaderboard()
                .into_iter()
                .map(|c| Standing {
                    player_id: c.player_id,
                    guess_count: c.guess_count,
                    best_distance: Some(0),
                    completed_at: Some(c.completed_at),
                })
                .collect()),
            Variant::RaceToAnswer(_) | Variant::ExclusiveWordRace(_) => {
                let winner = match &state.variant {
                    Variant::RaceToAnswer(v) => v.race.winner().cloned(),
                    Variant::ExclusiveWordRace(v) => v.race.winner().cloned(),
                    _ => None,
                };
                let mut participants: Vec<PlayerId> = core.players.clone();
                for guess in &core.guesses {
                    if !participants.contains(&guess.submitted_by) {
                        participants.push(guess.submitted_by);
                    }
                }
                let mut standings: Vec<Standing> = participants
                    .into_iter()
                    .map(|player| {
                        let mut standing = standing_for(core, player);
                        standing.completed_at = winner
                            .as_ref()
                            .filter(|w| w.player_id == player)
                            .map(|w| w.completed_at);
                        standing
                    })
                    .collect();
                standings.sort_by_key(|s| (s.best_distance.is_none(), s.best_distance, s.guess_count, s.player_id));
                Ok(standings)
            }
            Variant::Cooperative(_) => Err(self.unsupported("leaderboard")),
        }
    }

    /// Live standings of competitive players still searching.
    pub fn active_player_stats(&self) -> Result<Vec<Standing>, GameError> {
        let state = self.inner.state.lock();
        let Variant::Competitive(competitive) = &state.variant else {
            return Err(self.unsupported("active player stats"));
        };
        let mut stats: Vec<Standing> = state
            .core
            .players
            .iter()
            .filter(|player| competitive.completion(**player).is_none())
            .map(|player| standing_for(&state.core, *player))
            .collect();
        stats.sort_by_key(|s| (s.best_distance.is_none(), s.best_distance, s.guess_count));
        Ok(stats)
    }

    /// The race winner, once decided.
    pub fn winner(&self) -> Result<Option<WinnerRecord>, GameError> {
        let state = self.inner.state.lock();
        match &state.variant {
            Variant::RaceToAnswer(v) => Ok(v.race.winner().cloned()),
            Variant::ExclusiveWordRace(v) => Ok(v.race.winner().cloned()),
            Variant::Cooperative(_) | Variant::Competitive(_) => Err(self.unsupported("winner")),
        }
    }

    /// How many distinct words and lemmas have been used up.
    pub fn used_word_count(&self) -> Result<usize, GameError> {
        match &self.inner.state.lock().variant {
            Variant::ExclusiveWordRace(v) => Ok(v.used_word_count()),
            _ => Err(self.unsupported("used word count")),
        }
    }

    /// Who made the latest guess in a cooperative session.
    pub fn last_guesser(&self) -> Result<Option<PlayerId>, GameError> {
        match &self.inner.state.lock().variant {
            Variant::Cooperative(v) => Ok(v.last_guesser()),
            _ => Err(self.unsupported("last guesser")),
        }
    }

    /// Each member's guess count and best guess, as `viewer` may see them.
    ///
    /// In race modes other players' best guesses are redacted: the distance
    /// shows, the word does not.
    pub fn progress(&self, viewer: PlayerId) -> Result<Vec<PlayerProgress>, GameError> {
        let state = self.inner.state.lock();
        let core = &state.core;
        core.ensure_member(viewer)?;
        let redact = self.inner.mode.is_race();
        Ok(core
            .players
            .iter()
            .map(|&player| {
                let scope = Scope::Player(player);
                let best = core.best(scope).map(|guess| {
                    if redact && player != viewer {
                        guess.redacted()
                    } else {
                        guess.clone()
                    }
                });
                PlayerProgress {
                    player_id: player,
                    guess_count: core.count(scope),
                    best,
                }
            })
            .collect())
    }

    // -- Persistence --------------------------------------------------------

    /// The durable record of the session as it is right now.
    pub fn snapshot(&self) -> SessionRecord {
        let state = self.inner.state.lock();
        let core = &state.core;
        SessionRecord {
            id: core.id,
            round_id: core.round,
            mode: self.inner.mode,
            started: core.started,
            finished: core.finished,
            allow_tips: core.allow_tips,
            allow_give_up: core.allow_give_up,
            players: core.players.clone(),
            guesses: core.guesses.clone(),
            mode_state: state.variant.rules().to_record(),
        }
    }

    /// Writes a snapshot to the store.
    pub async fn save(&self) -> Result<(), StoreError> {
        let record = self.snapshot();
        self.inner.ctx.store.save_session(&record).await
    }

    /// A save callback for the scheduler; snapshots when it runs.
    pub(crate) fn save_fn(&self) -> SaveFn {
        let session = self.clone();
        Arc::new(move || {
            let session = session.clone();
            Box::pin(async move { session.save().await })
        })
    }

    /// Schedules a debounced save after a mutation.
    fn touch(&self) {
        self.inner
            .ctx
            .scheduler
            .schedule_inactivity_save(self.inner.id, self.save_fn());
    }

    /// Counts a recorded guess; every Nth one saves immediately.
    fn note_guess(&self) {
        let scheduler = &self.inner.ctx.scheduler;
        let id = self.inner.id;
        if !scheduler.should_force_save_on_guess_count(id) {
            self.touch();
            return;
        }
        tracing::debug!(session_id = %id, "guess threshold reached, saving now");
        let scheduler = scheduler.clone();
        let save = self.save_fn();
        tokio::spawn(async move {
            if let Err(e) = scheduler.force_save_and_cleanup(id, save).await {
                tracing::warn!(session_id = %id, error = %e, "threshold save failed");
            }
        });
    }

    fn unsupported(&self, operation: &'static str) -> GameError {
        GameError::Unsupported {
            operation,
            mode: self.inner.mode,
        }
    }
}

fn standing_for(core: &Core, player: PlayerId) -> Standing {
    let scope = Scope::Player(player);
    Standing {
        player_id: player,
        guess_count: core.count(scope),
        best_distance: core.best(scope).and_then(Guess::distance),
        completed_at: None,
    }
}

/// Distance a tip should aim for, given the guesses in the player's history.
///
/// - nothing scored yet: `initial_distance`
/// - best above 1: half the best
/// - best of 1 (or 0): the smallest distance from 2 up not yet guessed
fn tip_target<'a>(history: impl Iterator<Item = &'a Guess>, tips: &TipConfig) -> u32 {
    let distances: BTreeSet<u32> = history.filter_map(Guess::distance).collect();
    match distances.first() {
        None => tips.initial_distance,
        Some(&best) if best > 1 => best / 2,
        Some(_) => (2..=u32::MAX)
            .find(|d| !distances.contains(d))
            .unwrap_or(u32::MAX),
    }
}
