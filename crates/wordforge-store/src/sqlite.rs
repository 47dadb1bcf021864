//! SQLite-backed [`Store`] using `rusqlite`.
//!
//! `rusqlite` is synchronous, so every statement runs inside
//! `tokio::task::spawn_blocking` behind a shared connection mutex.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use wordforge_protocol::{
    CacheEntry, Codec, Evaluation, Guess, JsonCodec, ModeRecord, PlayerId, RoundId, SessionId,
    SessionRecord,
};

use crate::{Store, StoreError};

/// A [`Store`] that persists to a single SQLite database file.
///
/// Schema:
/// - `sessions`: one row per session; the player list and mode state are
///   JSON blobs encoded with [`JsonCodec`].
/// - `guesses`: append-only, ordered by `position` within a session.
/// - `distance_cache`: primary key `(round_id, word)`, indexed by
///   `(round_id, distance)` for tip and answer lookups.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    codec: JsonCodec,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::Io)?;
        }
        let conn = Connection::open(path)?;
        // WAL: readers don't block the writer during saves.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;",
        )?;
        tracing::info!(path = %path.display(), "sqlite store opened");
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            codec: JsonCodec,
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id            INTEGER PRIMARY KEY,
                round_id      INTEGER NOT NULL,
                mode          TEXT    NOT NULL,
                started       INTEGER NOT NULL,
                finished      INTEGER NOT NULL,
                allow_tips    INTEGER NOT NULL,
                allow_give_up INTEGER NOT NULL,
                players       BLOB    NOT NULL,
                mode_state    BLOB    NOT NULL,
                updated_at    TEXT    NOT NULL
            );

            CREATE TABLE IF NOT EXISTS guesses (
                session_id INTEGER NOT NULL,
                position   INTEGER NOT NULL,
                player_id  INTEGER NOT NULL,
                word       TEXT    NOT NULL,
                lemma      TEXT,
                distance   INTEGER,
                error      TEXT,
                PRIMARY KEY (session_id, position)
            );

            CREATE TABLE IF NOT EXISTS distance_cache (
                round_id   INTEGER NOT NULL,
                word       TEXT    NOT NULL,
                lemma      TEXT,
                distance   INTEGER,
                error      TEXT,
                updated_at TEXT    NOT NULL,
                PRIMARY KEY (round_id, word)
            );
            CREATE INDEX IF NOT EXISTS idx_distance_cache_distance
                ON distance_cache(round_id, distance);",
        )?;
        Ok(())
    }

    /// Runs `f` against the connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            f(&mut *conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

// Ids are stored bit-for-bit in signed columns; `as` round-trips every u64.
fn to_sql_id(id: u64) -> i64 {
    id as i64
}

fn from_sql_id(id: i64) -> u64 {
    id as u64
}

/// Splits an evaluation into the nullable `(lemma, distance, error)` columns.
fn evaluation_columns(evaluation: &Evaluation) -> (Option<&str>, Option<i64>, Option<&str>) {
    match evaluation {
        Evaluation::Scored { lemma, distance } => {
            (lemma.as_deref(), Some(i64::from(*distance)), None)
        }
        Evaluation::Rejected { message } => (None, None, Some(message.as_str())),
    }
}

/// Rebuilds an evaluation from the nullable columns.
fn evaluation_from_columns(
    word: &str,
    lemma: Option<String>,
    distance: Option<i64>,
    error: Option<String>,
) -> Result<Evaluation, StoreError> {
    match (distance, error) {
        (Some(distance), _) => {
            let distance = u32::try_from(distance).map_err(|_| {
                StoreError::Corrupt(format!("word `{word}` has distance {distance}"))
            })?;
            Ok(Evaluation::Scored { lemma, distance })
        }
        (None, Some(message)) => Ok(Evaluation::Rejected { message }),
        (None, None) => Err(StoreError::Corrupt(format!(
            "word `{word}` has neither a distance nor an error"
        ))),
    }
}

fn cache_entry_from_row(row: &Row<'_>) -> rusqlite::Result<(String, Option<String>, Option<i64>, Option<String>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_cache_entry(
    (word, lemma, distance, error): (String, Option<String>, Option<i64>, Option<String>),
) -> Result<CacheEntry, StoreError> {
    let evaluation = evaluation_from_columns(&word, lemma, distance, error)?;
    Ok(CacheEntry { word, evaluation })
}

impl Store for SqliteStore {
    async fn save_session(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let players = self.codec.encode(&record.players)?;
        let mode_state = self.codec.encode(&record.mode_state)?;
        let record = record.clone();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO sessions
                    (id, round_id, mode, started, finished, allow_tips, allow_give_up,
                     players, mode_state, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                    round_id      = excluded.round_id,
                    mode          = excluded.mode,
                    started       = excluded.started,
                    finished      = excluded.finished,
                    allow_tips    = excluded.allow_tips,
                    allow_give_up = excluded.allow_give_up,
                    players       = excluded.players,
                    mode_state    = excluded.mode_state,
                    updated_at    = excluded.updated_at",
                params![
                    to_sql_id(record.id.0),
                    record.round_id.0,
                    record.mode.as_str(),
                    record.started,
                    record.finished,
                    record.allow_tips,
                    record.allow_give_up,
                    players,
                    mode_state,
                    Utc::now().to_rfc3339(),
                ],
            )?;

            {
                let mut insert = tx.prepare_cached(
                    "INSERT OR IGNORE INTO guesses
                        (session_id, position, player_id, word, lemma, distance, error)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?;
                for (position, guess) in record.guesses.iter().enumerate() {
                    let (lemma, distance, error) = evaluation_columns(&guess.evaluation);
                    insert.execute(params![
                        to_sql_id(record.id.0),
                        position as i64,
                        to_sql_id(guess.submitted_by.0),
                        guess.word,
                        lemma,
                        distance,
                        error,
                    ])?;
                }
            }

            tx.commit()?;
            tracing::debug!(
                session_id = %record.id,
                guesses = record.guesses.len(),
                "session saved"
            );
            Ok(())
        })
        .await
    }

    async fn load_session(&self, id: SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let codec = self.codec;
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT round_id, mode, started, finished, allow_tips, allow_give_up,
                            players, mode_state
                     FROM sessions WHERE id = ?1",
                    params![to_sql_id(id.0)],
                    |row| {
                        Ok((
                            row.get::<_, u32>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, bool>(2)?,
                            row.get::<_, bool>(3)?,
                            row.get::<_, bool>(4)?,
                            row.get::<_, bool>(5)?,
                            row.get::<_, Vec<u8>>(6)?,
                            row.get::<_, Vec<u8>>(7)?,
                        ))
                    },
                )
                .optional()?;

            let Some((round_id, mode, started, finished, allow_tips, allow_give_up, players, mode_state)) =
                row
            else {
                return Ok(None);
            };

            let players: Vec<PlayerId> = codec.decode(&players)?;
            let mode_state: ModeRecord = codec.decode(&mode_state)?;

            let mut stmt = conn.prepare_cached(
                "SELECT player_id, word, lemma, distance, error
                 FROM guesses WHERE session_id = ?1 ORDER BY position",
            )?;
            let rows = stmt.query_map(params![to_sql_id(id.0)], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?;

            let mut guesses = Vec::new();
            for row in rows {
                let (player_id, word, lemma, distance, error) = row?;
                let evaluation = evaluation_from_columns(&word, lemma, distance, error)?;
                guesses.push(Guess {
                    word,
                    evaluation,
                    submitted_by: PlayerId(from_sql_id(player_id)),
                    hidden: false,
                });
            }

            Ok(Some(SessionRecord {
                id,
                round_id: RoundId(round_id),
                mode: mode.parse()?,
                started,
                finished,
                allow_tips,
                allow_give_up,
                players,
                guesses,
                mode_state,
            }))
        })
        .await
    }

    async fn upsert_cache_entry(&self, round: RoundId, entry: &CacheEntry) -> Result<(), StoreError> {
        let entry = entry.clone();
        self.with_conn(move |conn| {
            let (lemma, distance, error) = evaluation_columns(&entry.evaluation);
            // A scored row keeps its distance; only a missing lemma is filled in.
            // A rejected row takes whatever arrives next.
            conn.execute(
                "INSERT INTO distance_cache (round_id, word, lemma, distance, error, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(round_id, word) DO UPDATE SET
                    lemma = CASE WHEN distance_cache.distance IS NULL
                                 THEN excluded.lemma
                                 ELSE COALESCE(distance_cache.lemma, excluded.lemma) END,
                    error = CASE WHEN distance_cache.distance IS NULL
                                 THEN excluded.error
                                 ELSE distance_cache.error END,
                    distance = COALESCE(distance_cache.distance, excluded.distance),
                    updated_at = excluded.updated_at",
                params![
                    round.0,
                    entry.word,
                    lemma,
                    distance,
                    error,
                    Utc::now().to_rfc3339()
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn find_cache_entry(&self, round: RoundId, word: &str) -> Result<Option<CacheEntry>, StoreError> {
        let word = word.to_owned();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT word, lemma, distance, error FROM distance_cache
                 WHERE round_id = ?1 AND word = ?2",
                params![round.0, word],
                cache_entry_from_row,
            )
            .optional()?
            .map(into_cache_entry)
            .transpose()
        })
        .await
    }

    async fn find_cache_entry_by_distance(
        &self,
        round: RoundId,
        distance: u32,
    ) -> Result<Option<CacheEntry>, StoreError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT word, lemma, distance, error FROM distance_cache
                 WHERE round_id = ?1 AND distance = ?2
                 ORDER BY word LIMIT 1",
                params![round.0, i64::from(distance)],
                cache_entry_from_row,
            )
            .optional()?
            .map(into_cache_entry)
            .transpose()
        })
        .await
    }
}
