//! # Wordforge
//!
//! Multiplayer sessions for a daily word-guessing game scored by semantic
//! distance.
//!
//! Players guess words; an external [`DistanceOracle`](wordforge_oracle::DistanceOracle)
//! says how far each word is from the round's secret answer (0 means found
//! it). Wordforge runs the sessions around that: membership, four game
//! modes, fair race resolution, tips, a shared distance cache, and
//! debounced persistence with lazy restore.
//!
//! ```text
//!  transport (bot, HTTP, sockets)
//!        │
//!        ▼
//!  SessionRegistry ──→ GameSession ──→ CachedOracle ──→ DistanceOracle
//!        │                  │               │
//!        │                  ▼               ▼
//!        └──────→ PersistenceScheduler ──→ Store (memory / SQLite)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use wordforge::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), WordforgeError> {
//! wordforge::telemetry::init_tracing();
//!
//! let oracle = StaticOracle::new()
//!     .with_word(RoundId(1830), "casa", Some("casa"), 200)
//!     .with_word(RoundId(1830), "lar", Some("lar"), 0);
//! let registry = WordforgeBuilder::new().build(oracle, Arc::new(MemoryStore::new()))?;
//!
//! let session = registry.create_session(PlayerId(1), GameMode::Cooperative, RoundId(1830))?;
//! registry.join_session(PlayerId(2), session.id()).await?;
//!
//! let near = registry.submit_guess(PlayerId(2), "casa").await?;
//! assert_eq!(near.guess.distance(), Some(200));
//! let found = registry.submit_guess(PlayerId(1), "lar").await?;
//! assert!(found.solved);
//!
//! registry.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod error;
pub mod telemetry;

pub use builder::WordforgeBuilder;
pub use config::WordforgeConfig;
pub use error::WordforgeError;

pub use wordforge_game as game;
pub use wordforge_oracle as oracle;
pub use wordforge_persist as persist;
pub use wordforge_protocol as protocol;
pub use wordforge_store as store;

/// Everything a transport usually needs, in one import.
pub mod prelude {
    pub use crate::{WordforgeBuilder, WordforgeConfig, WordforgeError};
    pub use wordforge_game::{
        GameConfig, GameError, GameSession, GiveUp, GuessOutcome, PlayerProgress, RoundSelector,
        SessionRegistry, Standing, Tip,
    };
    pub use wordforge_oracle::{CachedOracle, DistanceOracle, OracleError, StaticOracle};
    pub use wordforge_persist::PersistConfig;
    pub use wordforge_protocol::{
        CacheEntry, GameMode, Guess, PlayerId, RoundId, SessionId, WinnerRecord,
    };
    #[cfg(feature = "sqlite")]
    pub use wordforge_store::SqliteStore;
    pub use wordforge_store::{MemoryStore, Store};
}
