//! Game sessions for Wordforge.
//!
//! A session is a group of players guessing the same round's secret word,
//! under the rules of one of four [`GameMode`](wordforge_protocol::GameMode)s:
//!
//! | Mode | Who wins | History |
//! |------|----------|---------|
//! | Cooperative | the group, together | shared |
//! | Competitive | everyone who finishes, ranked by guesses | per player |
//! | RaceToAnswer | the first exact guess | per player |
//! | ExclusiveWordRace | the first exact guess; a word counts once | per player |
//!
//! # Key types
//!
//! - [`SessionRegistry`]: creates, joins, restores, and evicts sessions
//! - [`GameSession`]: one session; submit guesses, ask for tips, give up
//! - [`GameConfig`]: player limits, tip policy, and the round calendar
//! - [`GameError`]: every way a game operation can be refused

mod config;
mod error;
mod id;
mod registry;
mod session;
mod state;
mod variant;

pub use config::{GameConfig, PlayerLimits, RoundCalendar, RoundSelector, TipConfig};
pub use error::GameError;
pub use id::{IdError, SNOWFLAKE_EPOCH_MS, SnowflakeGenerator, SnowflakeParts};
pub use registry::SessionRegistry;
pub use session::{GameSession, GiveUp, GuessOutcome, PlayerProgress, Standing, Tip};
