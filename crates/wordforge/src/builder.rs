//! `WordforgeBuilder`: turns configuration plus collaborators into a
//! ready [`SessionRegistry`].

use std::sync::Arc;

use wordforge_game::{GameConfig, SessionRegistry};
use wordforge_oracle::DistanceOracle;
use wordforge_persist::PersistConfig;
use wordforge_store::Store;

use crate::{WordforgeConfig, WordforgeError};

/// Builder for a [`SessionRegistry`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use wordforge::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), WordforgeError> {
/// let oracle = StaticOracle::new().with_word(RoundId(1830), "lar", None, 0);
/// let registry = WordforgeBuilder::new()
///     .machine_id(3)
///     .build(oracle, Arc::new(MemoryStore::new()))?;
///
/// let session = registry.create_session(PlayerId(1), GameMode::Cooperative, RoundId(1830))?;
/// let outcome = session.submit_guess(PlayerId(1), "lar").await?;
/// assert!(outcome.solved);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct WordforgeBuilder {
    config: WordforgeConfig,
}

impl WordforgeBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a loaded config document.
    pub fn from_config(config: WordforgeConfig) -> Self {
        Self { config }
    }

    /// Sets the game rules.
    pub fn game(mut self, game: GameConfig) -> Self {
        self.config.game = game;
        self
    }

    /// Sets the persistence policy.
    pub fn persistence(mut self, persistence: PersistConfig) -> Self {
        self.config.persistence = persistence;
        self
    }

    /// Sets the snowflake machine id; must be unique per running process.
    pub fn machine_id(mut self, machine_id: u16) -> Self {
        self.config.game.machine_id = machine_id;
        self
    }

    pub fn config(&self) -> &WordforgeConfig {
        &self.config
    }

    /// Builds a registry over `store`.
    ///
    /// # Errors
    /// [`WordforgeError::Game`] if the machine id is out of range.
    pub fn build<O: DistanceOracle, S: Store>(
        self,
        oracle: O,
        store: Arc<S>,
    ) -> Result<SessionRegistry<O, S>, WordforgeError> {
        let WordforgeConfig { game, persistence } = self.config.validated();
        tracing::info!(
            default_mode = %game.default_mode,
            inactivity_delay_ms = u64::try_from(persistence.inactivity_delay.as_millis()).unwrap_or(u64::MAX),
            force_save_every = persistence.force_save_every,
            "building wordforge registry"
        );
        Ok(SessionRegistry::new(oracle, store, game, persistence)?)
    }

    /// Builds a registry over a SQLite database file, creating it if needed.
    ///
    /// # Errors
    /// [`WordforgeError::Store`] if the database can't be opened, plus
    /// everything [`build`](Self::build) returns.
    #[cfg(feature = "sqlite")]
    pub fn build_sqlite<O: DistanceOracle>(
        self,
        oracle: O,
        path: impl AsRef<std::path::Path>,
    ) -> Result<SessionRegistry<O, wordforge_store::SqliteStore>, WordforgeError> {
        let store = wordforge_store::SqliteStore::open(path)?;
        self.build(oracle, Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use wordforge_game::GameError;
    use wordforge_oracle::StaticOracle;
    use wordforge_protocol::GameMode;
    use wordforge_store::MemoryStore;

    use super::*;

    #[test]
    fn test_build_rejects_machine_id_out_of_range() {
        let result = WordforgeBuilder::new()
            .machine_id(4096)
            .build(StaticOracle::new(), Arc::new(MemoryStore::new()));

        assert!(matches!(result, Err(WordforgeError::Game(GameError::Id(_)))));
    }

    #[test]
    fn test_builder_setters_update_config() {
        let builder = WordforgeBuilder::new()
            .game(GameConfig {
                default_mode: GameMode::RaceToAnswer,
                ..GameConfig::default()
            })
            .persistence(PersistConfig {
                max_retries: 0,
                ..PersistConfig::default()
            });

        assert_eq!(builder.config().game.default_mode, GameMode::RaceToAnswer);
        assert_eq!(builder.config().persistence.max_retries, 0);
    }

    #[test]
    fn test_build_applies_validation() {
        let mut game = GameConfig::default();
        game.tips.max_attempts = 0;

        let registry = WordforgeBuilder::new()
            .game(game)
            .build(StaticOracle::new(), Arc::new(MemoryStore::new()))
            .unwrap();

        assert_eq!(registry.config().tips.max_attempts, 1);
    }
}
