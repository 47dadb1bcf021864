//! One config document for the whole engine.

use serde::{Deserialize, Serialize};
use wordforge_game::GameConfig;
use wordforge_persist::PersistConfig;
use wordforge_protocol::{Codec, JsonCodec};

use crate::WordforgeError;

/// Game rules and persistence settings, loadable from one JSON document.
///
/// Every field is optional in the document; missing ones keep their
/// defaults.
///
/// ```rust
/// use wordforge::WordforgeConfig;
///
/// let config = WordforgeConfig::from_json(r#"{
///     "game": { "allow_give_up": false, "limits": { "race": 8 } },
///     "persistence": { "inactivity_delay": 2000 }
/// }"#).unwrap();
///
/// assert!(!config.game.allow_give_up);
/// assert_eq!(config.game.limits.race, 8);
/// assert_eq!(config.persistence.inactivity_delay.as_secs(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordforgeConfig {
    pub game: GameConfig,
    pub persistence: PersistConfig,
}

impl WordforgeConfig {
    /// Parses a JSON document.
    ///
    /// # Errors
    /// [`WordforgeError::Protocol`] if the document is malformed or a
    /// field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self, WordforgeError> {
        Ok(JsonCodec.decode(json.as_bytes())?)
    }

    /// Serializes the config, e.g. to print the effective settings.
    pub fn to_json(&self) -> Result<String, WordforgeError> {
        let bytes = JsonCodec.encode(self)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Clamps out-of-range values in both sections.
    pub fn validated(self) -> Self {
        Self {
            game: self.game.validated(),
            persistence: self.persistence.validated(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wordforge_protocol::GameMode;

    use super::*;

    #[test]
    fn test_from_json_empty_document_uses_defaults() {
        let config = WordforgeConfig::from_json("{}").unwrap();

        assert_eq!(config, WordforgeConfig::default());
    }

    #[test]
    fn test_from_json_partial_sections() {
        let config = WordforgeConfig::from_json(
            r#"{
                "game": { "default_mode": "competitive", "tips": { "initial_distance": 500 } },
                "persistence": { "force_save_every": 3 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.game.default_mode, GameMode::Competitive);
        assert_eq!(config.game.tips.initial_distance, 500);
        assert_eq!(config.game.tips.max_attempts, 10);
        assert_eq!(config.persistence.force_save_every, 3);
        assert_eq!(config.persistence.inactivity_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_from_json_malformed_is_protocol_error() {
        let result = WordforgeConfig::from_json(r#"{ "game": { "allow_tips": "yes" } }"#);

        assert!(matches!(result, Err(WordforgeError::Protocol(_))));
    }

    #[test]
    fn test_to_json_round_trips_non_defaults() {
        let mut config = WordforgeConfig::default();
        config.game.machine_id = 7;
        config.persistence.max_retries = 1;

        let parsed = WordforgeConfig::from_json(&config.to_json().unwrap()).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validated_clamps_both_sections() {
        let mut config = WordforgeConfig::default();
        config.game.limits.cooperative = 0;
        config.persistence.force_save_every = 0;

        let config = config.validated();

        assert_eq!(config.game.limits.cooperative, 1);
        assert_eq!(config.persistence.force_save_every, 1);
    }
}
