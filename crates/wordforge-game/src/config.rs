//! Game configuration and the round calendar.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use wordforge_protocol::{GameMode, RoundId};

use crate::GameError;

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Settings shared by every session a registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Per-mode player caps.
    pub limits: PlayerLimits,
    pub tips: TipConfig,
    pub calendar: RoundCalendar,
    /// Whether new sessions offer tips.
    pub allow_tips: bool,
    /// Whether new sessions let players give up.
    pub allow_give_up: bool,
    /// Mode used when a player plays a word without a session.
    pub default_mode: GameMode,
    /// Snowflake machine id (0–1023) for session ids.
    pub machine_id: u16,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            limits: PlayerLimits::default(),
            tips: TipConfig::default(),
            calendar: RoundCalendar::default(),
            allow_tips: true,
            allow_give_up: true,
            default_mode: GameMode::Cooperative,
            machine_id: 0,
        }
    }
}

impl GameConfig {
    /// Fix any out-of-range values so the config is safe to use.
    ///
    /// Rules:
    /// - player caps below 1 become 1
    /// - `tips.max_attempts` of 0 becomes 1
    pub fn validated(mut self) -> Self {
        for (mode, cap) in [
            (GameMode::Cooperative, &mut self.limits.cooperative),
            (GameMode::Competitive, &mut self.limits.competitive),
            (GameMode::RaceToAnswer, &mut self.limits.race),
            (GameMode::ExclusiveWordRace, &mut self.limits.exclusive),
        ] {
            if *cap == 0 {
                warn!(%mode, "player cap is 0, using 1");
                *cap = 1;
            }
        }
        if self.tips.max_attempts == 0 {
            warn!("tips.max_attempts is 0, using 1");
            self.tips.max_attempts = 1;
        }
        self
    }
}

/// Maximum players per session, by mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerLimits {
    pub cooperative: usize,
    pub competitive: usize,
    pub race: usize,
    pub exclusive: usize,
}

impl Default for PlayerLimits {
    fn default() -> Self {
        Self {
            cooperative: 20,
            competitive: 50,
            race: 20,
            exclusive: 20,
        }
    }
}

impl PlayerLimits {
    pub fn for_mode(&self, mode: GameMode) -> usize {
        match mode {
            GameMode::Cooperative => self.cooperative,
            GameMode::Competitive => self.competitive,
            GameMode::RaceToAnswer => self.race,
            GameMode::ExclusiveWordRace => self.exclusive,
        }
    }
}

/// How tips pick their target distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TipConfig {
    /// Distance of the first tip, before any word was scored.
    pub initial_distance: u32,
    /// How many distances an exclusive-word tip tries before giving up.
    pub max_attempts: u32,
}

impl Default for TipConfig {
    fn default() -> Self {
        Self {
            initial_distance: 300,
            max_attempts: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

/// Maps calendar days to round numbers.
///
/// `epoch` plays round `epoch_round`; every following day is the next round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundCalendar {
    pub epoch: NaiveDate,
    pub epoch_round: u32,
}

impl Default for RoundCalendar {
    fn default() -> Self {
        Self {
            epoch: NaiveDate::from_ymd_opt(2022, 2, 23).unwrap_or_default(),
            epoch_round: 0,
        }
    }
}

impl RoundCalendar {
    /// Round played on `date`.
    ///
    /// # Errors
    /// [`GameError::InvalidRound`] for dates before the epoch.
    pub fn round_for(&self, date: NaiveDate) -> Result<RoundId, GameError> {
        let days = (date - self.epoch).num_days();
        u32::try_from(days)
            .ok()
            .and_then(|days| self.epoch_round.checked_add(days))
            .map(RoundId)
            .ok_or_else(|| GameError::InvalidRound(format!("{date} is before {}", self.epoch)))
    }

    /// Today's round, by UTC date.
    pub fn today(&self) -> Result<RoundId, GameError> {
        self.round_for(Utc::now().date_naive())
    }

    pub fn resolve(&self, selector: RoundSelector) -> Result<RoundId, GameError> {
        match selector {
            RoundSelector::Today => self.today(),
            RoundSelector::Round(round) => Ok(round),
            RoundSelector::Date(date) => self.round_for(date),
        }
    }
}

/// Which round a new session plays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoundSelector {
    #[default]
    Today,
    Round(RoundId),
    Date(NaiveDate),
}

impl From<RoundId> for RoundSelector {
    fn from(round: RoundId) -> Self {
        Self::Round(round)
    }
}

impl From<NaiveDate> for RoundSelector {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<Option<RoundId>> for RoundSelector {
    fn from(round: Option<RoundId>) -> Self {
        round.map_or(Self::Today, Self::Round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_round_for_counts_days_from_epoch() {
        let calendar = RoundCalendar::default();
        assert_eq!(calendar.round_for(date(2022, 2, 23)).unwrap(), RoundId(0));
        assert_eq!(calendar.round_for(date(2022, 3, 1)).unwrap(), RoundId(6));
        assert_eq!(calendar.round_for(date(2027, 3, 1)).unwrap(), RoundId(1832));
    }

    #[test]
    fn test_round_for_before_epoch_is_invalid() {
        let calendar = RoundCalendar::default();
        let result = calendar.round_for(date(2022, 2, 22));
        assert!(matches!(result, Err(GameError::InvalidRound(_))));
    }

    #[test]
    fn test_round_for_respects_epoch_round() {
        let calendar = RoundCalendar {
            epoch: date(2024, 1, 1),
            epoch_round: 700,
        };
        assert_eq!(calendar.round_for(date(2024, 1, 11)).unwrap(), RoundId(710));
    }

    #[test]
    fn test_resolve_explicit_round_passes_through() {
        let calendar = RoundCalendar::default();
        let round = calendar.resolve(RoundId(1830).into()).unwrap();
        assert_eq!(round, RoundId(1830));
    }

    #[test]
    fn test_round_selector_from_none_is_today() {
        assert_eq!(RoundSelector::from(None), RoundSelector::Today);
    }

    #[test]
    fn test_player_limits_default_per_mode() {
        let limits = PlayerLimits::default();
        assert_eq!(limits.for_mode(GameMode::Cooperative), 20);
        assert_eq!(limits.for_mode(GameMode::Competitive), 50);
        assert_eq!(limits.for_mode(GameMode::ExclusiveWordRace), 20);
    }

    #[test]
    fn test_validated_fixes_zero_caps() {
        let mut config = GameConfig::default();
        config.limits.race = 0;
        config.tips.max_attempts = 0;

        let config = config.validated();

        assert_eq!(config.limits.race, 1);
        assert_eq!(config.tips.max_attempts, 1);
    }

    #[test]
    fn test_game_config_from_partial_json_uses_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "allow_tips": false, "limits": { "race": 4 } }"#).unwrap();
        assert!(!config.allow_tips);
        assert_eq!(config.limits.race, 4);
        assert_eq!(config.limits.competitive, 50);
        assert_eq!(config.calendar.epoch, date(2022, 2, 23));
    }
}
