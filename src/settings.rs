//! Game configuration
//!
//! Loaded from JSON (CLI `--config`) or built in code. Missing fields fall
//! back to the classic 5x5 game.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::{Direction, GameError};

/// When a chain pop's bonus move is credited relative to its drop spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefundTiming {
    #[default]
    BeforeSpawn,
    AfterSpawn,
}

/// Where a bouncing drop probes from next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BounceAnchor {
    /// Stay at the pop origin and grow the stride
    #[default]
    Origin,
    /// Move onto the empty cell and keep a unit stride
    Advance,
}

impl BounceAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            BounceAnchor::Origin => "origin",
            BounceAnchor::Advance => "advance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "origin" | "anchor" => Some(BounceAnchor::Origin),
            "advance" | "step" => Some(BounceAnchor::Advance),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] GameError),
}

/// Parameters of one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Grid ===
    pub height: usize,
    pub width: usize,
    /// Lowest random fill value
    pub min_value: u32,
    /// Highest random fill value; anything above pops
    pub max_value: u32,

    // === Budget ===
    pub initial_moves: u32,

    // === Pacing ===
    pub bounce_delay_ms: u64,
    pub pop_settle_delay_ms: u64,

    // === Propagation ===
    /// Drops spawned per pop, in spawn order
    pub directions: Vec<Direction>,
    pub refund_timing: RefundTiming,
    pub bounce_anchor: BounceAnchor,

    /// Board fill seed (random when absent)
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            height: DEFAULT_HEIGHT,
            width: DEFAULT_WIDTH,
            min_value: DEFAULT_MIN_VALUE,
            max_value: DEFAULT_MAX_VALUE,

            initial_moves: DEFAULT_INITIAL_MOVES,

            bounce_delay_ms: DEFAULT_BOUNCE_DELAY_MS,
            pop_settle_delay_ms: DEFAULT_POP_SETTLE_DELAY_MS,

            directions: Direction::CARDINAL.to_vec(),
            refund_timing: RefundTiming::default(),
            bounce_anchor: BounceAnchor::default(),

            seed: None,
        }
    }
}

impl GameConfig {
    /// Default config with a different grid size
    pub fn with_size(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            ..Self::default()
        }
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |msg: String| Err(GameError::InvalidConfiguration(msg));

        if self.height == 0 || self.width == 0 {
            return invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.height, self.width
            ));
        }
        if self.max_value == u32::MAX {
            return invalid("max_value leaves no room to pop".into());
        }
        if self.min_value > self.max_value {
            return invalid(format!(
                "min_value {} exceeds max_value {}",
                self.min_value, self.max_value
            ));
        }
        if self.directions.is_empty() {
            return invalid("at least one drop direction is required".into());
        }
        if self.initial_moves == 0 {
            return invalid("initial_moves must be at least 1".into());
        }
        if let Some(dir) = self.directions.iter().find(|d| d.is_zero()) {
            return invalid(format!("drop direction {dir} has no offset"));
        }
        if let Some(dir) = self.directions.iter().find(|d| !d.is_unit()) {
            return invalid(format!("drop direction {dir} is not a unit offset"));
        }
        if u64::from(self.max_value) + 1 < self.directions.len() as u64 {
            // Each pop can hand out more than it removes; cascades may not end
            log::warn!(
                "max_value {} with {} directions allows unbounded cascades",
                self.max_value,
                self.directions.len()
            );
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_game() {
        let config = GameConfig::default();
        assert_eq!((config.height, config.width), (5, 5));
        assert_eq!((config.min_value, config.max_value), (0, 4));
        assert_eq!(config.initial_moves, 1000);
        assert_eq!(config.bounce_delay_ms, 170);
        assert_eq!(config.pop_settle_delay_ms, 500);
        assert_eq!(config.directions, Direction::CARDINAL.to_vec());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json(r#"{ "width": 8, "seed": 3 }"#).unwrap();
        assert_eq!(config.width, 8);
        assert_eq!(config.height, 5);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.bounce_anchor, BounceAnchor::Origin);
    }

    #[test]
    fn test_variant_flags_parse() {
        let config = GameConfig::from_json(
            r#"{ "refund_timing": "after_spawn", "bounce_anchor": "advance" }"#,
        )
        .unwrap();
        assert_eq!(config.refund_timing, RefundTiming::AfterSpawn);
        assert_eq!(config.bounce_anchor, BounceAnchor::Advance);
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let config = GameConfig::with_size(0, 5);
        assert!(matches!(
            config.validate(),
            Err(GameError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let config = GameConfig {
            min_value: 5,
            max_value: 4,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_directions() {
        let config = GameConfig {
            directions: vec![],
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GameConfig {
            directions: vec![Direction::LEFT, Direction::new(0, 0)],
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_unit_direction() {
        let config = GameConfig {
            directions: vec![Direction::RIGHT, Direction::new(0, 2)],
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GameError::InvalidConfiguration(_))
        ));

        let config = GameConfig {
            directions: Direction::DIAGONAL.to_vec(),
            ..GameConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_max_value_without_headroom() {
        let config = GameConfig {
            max_value: u32::MAX,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GameConfig {
            max_value: u32::MAX - 1,
            ..GameConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_budget() {
        let result = GameConfig::from_json(r#"{ "initial_moves": 0 }"#);
        assert!(matches!(
            result,
            Err(SettingsError::Invalid(GameError::InvalidConfiguration(_)))
        ));
    }

    #[test]
    fn test_negative_delay_rejected_at_parse() {
        let result = GameConfig::from_json(r#"{ "bounce_delay_ms": -1 }"#);
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_invalid_json_config_surfaces_game_error() {
        let result = GameConfig::from_json(r#"{ "height": 0 }"#);
        assert!(matches!(
            result,
            Err(SettingsError::Invalid(GameError::InvalidConfiguration(_)))
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_directions() {
        let config = GameConfig {
            directions: vec![Direction::TOP_LEFT, Direction::BOTTOM_RIGHT],
            ..GameConfig::default()
        };
        let back = GameConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_anchor_names() {
        assert_eq!(BounceAnchor::from_str("ADVANCE"), Some(BounceAnchor::Advance));
        assert_eq!(BounceAnchor::Origin.as_str(), "origin");
        assert_eq!(BounceAnchor::from_str("sideways"), None);
    }
}
