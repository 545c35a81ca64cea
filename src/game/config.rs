//! Match Configuration
//!
//! Tunables for the arena and the objective mode. Every field has a
//! default, so a JSON file only needs the keys it changes.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::DEFAULT_SCORE_TO_WIN;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON could not be parsed.
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending key
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Configuration for a capture-the-flag match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtfConfig {
    /// Captures needed to win
    pub score_to_win: u32,
    /// Ticks from placement to detonation
    pub bomb_fuse_ticks: u32,
    /// Starting blast reach in tiles
    pub blast_range: u32,
    /// Starting simultaneous bombs per player
    pub bomb_capacity: u32,
    /// Cap for the extra-bomb power-up
    pub max_bomb_capacity: u32,
    /// Cap for the blast-range power-up
    pub max_blast_range: u32,
    /// Ticks from the destroying tick until the flag reappears at its base
    /// (`None` = never)
    pub flag_respawn_ticks: Option<u32>,
}

impl Default for CtfConfig {
    fn default() -> Self {
        Self {
            score_to_win: DEFAULT_SCORE_TO_WIN,
            bomb_fuse_ticks: 120, // 2 seconds at 60 Hz
            blast_range: 2,
            bomb_capacity: 1,
            max_bomb_capacity: 6,
            max_blast_range: 8,
            flag_respawn_ticks: Some(300), // 5 seconds at 60 Hz
        }
    }
}

impl CtfConfig {
    /// Parse from JSON and validate.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: CtfConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.score_to_win == 0 {
            return Err(ConfigError::Invalid {
                field: "score_to_win",
                reason: "must be at least 1",
            });
        }
        if self.bomb_fuse_ticks == 0 {
            return Err(ConfigError::Invalid {
                field: "bomb_fuse_ticks",
                reason: "must be at least 1",
            });
        }
        if self.bomb_capacity > self.max_bomb_capacity {
            return Err(ConfigError::Invalid {
                field: "bomb_capacity",
                reason: "exceeds max_bomb_capacity",
            });
        }
        if self.blast_range > self.max_blast_range {
            return Err(ConfigError::Invalid {
                field: "blast_range",
                reason: "exceeds max_blast_range",
            });
        }
        Ok(())
    }
}
