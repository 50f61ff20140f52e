//! Simulation configuration with documented constants
//!
//! All tunable numbers are collected here with a note on what they drive.
//! Values can be overridden from a TOML file; anything left out of the file
//! keeps its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::planet::generation::GenerationConfig;

/// Highest module level any configuration may allow
pub const MODULE_LEVEL_CAP: u8 = 5;

/// Configuration for the economy simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === TIME ===
    /// Length of one tick in scaled game seconds.
    ///
    /// Units receive exactly this delta per tick, so every production and
    /// consumption rate in the game is effectively "per tick".
    pub tick_duration: f64,

    /// Number of ticks that make up one in-game day.
    ///
    /// Drives the once-per-day sect collection and the size of each unit's
    /// operating reserve.
    pub ticks_per_day: u64,

    // === COLLECTION ===
    /// Safety margin applied to a unit's projected daily consumption.
    ///
    /// At 1.5 a unit keeps one and a half days of inputs when the sect
    /// collects its surplus.
    pub reserve_multiplier: f32,

    // === EXTRACTION ===
    /// Abundance below which a cell is treated as exhausted for a resource.
    pub extraction_floor: f32,

    // === MODULES ===
    /// Fraction of efficiency a module keeps when it is switched off.
    ///
    /// 0.9 models a one-time 10% switchover cost.
    pub switch_penalty: f32,

    /// Per-level growth of the level multiplier (`1 + step * (level - 1)`).
    pub level_step: f32,

    /// Highest level a module can reach.
    pub max_module_level: u8,

    /// Number of non-zero production steps offered to the player.
    ///
    /// With 4, a rate can be set to 0, 1/4, 2/4, 3/4 or 4/4 of its ceiling.
    pub rate_steps: u8,

    // === PLANET ===
    /// Resource field layout and cluster generation
    pub generation: GenerationConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_duration: 1.0,
            ticks_per_day: 60,
            reserve_multiplier: 1.5,
            extraction_floor: 0.1,
            switch_penalty: 0.9,
            level_step: 0.2,
            max_module_level: 5,
            rate_steps: 4,
            generation: GenerationConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Level multiplier applied to production ceilings and extraction
    pub fn level_multiplier(&self, level: u8) -> f32 {
        1.0 + self.level_step * (level.max(1) - 1) as f32
    }

    /// Length of a full day in scaled game seconds
    pub fn day_length(&self) -> f64 {
        self.ticks_per_day as f64 * self.tick_duration
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_duration > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "tick_duration must be positive, got {}",
                self.tick_duration
            )));
        }

        if self.ticks_per_day == 0 {
            return Err(ConfigError::Invalid("ticks_per_day must be at least 1".into()));
        }

        if self.reserve_multiplier < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "reserve_multiplier must not be negative, got {}",
                self.reserve_multiplier
            )));
        }

        if !(self.switch_penalty > 0.0 && self.switch_penalty <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "switch_penalty must be in (0, 1], got {}",
                self.switch_penalty
            )));
        }

        if !(1..=MODULE_LEVEL_CAP).contains(&self.max_module_level) {
            return Err(ConfigError::Invalid(format!(
                "max_module_level must be in 1..={}, got {}",
                MODULE_LEVEL_CAP, self.max_module_level
            )));
        }

        if self.rate_steps == 0 {
            return Err(ConfigError::Invalid("rate_steps must be at least 1".into()));
        }

        self.generation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_level_multiplier() {
        let config = SimulationConfig::default();
        assert!((config.level_multiplier(1) - 1.0).abs() < 1e-6);
        assert!((config.level_multiplier(3) - 1.4).abs() < 1e-6);
        assert!((config.level_multiplier(5) - 1.8).abs() < 1e-6);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            ticks_per_day = 20
            reserve_multiplier = 2.0
            "#,
        )
        .unwrap();

        assert_eq!(config.ticks_per_day, 20);
        assert!((config.reserve_multiplier - 2.0).abs() < 1e-6);
        assert!((config.tick_duration - 1.0).abs() < 1e-9);
        assert_eq!(config.generation.grid_size, 20);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SimulationConfig::from_toml_str("ticks_per_day = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SimulationConfig::from_toml_str("switch_penalty = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SimulationConfig::from_toml_str("tick_duration = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SimulationConfig::from_toml_str("max_module_level = 6").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = SimulationConfig::from_toml_str("max_module_level = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(SimulationConfig::from_toml_str("max_module_level = 5").is_ok());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = SimulationConfig::from_toml_str("ticks_per_day = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
